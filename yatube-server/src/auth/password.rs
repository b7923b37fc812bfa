//! Password hashing
//!
//! Stored format: `sha256$<iterations>$<salt>$<hex digest>`. The iteration
//! count travels with the hash so it can be raised without invalidating
//! existing accounts.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "sha256";

/// Iteration count for new hashes
pub const DEFAULT_ITERATIONS: u32 = 10_000;

const SALT_LEN: usize = 22;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    hash_with(password, &salt, DEFAULT_ITERATIONS)
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let computed = digest_hex(password, salt, iterations);
    constant_time_eq(computed.as_bytes(), expected.as_bytes())
}

fn hash_with(password: &str, salt: &str, iterations: u32) -> String {
    format!(
        "{ALGORITHM}${iterations}${salt}${}",
        digest_hex(password, salt, iterations)
    )
}

fn digest_hex(password: &str, salt: &str, iterations: u32) -> String {
    let mut acc = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    for _ in 1..iterations {
        acc = Sha256::new()
            .chain_update(acc)
            .chain_update(password.as_bytes())
            .finalize();
    }

    to_hex(&acc)
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
