//! Uploaded image storage
//!
//! Images are recognised by their magic bytes, not by the client-supplied
//! name or content type, and stored under generated names so uploads can
//! never collide or escape the media root.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

/// Image formats accepted for post illustrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    /// Identify an image from its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Relative storage path for a new post image, e.g. `posts/<uuid>.gif`.
pub fn new_post_image_path(kind: ImageKind) -> String {
    format!("posts/{}.{}", Uuid::new_v4(), kind.extension())
}

/// Where uploaded files live
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Write `bytes` at `relative`, creating parent directories.
    async fn save(&self, relative: &str, bytes: &[u8]) -> io::Result<()>;

    /// Remove the file at `relative`. Missing files are not an error.
    async fn delete(&self, relative: &str) -> io::Result<()>;

    /// Directory served under `/media/`.
    fn root(&self) -> &Path;
}

/// Media store on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !safe || relative.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing media path '{relative}'"),
            ));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(())
    }

    async fn delete(&self, relative: &str) -> io::Result<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
