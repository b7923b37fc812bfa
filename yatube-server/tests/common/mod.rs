//! Shared setup for router tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube_server::auth::{hash_password, start_session};
use yatube_server::db::{
    create_memory_pool, migrate, Group, GroupRepo, NewPost, NewUser, Post, PostRepo, User,
    UserRepo,
};
use yatube_server::models::{GroupSlug, GroupTitle, PostText, Username};
use yatube_server::{build_router, AppState, RenderedTemplate, ServerConfig};

pub const PASSWORD: &str = "correct-horse";

/// Smallest valid GIF: 2x1 pixels
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_cache_ttl(0).await
    }

    pub async fn with_cache_ttl(ttl_secs: u64) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("yatube_server=debug")
            .with_test_writer()
            .try_init();

        let media = tempfile::tempdir().expect("media dir");
        let pool = create_memory_pool().await.expect("memory pool");
        migrate(&pool).await.expect("schema");

        let mut config = ServerConfig::for_tests(media.path().to_path_buf());
        config.index_cache_ttl_secs = ttl_secs;

        let state = AppState::new(pool, config).expect("templates");
        Self {
            router: build_router(state.clone()),
            state,
            media,
        }
    }

    pub async fn user(&self, name: &str) -> User {
        UserRepo::new(self.state.pool())
            .create(NewUser {
                username: Username::new(name).unwrap(),
                password_hash: hash_password(PASSWORD),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        GroupRepo::new(self.state.pool())
            .create(
                &GroupSlug::new(slug).unwrap(),
                &GroupTitle::new("Тестовая группа").unwrap(),
                "lalala lalala",
            )
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        PostRepo::new(self.state.pool())
            .create(NewPost {
                author_id: author.id,
                text: PostText::new(text).unwrap(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    /// Session cookie header value for `user`.
    pub async fn login(&self, user: &User) -> String {
        let token = start_session(self.state.pool(), user.id, self.state.config().session_ttl())
            .await
            .unwrap();
        format!("sessionid={token}")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &[(&str, &str)]) -> Response {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response {
        const BOUNDARY: &str = "----yatubeboundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/gif\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::post(uri).header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

/// Name of the template a response was rendered from.
pub fn template(response: &Response) -> &'static str {
    response
        .extensions()
        .get::<RenderedTemplate>()
        .expect("response was not rendered from a template")
        .name
}

/// Context the template saw.
pub fn context(response: &Response) -> &Value {
    &response
        .extensions()
        .get::<RenderedTemplate>()
        .expect("response was not rendered from a template")
        .context
}

pub fn location(response: &Response) -> &str {
    assert_eq!(response.status(), StatusCode::FOUND, "expected a redirect");
    response.headers()[LOCATION].to_str().unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn page_len(response: &Response) -> usize {
    context(response)["page"]["object_list"]
        .as_array()
        .expect("page.object_list")
        .len()
}
