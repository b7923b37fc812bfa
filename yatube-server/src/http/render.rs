//! HTML rendering with Tera
//!
//! Templates are compiled into the binary. Every rendered response carries a
//! [`RenderedTemplate`] extension naming the template and holding the context
//! it saw, which is what the router tests assert against.

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::{Context, Tera};

use super::error::AppError;
use crate::cache::CachedPage;
use crate::db::User;

macro_rules! embedded {
    ($($name:literal),* $(,)?) => {
        [$(($name, include_str!(concat!("../../templates/", $name)))),*]
    };
}

/// Every template the site renders, keyed by name
const TEMPLATES: &[(&str, &str)] = &embedded![
    "base.html",
    "includes/header.html",
    "includes/post_card.html",
    "includes/paginator.html",
    "includes/form.html",
    "includes/comments.html",
    "index.html",
    "group.html",
    "profile.html",
    "post.html",
    "new_post.html",
    "follow.html",
    "author.html",
    "tech.html",
    "misc/404.html",
    "misc/500.html",
    "users/signup.html",
    "registration/login.html",
    "registration/logged_out.html",
    "registration/password_change_form.html",
    "registration/password_change_done.html",
];

/// Compiled template set
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        tera.autoescape_on(vec![".html"]);
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }
}

/// Template name and context attached to every rendered response
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub name: &'static str,
    pub context: serde_json::Value,
}

/// A template plus the context to render it with
pub struct View {
    template: &'static str,
    context: Context,
    status: StatusCode,
}

impl View {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: Context::new(),
            status: StatusCode::OK,
        }
    }

    pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Render into a cacheable page. `viewer` becomes the `user` variable.
    pub fn render_page(self, templates: &Templates, viewer: Option<&User>) -> Result<CachedPage, AppError> {
        let mut context = self.context;
        context.insert("user", &viewer);

        let body = templates.render(self.template, &context)?;
        Ok(CachedPage {
            body,
            template: self.template,
            context: context.into_json(),
        })
    }

    pub fn render(self, templates: &Templates, viewer: Option<&User>) -> Result<Response, AppError> {
        let status = self.status;
        let page = self.render_page(templates, viewer)?;
        Ok(page_response(status, page))
    }
}

/// Turn a rendered (possibly cached) page into a response.
pub fn page_response(status: StatusCode, page: CachedPage) -> Response {
    let mut response = (status, Html(page.body)).into_response();
    response.extensions_mut().insert(RenderedTemplate {
        name: page.template,
        context: page.context,
    });
    response
}

/// 302 redirect to a local path.
pub fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            tracing::warn!(location, "refusing redirect to invalid location");
            response.headers_mut().insert(LOCATION, HeaderValue::from_static("/"));
        }
    }
    response
}

/// URL of a post page.
pub fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", urlencoding::encode(username), post_id)
}

/// URL of a profile page.
pub fn profile_url(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}
