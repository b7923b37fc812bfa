//! Application state shared across handlers

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::cache::PageCache;
use crate::config::ServerConfig;
use crate::http::render::Templates;
use crate::media::{LocalMediaStore, MediaStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: SqlitePool,
    templates: Templates,
    index_cache: PageCache,
    media: Arc<dyn MediaStore>,
    config: ServerConfig,
}

impl AppState {
    /// State backed by the local media root named in `config`.
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Result<Self, tera::Error> {
        let media = Arc::new(LocalMediaStore::new(config.media_root.clone()));
        Self::with_media(pool, config, media)
    }

    pub fn with_media(
        pool: SqlitePool,
        config: ServerConfig,
        media: Arc<dyn MediaStore>,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            inner: Arc::new(AppStateInner {
                pool,
                templates: Templates::new()?,
                index_cache: PageCache::new(config.index_cache_ttl()),
                media,
                config,
            }),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    pub fn templates(&self) -> &Templates {
        &self.inner.templates
    }

    pub fn index_cache(&self) -> &PageCache {
        &self.inner.index_cache
    }

    pub fn media(&self) -> &dyn MediaStore {
        self.inner.media.as_ref()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }
}
