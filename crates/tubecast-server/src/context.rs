//! Application context shared across handlers and background tasks.

use std::sync::Arc;

use tubecast_av::ToolRegistry;
use tubecast_core::config::Config;
use tubecast_core::Result;

use crate::store::ChannelStore;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// External tool registry.
    pub tools: Arc<ToolRegistry>,
    /// Channel state and cache directory bookkeeping.
    pub store: Arc<ChannelStore>,
}

impl AppContext {
    /// Build a context from configuration: discover external tools and
    /// initialize the channel store, creating the cache directory if missing.
    pub fn build(config: Config) -> Result<Self> {
        let tools = Arc::new(ToolRegistry::discover(&config.tools));
        let store = Arc::new(ChannelStore::new(config.cache.dir.clone(), &config.channels)?);

        Ok(Self {
            config: Arc::new(config),
            tools,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let mut config = Config::default();
        config.cache.dir = cache_dir.clone();

        let ctx = AppContext::build(config).unwrap();
        assert!(cache_dir.is_dir());
        assert!(ctx.store.names().is_empty());
    }
}
