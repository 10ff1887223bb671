//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] over a tempdir
//! cache with two configured channels pointing at unreachable URLs, so no
//! test ever talks to a real upstream. The [`with_server`] constructor starts
//! Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::path::PathBuf;

use tempfile::TempDir;

use tubecast_core::{ChannelConfig, Config};
use tubecast_server::context::AppContext;
use tubecast_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary cache directory.
pub struct TestHarness {
    pub ctx: AppContext,
    /// Held so the cache directory outlives the test.
    _cache: TempDir,
}

impl TestHarness {
    /// Create a new harness: two channels with unreachable upstreams and
    /// tight timeouts so failure paths settle quickly.
    pub fn new() -> Self {
        let cache = tempfile::tempdir().expect("failed to create temp cache dir");
        let config = base_config(cache.path().join("cache"));
        let ctx = AppContext::build(config).expect("failed to build context");
        Self { ctx, _cache: cache }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Drop a fake rendition into the cache for `name`.
    pub fn seed_cache(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self
            .ctx
            .store
            .cached_path(&name.parse().expect("invalid channel name"));
        std::fs::write(&path, bytes).expect("failed to seed cache");
        path
    }
}

/// Two channels, unreachable upstreams. Preparation attempts must fail fast
/// without hitting the network.
pub fn base_config(cache_dir: PathBuf) -> Config {
    let mut config = Config::default();
    config.cache.dir = cache_dir;
    config.channels = vec![
        ChannelConfig {
            name: "alpha".parse().unwrap(),
            url: "http://127.0.0.1:1/alpha".into(),
        },
        ChannelConfig {
            name: "beta".parse().unwrap(),
            url: "http://127.0.0.1:1/beta".into(),
        },
    ];
    config.tools.resolve_timeout_secs = 5;
    config.refresh.ready_wait_secs = 5;
    config
}
