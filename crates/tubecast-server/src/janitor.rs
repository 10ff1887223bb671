//! Cache janitor.
//!
//! Periodically deletes renditions that have outlived the cache expiry age.
//! An expired channel simply loses its file; the next request or refresh
//! cycle rebuilds it from the channel's newest upload.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tubecast_core::Result;

use crate::context::AppContext;
use crate::store::{file_age, ChannelStore};

/// Run the cleanup loop until `cancel` fires.
pub async fn run(ctx: AppContext, cancel: CancellationToken) {
    info!("Cache janitor started");

    loop {
        match sweep(&ctx.store, ctx.config.cache.expire_age()) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Expired renditions deleted"),
            Err(err) => warn!(error = %err, "Cache sweep failed"),
        }

        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(ctx.config.cache.cleanup_interval()) => {}
            _ = cancel.cancelled() => break,
        }
    }

    info!("Cache janitor stopped");
}

/// Delete every rendition older than `expire_age`; returns how many went.
///
/// Per-file deletion failures are logged and skipped so one stubborn file
/// never blocks the rest of the sweep.
pub fn sweep(store: &ChannelStore, expire_age: Duration) -> Result<usize> {
    let mut removed = 0;

    for entry in store.cache_entries()? {
        let Some(age) = file_age(&entry.path) else {
            continue;
        };
        if age <= expire_age {
            continue;
        }
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                info!(file = %entry.path.display(), age_secs = age.as_secs(), "Deleted old file");
                removed += 1;
            }
            Err(err) => {
                warn!(file = %entry.path.display(), error = %err, "Could not delete file");
            }
        }
    }

    Ok(removed)
}
