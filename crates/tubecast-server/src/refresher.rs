//! Background channel refresher.
//!
//! Walks all configured channels once per refresh interval and keeps each
//! cached rendition current with the channel's newest upload:
//!
//! - missing rendition: build one
//! - rendition older than the recheck age: re-resolve the newest upload and
//!   rebuild only when the upstream video actually changed
//! - otherwise: leave it alone
//!
//! Channels are visited sequentially with a short random pause between them
//! so the upstream site never sees a burst of listing requests.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tubecast_av::fetch;
use tubecast_core::config::RefreshConfig;
use tubecast_core::{ChannelName, Error, Result};

use crate::context::AppContext;
use crate::prep;
use crate::store::{file_age, ResolvedVideo};

/// What one channel visit decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No rendition on disk; one was built.
    Missing,
    /// Upstream moved to a newer upload; the rendition was rebuilt.
    Outdated,
    /// Rendition was past the recheck age but upstream has not changed.
    Stale,
    /// Rendition is recent enough to skip the upstream check.
    Fresh,
    /// Another task held the channel claim; skipped this cycle.
    Busy,
}

/// Run the refresh loop until `cancel` fires.
pub async fn run(ctx: AppContext, cancel: CancellationToken) {
    info!("Channel refresher started");

    loop {
        refresh_cycle(&ctx, &cancel).await;

        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(ctx.config.refresh.interval()) => {}
            _ = cancel.cancelled() => break,
        }
    }

    info!("Channel refresher stopped");
}

/// One pass over all configured channels.
async fn refresh_cycle(ctx: &AppContext, cancel: &CancellationToken) {
    for name in ctx.store.names() {
        if cancel.is_cancelled() {
            return;
        }

        match refresh_channel(ctx, &name).await {
            Ok(outcome) => {
                debug!(channel = %name, outcome = ?outcome, "Channel visited");
            }
            Err(err) => {
                warn!(channel = %name, error = %err, "Channel refresh failed");
                let _ = ctx.store.record_error(&name, err.to_string());
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(jitter(&ctx.config.refresh)) => {}
            _ = cancel.cancelled() => return,
        }
    }
}

/// Bring one channel up to date.
pub async fn refresh_channel(ctx: &AppContext, name: &ChannelName) -> Result<RefreshOutcome> {
    let dest = ctx.store.cached_path(name);

    if !dest.exists() {
        return Ok(if prep::rebuild(ctx, name).await? {
            RefreshOutcome::Missing
        } else {
            RefreshOutcome::Busy
        });
    }

    let known_id = ctx.store.video(name).map(|video| video.id);
    let recheck_due = file_age(&dest)
        .map_or(true, |age| age >= ctx.config.refresh.recheck_age());
    if !recheck_due && known_id.is_some() {
        return Ok(RefreshOutcome::Fresh);
    }

    let url = ctx
        .store
        .source_url(name)
        .ok_or_else(|| Error::not_found("channel", name))?;
    let latest = fetch::latest_video(
        &ctx.tools,
        &url,
        ctx.config.tools.cookies_file.as_deref(),
        ctx.config.tools.resolve_timeout(),
    )
    .await?;

    // A restart leaves a rendition on disk with no recorded video; trust the
    // file until upstream demonstrably moves past it.
    let outdated = known_id.is_some() && known_id.as_deref() != Some(latest.id.as_str());
    ctx.store.record_video(name, ResolvedVideo::from(latest))?;

    if !outdated {
        return Ok(RefreshOutcome::Stale);
    }

    info!(channel = %name, "Newer upload found, rebuilding rendition");
    Ok(if prep::rebuild(ctx, name).await? {
        RefreshOutcome::Outdated
    } else {
        RefreshOutcome::Busy
    })
}

fn jitter(refresh: &RefreshConfig) -> Duration {
    let low = refresh.jitter_min_secs.min(refresh.jitter_max_secs);
    let high = refresh.jitter_min_secs.max(refresh.jitter_max_secs);
    Duration::from_secs(rand::thread_rng().gen_range(low..=high))
}
