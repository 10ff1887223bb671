//! Rendition preparation pipeline.
//!
//! [`get_or_fetch`] is the request-path entry point: serve the cached
//! rendition when one exists, otherwise run the full pipeline (resolve the
//! newest upload, download it, transcode, publish into the cache). Concurrent
//! requests for the same channel coalesce onto a single pipeline run through
//! the store's claim protocol; late arrivals wait for the winner to settle.

use std::path::{Path, PathBuf};

use tracing::info;

use tubecast_av::{fetch, transcode, Workspace};
use tubecast_core::{ChannelName, Error, Result};

use crate::context::AppContext;
use crate::store::{Claim, Phase, ResolvedVideo};

/// Return the path of the cached rendition for `name`, preparing it first if
/// necessary.
pub async fn get_or_fetch(ctx: &AppContext, name: &ChannelName) -> Result<PathBuf> {
    if !ctx.store.contains(name) {
        return Err(Error::not_found("channel", name));
    }

    let dest = ctx.store.cached_path(name);
    if dest.exists() {
        return Ok(dest);
    }

    loop {
        match ctx.store.begin(name)? {
            Claim::Started => {
                return match run_pipeline(ctx, name, &dest).await {
                    Ok(()) => {
                        ctx.store.finish_ready(name)?;
                        Ok(dest)
                    }
                    Err(err) => {
                        ctx.store.finish_failed(name, err.to_string())?;
                        Err(err)
                    }
                };
            }
            Claim::InFlight => {
                let phase = ctx
                    .store
                    .wait_settled(name, ctx.config.refresh.ready_wait())
                    .await?;
                // Whatever the run reported, a file on disk wins.
                if dest.exists() {
                    return Ok(dest);
                }
                match phase {
                    Phase::Failed(message) => {
                        return Err(Error::fetch(format!(
                            "preparation of {name} failed: {message}"
                        )));
                    }
                    Phase::Working => {
                        return Err(Error::fetch(format!(
                            "timed out waiting for {name} to become ready"
                        )));
                    }
                    // Settled without a file: the rendition was swept or the
                    // run raced a cleanup. Take our own claim.
                    _ => continue,
                }
            }
        }
    }
}

/// Rebuild the rendition for `name` unconditionally.
///
/// Returns `false` without doing anything when another task already holds the
/// claim; the refresher treats that channel as busy and retries next cycle.
pub async fn rebuild(ctx: &AppContext, name: &ChannelName) -> Result<bool> {
    let dest = ctx.store.cached_path(name);
    match ctx.store.begin(name)? {
        Claim::InFlight => Ok(false),
        Claim::Started => match run_pipeline(ctx, name, &dest).await {
            Ok(()) => {
                ctx.store.finish_ready(name)?;
                Ok(true)
            }
            Err(err) => {
                ctx.store.finish_failed(name, err.to_string())?;
                Err(err)
            }
        },
    }
}

/// Resolve, download, transcode and publish one rendition.
///
/// The caller owns the store claim and settles it from the returned result.
async fn run_pipeline(ctx: &AppContext, name: &ChannelName, dest: &Path) -> Result<()> {
    let tools = &ctx.config.tools;
    let cookies = tools.cookies_file.as_deref();

    let video = match ctx.store.video(name) {
        Some(video) => video,
        None => {
            let url = ctx
                .store
                .source_url(name)
                .ok_or_else(|| Error::not_found("channel", name))?;
            let latest =
                fetch::latest_video(&ctx.tools, &url, cookies, tools.resolve_timeout()).await?;
            let video = ResolvedVideo::from(latest);
            ctx.store.record_video(name, video.clone())?;
            video
        }
    };

    info!(
        channel = %name,
        video_id = %video.id,
        "Preparing rendition"
    );

    let workspace = Workspace::new()?;
    fetch::download(
        &ctx.tools,
        &video.url,
        &workspace.source(),
        cookies,
        tools.download_timeout(),
    )
    .await?;
    transcode::transcode(
        &ctx.tools,
        &workspace.source(),
        &workspace.rendition(),
        &ctx.config.transcode,
        tools.transcode_timeout(),
    )
    .await?;
    let published = workspace.publish(dest)?;

    info!(
        channel = %name,
        path = %published.display(),
        "Rendition published"
    );
    Ok(())
}
