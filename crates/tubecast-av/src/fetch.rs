//! Latest-upload resolution and download via yt-dlp.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use tubecast_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Format selector handed to yt-dlp: prefer separate webm streams (merged
/// without re-encoding), fall back to the single best format.
const FORMAT_SELECTOR: &str = "bestvideo[ext=webm]+bestaudio[ext=webm]/best";

/// The newest upload of a channel, as reported by yt-dlp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestVideo {
    /// Upstream video identifier.
    pub id: String,
    /// Canonical watch URL for the video.
    pub url: String,
    /// Video title, when the listing carries one.
    pub title: Option<String>,
}

/// Minimal shape of `yt-dlp --flat-playlist --dump-single-json` output.
#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
}

/// Canonical watch URL for a video id.
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Arguments for resolving the newest entry of a channel listing.
fn resolve_args(channel_url: &str, cookies: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "--flat-playlist".to_string(),
        "--playlist-end".to_string(),
        "1".to_string(),
        "--dump-single-json".to_string(),
    ];
    if let Some(cookies) = cookies {
        args.push("--cookies".to_string());
        args.push(cookies.to_string_lossy().into_owned());
    }
    args.push(channel_url.to_string());
    args
}

/// Arguments for downloading a single video to `dest`.
fn download_args(video_url: &str, dest: &Path, cookies: Option<&Path>) -> Vec<String> {
    let mut args = vec!["-f".to_string(), FORMAT_SELECTOR.to_string()];
    if let Some(cookies) = cookies {
        args.push("--cookies".to_string());
        args.push(cookies.to_string_lossy().into_owned());
    }
    args.push("-o".to_string());
    args.push(dest.to_string_lossy().into_owned());
    args.push(video_url.to_string());
    args
}

fn parse_flat_playlist(json: &str) -> Result<LatestVideo> {
    let playlist: FlatPlaylist = serde_json::from_str(json)
        .map_err(|e| Error::fetch(format!("unparseable playlist JSON: {e}")))?;

    let entry = playlist
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| Error::fetch("channel listing has no entries"))?;

    let id = entry
        .id
        .ok_or_else(|| Error::fetch("newest listing entry has no video id"))?;

    Ok(LatestVideo {
        url: watch_url(&id),
        id,
        title: entry.title,
    })
}

/// Resolve the newest upload of `channel_url`.
///
/// Runs yt-dlp in flat-playlist mode limited to one entry, so only the
/// listing page is fetched, never any media.
pub async fn latest_video(
    tools: &ToolRegistry,
    channel_url: &str,
    cookies: Option<&Path>,
    timeout: Duration,
) -> Result<LatestVideo> {
    let yt_dlp = tools.require("yt-dlp")?;

    tracing::debug!("resolve newest upload of {channel_url}");

    let output = ToolCommand::new("yt-dlp", yt_dlp)
        .args(resolve_args(channel_url, cookies))
        .timeout(timeout)
        .run()
        .await?;

    parse_flat_playlist(&output.stdout)
}

/// Download `video_url` to `dest`.
///
/// `dest` should live inside a [`crate::Workspace`] so partial downloads
/// never land in the cache.
pub async fn download(
    tools: &ToolRegistry,
    video_url: &str,
    dest: &Path,
    cookies: Option<&Path>,
    timeout: Duration,
) -> Result<()> {
    let yt_dlp = tools.require("yt-dlp")?;

    tracing::info!("download {video_url} -> {}", dest.display());

    ToolCommand::new("yt-dlp", yt_dlp)
        .args(download_args(video_url, dest, cookies))
        .timeout(timeout)
        .run()
        .await?;

    if !dest.exists() {
        return Err(Error::tool(
            "yt-dlp",
            format!("download produced no file at {}", dest.display()),
        ));
    }
    Ok(())
}
