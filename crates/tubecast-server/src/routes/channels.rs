//! Channel status and tool availability API.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use tubecast_av::ToolInfo;

use crate::context::AppContext;
use crate::store::{CacheEntry, ChannelSnapshot};

/// Status of one configured channel.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelStatusResponse {
    /// Channel name; also the stream file stem.
    pub name: String,
    /// Upstream channel listing URL.
    pub source_url: String,
    /// Lifecycle phase: `idle`, `working`, `ready`, or `failed`.
    pub phase: String,
    /// Watch URL of the newest resolved upload.
    pub video_url: Option<String>,
    /// Title of the newest resolved upload.
    pub video_title: Option<String>,
    /// When the newest upload was last resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Most recent error for this channel, if any.
    pub last_error: Option<String>,
    /// The cached rendition, when present on disk.
    pub cached: Option<CachedFileResponse>,
}

/// A rendition file present in the cache directory.
#[derive(Debug, Serialize, ToSchema)]
pub struct CachedFileResponse {
    pub file_name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Availability of one external tool.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToolStatusResponse {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<String>,
}

impl From<ChannelSnapshot> for ChannelStatusResponse {
    fn from(snapshot: ChannelSnapshot) -> Self {
        Self {
            name: snapshot.name.to_string(),
            source_url: snapshot.source_url,
            phase: snapshot.phase.label().to_string(),
            video_url: snapshot.video.as_ref().map(|v| v.url.clone()),
            video_title: snapshot.video.as_ref().and_then(|v| v.title.clone()),
            resolved_at: snapshot.video.as_ref().map(|v| v.resolved_at),
            last_error: snapshot.last_error,
            cached: snapshot.cached.map(Into::into),
        }
    }
}

impl From<CacheEntry> for CachedFileResponse {
    fn from(entry: CacheEntry) -> Self {
        Self {
            file_name: entry.file_name,
            size: entry.size,
            modified: entry.modified,
        }
    }
}

impl From<ToolInfo> for ToolStatusResponse {
    fn from(info: ToolInfo) -> Self {
        Self {
            name: info.name,
            available: info.available,
            version: info.version,
            path: info.path.map(|p| p.display().to_string()),
        }
    }
}

/// List all configured channels with their current status.
#[utoipa::path(
    get,
    path = "/api/channels",
    responses(
        (status = 200, description = "Status of all configured channels", body = Vec<ChannelStatusResponse>)
    )
)]
pub async fn list_channels(State(ctx): State<AppContext>) -> Json<Vec<ChannelStatusResponse>> {
    Json(ctx.store.snapshots().into_iter().map(Into::into).collect())
}

/// Report availability and versions of the external tools.
#[utoipa::path(
    get,
    path = "/api/tools",
    responses(
        (status = 200, description = "Availability of yt-dlp and ffmpeg", body = Vec<ToolStatusResponse>)
    )
)]
pub async fn tool_status(State(ctx): State<AppContext>) -> Json<Vec<ToolStatusResponse>> {
    Json(ctx.tools.check_all().into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Phase, ResolvedVideo};
    use tubecast_av::LatestVideo;

    #[test]
    fn snapshot_maps_to_response() {
        let snapshot = ChannelSnapshot {
            name: "alpha".parse().unwrap(),
            source_url: "https://www.youtube.com/@alpha/videos".into(),
            phase: Phase::Ready,
            video: Some(ResolvedVideo::from(LatestVideo {
                id: "abc".into(),
                url: "https://www.youtube.com/watch?v=abc".into(),
                title: Some("Newest".into()),
            })),
            last_error: None,
            cached: None,
        };

        let response = ChannelStatusResponse::from(snapshot);
        assert_eq!(response.name, "alpha");
        assert_eq!(response.phase, "ready");
        assert_eq!(
            response.video_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert_eq!(response.video_title.as_deref(), Some("Newest"));
        assert!(response.resolved_at.is_some());
        assert!(response.cached.is_none());
    }

    #[test]
    fn failed_phase_keeps_label_and_error() {
        let snapshot = ChannelSnapshot {
            name: "alpha".parse().unwrap(),
            source_url: "https://www.youtube.com/@alpha/videos".into(),
            phase: Phase::Failed("yt-dlp missing".into()),
            video: None,
            last_error: Some("yt-dlp missing".into()),
            cached: None,
        };

        let response = ChannelStatusResponse::from(snapshot);
        assert_eq!(response.phase, "failed");
        assert_eq!(response.last_error.as_deref(), Some("yt-dlp missing"));
    }

    #[test]
    fn tool_info_maps_path_to_string() {
        let info = ToolInfo {
            name: "ffmpeg".into(),
            available: true,
            version: Some("ffmpeg version 6.1".into()),
            path: Some("/usr/bin/ffmpeg".into()),
        };
        let response = ToolStatusResponse::from(info);
        assert_eq!(response.path.as_deref(), Some("/usr/bin/ffmpeg"));
        assert!(response.available);
    }
}
