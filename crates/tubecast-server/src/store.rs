//! In-memory channel state and cache directory bookkeeping.
//!
//! [`ChannelStore`] owns one slot per configured channel. A slot tracks the
//! channel's lifecycle [`Phase`], the upstream video it currently points at,
//! and the last error seen. Pipeline runs claim a slot via [`ChannelStore::begin`]
//! so concurrent preparation of the same channel coalesces onto one run, and
//! waiters block on [`ChannelStore::wait_settled`] until the run finishes.
//!
//! The store also fronts the cache directory: the published rendition for a
//! channel always lives at `<cache_dir>/<name>.mp4`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use tubecast_av::LatestVideo;
use tubecast_core::{ChannelConfig, ChannelName, Error, Result};

// ---------------------------------------------------------------------------
// Slot state
// ---------------------------------------------------------------------------

/// Lifecycle phase of a channel's rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing prepared yet and nobody working on it.
    Idle,
    /// A pipeline run is preparing the rendition.
    Working,
    /// A rendition was published to the cache.
    Ready,
    /// The most recent pipeline run failed.
    Failed(String),
}

impl Phase {
    /// Short lowercase label for logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Working => "working",
            Phase::Ready => "ready",
            Phase::Failed(_) => "failed",
        }
    }
}

/// Outcome of trying to claim a channel for pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the run and must settle it via
    /// [`ChannelStore::finish_ready`] or [`ChannelStore::finish_failed`].
    Started,
    /// Another task is already preparing this channel.
    InFlight,
}

/// The upstream video a channel currently points at.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    /// Upstream video identifier.
    pub id: String,
    /// Canonical watch URL.
    pub url: String,
    /// Video title, when known.
    pub title: Option<String>,
    /// When the resolution happened.
    pub resolved_at: DateTime<Utc>,
}

impl From<LatestVideo> for ResolvedVideo {
    fn from(video: LatestVideo) -> Self {
        Self {
            id: video.id,
            url: video.url,
            title: video.title,
            resolved_at: Utc::now(),
        }
    }
}

/// One rendition file in the cache directory.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File name, e.g. `qasimi.mp4`.
    pub file_name: String,
    /// Absolute path inside the cache directory.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Modification time.
    pub modified: DateTime<Utc>,
}

/// Point-in-time view of one channel for the status API.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub name: ChannelName,
    pub source_url: String,
    pub phase: Phase,
    pub video: Option<ResolvedVideo>,
    pub last_error: Option<String>,
    pub cached: Option<CacheEntry>,
}

struct SlotState {
    phase: Phase,
    video: Option<ResolvedVideo>,
    last_error: Option<String>,
}

struct ChannelSlot {
    config: ChannelConfig,
    state: Mutex<SlotState>,
    /// Signalled whenever the slot leaves [`Phase::Working`].
    settled: Notify,
}

// ---------------------------------------------------------------------------
// ChannelStore
// ---------------------------------------------------------------------------

/// Shared channel state, keyed by channel name.
///
/// The slot map is immutable after construction; per-slot state sits behind a
/// short-lived mutex, so the store can be shared freely across tasks.
pub struct ChannelStore {
    cache_dir: PathBuf,
    slots: HashMap<ChannelName, Arc<ChannelSlot>>,
}

impl ChannelStore {
    /// Build a store for the configured channels, creating the cache
    /// directory if it does not exist.
    ///
    /// Duplicate names keep the first occurrence, mirroring the config
    /// validation warning.
    pub fn new(cache_dir: impl Into<PathBuf>, channels: &[ChannelConfig]) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;

        let mut slots = HashMap::new();
        for channel in channels {
            slots
                .entry(channel.name.clone())
                .or_insert_with(|| {
                    Arc::new(ChannelSlot {
                        config: channel.clone(),
                        state: Mutex::new(SlotState {
                            phase: Phase::Idle,
                            video: None,
                            last_error: None,
                        }),
                        settled: Notify::new(),
                    })
                });
        }

        Ok(Self { cache_dir, slots })
    }

    /// The cache directory this store fronts.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Whether `name` is a configured channel.
    pub fn contains(&self, name: &ChannelName) -> bool {
        self.slots.contains_key(name)
    }

    /// All configured channel names, sorted.
    pub fn names(&self) -> Vec<ChannelName> {
        let mut names: Vec<ChannelName> = self.slots.keys().cloned().collect();
        names.sort();
        names
    }

    /// Upstream listing URL for `name`.
    pub fn source_url(&self, name: &ChannelName) -> Option<String> {
        self.slots.get(name).map(|slot| slot.config.url.clone())
    }

    /// Where the published rendition for `name` lives.
    pub fn cached_path(&self, name: &ChannelName) -> PathBuf {
        self.cache_dir.join(name.file_name())
    }

    fn slot(&self, name: &ChannelName) -> Result<&Arc<ChannelSlot>> {
        self.slots
            .get(name)
            .ok_or_else(|| Error::not_found("channel", name))
    }

    // -- pipeline claims ----------------------------------------------------

    /// Try to claim `name` for a pipeline run.
    pub fn begin(&self, name: &ChannelName) -> Result<Claim> {
        let slot = self.slot(name)?;
        let mut state = slot.state.lock();
        if state.phase == Phase::Working {
            return Ok(Claim::InFlight);
        }
        state.phase = Phase::Working;
        Ok(Claim::Started)
    }

    /// Settle a claimed run as successful and wake all waiters.
    pub fn finish_ready(&self, name: &ChannelName) -> Result<()> {
        let slot = self.slot(name)?;
        {
            let mut state = slot.state.lock();
            state.phase = Phase::Ready;
            state.last_error = None;
        }
        slot.settled.notify_waiters();
        Ok(())
    }

    /// Settle a claimed run as failed and wake all waiters.
    pub fn finish_failed(&self, name: &ChannelName, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        let slot = self.slot(name)?;
        {
            let mut state = slot.state.lock();
            state.last_error = Some(message.clone());
            state.phase = Phase::Failed(message);
        }
        slot.settled.notify_waiters();
        Ok(())
    }

    /// Current phase of `name`.
    pub fn phase(&self, name: &ChannelName) -> Result<Phase> {
        Ok(self.slot(name)?.state.lock().phase.clone())
    }

    /// Wait until `name` leaves [`Phase::Working`], or until `timeout`.
    ///
    /// Returns the phase observed when waiting stopped; a [`Phase::Working`]
    /// result means the timeout fired first.
    pub async fn wait_settled(&self, name: &ChannelName, timeout: Duration) -> Result<Phase> {
        let slot = self.slot(name)?.clone();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register interest before checking state so a notify between the
            // check and the await is not lost.
            let notified = slot.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = slot.state.lock();
                if state.phase != Phase::Working {
                    return Ok(state.phase.clone());
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Phase::Working);
            }
        }
    }

    // -- resolved video bookkeeping -----------------------------------------

    /// Record the upstream video `name` currently points at.
    pub fn record_video(&self, name: &ChannelName, video: ResolvedVideo) -> Result<()> {
        self.slot(name)?.state.lock().video = Some(video);
        Ok(())
    }

    /// The most recently recorded upstream video for `name`.
    pub fn video(&self, name: &ChannelName) -> Option<ResolvedVideo> {
        self.slots
            .get(name)
            .and_then(|slot| slot.state.lock().video.clone())
    }

    /// Record a non-fatal error (e.g. a failed refresh resolution) without
    /// changing the phase; a stale rendition can still be served.
    pub fn record_error(&self, name: &ChannelName, message: impl Into<String>) -> Result<()> {
        self.slot(name)?.state.lock().last_error = Some(message.into());
        Ok(())
    }

    // -- cache directory ----------------------------------------------------

    /// List every rendition file in the cache directory, sorted by name.
    pub fn cache_entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();

        for dirent in std::fs::read_dir(&self.cache_dir)? {
            let dirent = dirent?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
                continue;
            }
            let Ok(metadata) = dirent.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push(CacheEntry {
                file_name: dirent.file_name().to_string_lossy().into_owned(),
                path,
                size: metadata.len(),
                modified: modified.into(),
            });
        }

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }

    /// The cached rendition for `name`, if one is on disk.
    pub fn cache_entry(&self, name: &ChannelName) -> Option<CacheEntry> {
        let path = self.cached_path(name);
        let metadata = std::fs::metadata(&path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(CacheEntry {
            file_name: name.file_name(),
            path,
            size: metadata.len(),
            modified: modified.into(),
        })
    }

    // -- snapshots ----------------------------------------------------------

    /// Point-in-time view of one channel.
    pub fn snapshot(&self, name: &ChannelName) -> Result<ChannelSnapshot> {
        let slot = self.slot(name)?;
        let state = slot.state.lock();
        Ok(ChannelSnapshot {
            name: slot.config.name.clone(),
            source_url: slot.config.url.clone(),
            phase: state.phase.clone(),
            video: state.video.clone(),
            last_error: state.last_error.clone(),
            cached: self.cache_entry(name),
        })
    }

    /// Snapshots of all channels, sorted by name.
    pub fn snapshots(&self) -> Vec<ChannelSnapshot> {
        self.names()
            .iter()
            .filter_map(|name| self.snapshot(name).ok())
            .collect()
    }
}

/// Age of a file computed from its mtime, or `None` if it cannot be read.
pub fn file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}
