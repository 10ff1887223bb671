//! Discovery of the external tools the pipeline shells out to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tubecast_core::config::ToolsConfig;
use tubecast_core::{Error, Result};

/// The closed set of tools this service drives, with the flag each one
/// reports its version under (ffmpeg predates the double-dash convention).
const TOOLS: &[KnownTool] = &[
    KnownTool {
        name: "yt-dlp",
        version_arg: "--version",
    },
    KnownTool {
        name: "ffmpeg",
        version_arg: "-version",
    },
];

struct KnownTool {
    name: &'static str,
    version_arg: &'static str,
}

impl KnownTool {
    /// Configured override path for this tool, if any.
    fn override_path<'c>(&self, config: &'c ToolsConfig) -> Option<&'c Path> {
        match self.name {
            "yt-dlp" => config.yt_dlp_path.as_deref(),
            "ffmpeg" => config.ffmpeg_path.as_deref(),
            _ => None,
        }
    }
}

/// Availability report for one tool, as shown by `check-tools` and the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version output, when it could be run.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolved executable locations for the known tools.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    paths: HashMap<&'static str, PathBuf>,
}

impl ToolRegistry {
    /// Locate every known tool once, preferring configured override paths
    /// over a `PATH` search. Tools that cannot be found are left out of the
    /// registry; callers hit the miss through [`ToolRegistry::require`].
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut paths = HashMap::new();
        for tool in TOOLS {
            if let Some(path) = locate(tool.name, tool.override_path(config)) {
                paths.insert(tool.name, path);
            }
        }
        Self { paths }
    }

    /// Executable path of `name`, or [`Error::Tool`] when discovery never
    /// found it.
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.paths.get(name).map(PathBuf::as_path).ok_or_else(|| {
            Error::tool(
                name,
                "not found; install it or set its path in the tools config",
            )
        })
    }

    /// Probe every known tool and report availability, version, and location.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        TOOLS
            .iter()
            .map(|tool| {
                let path = self.paths.get(tool.name);
                ToolInfo {
                    name: tool.name.to_string(),
                    available: path.is_some(),
                    version: path.and_then(|p| probe_version(p, tool.version_arg)),
                    path: path.cloned(),
                }
            })
            .collect()
    }
}

/// Resolve one tool: an existing override path wins, anything else falls
/// back to searching `PATH`.
fn locate(name: &str, override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(
            "Configured path for {name} does not exist: {}",
            path.display()
        );
    }
    which::which(name).ok()
}

/// First line of the tool's version output, or `None` when it cannot run.
fn probe_version(path: &Path, version_arg: &str) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg(version_arg)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_never_panics_without_tools() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // Neither tool may be installed where the tests run; the probe must
        // still produce a report for both.
        assert_eq!(registry.check_all().len(), 2);
    }

    #[test]
    fn check_all_covers_both_tools() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let names: Vec<String> = registry.check_all().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["yt-dlp", "ffmpeg"]);
    }

    #[test]
    fn require_unknown_tool_fails() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        assert!(registry.require("sox").is_err());
    }

    #[test]
    fn existing_override_path_wins() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = ToolsConfig {
            ffmpeg_path: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let registry = ToolRegistry::discover(&config);
        assert_eq!(registry.require("ffmpeg").unwrap(), tmp.path());
    }

    #[test]
    fn missing_override_falls_back_to_path_search() {
        let config = ToolsConfig {
            ffmpeg_path: Some(PathBuf::from("/nonexistent/ffmpeg-build")),
            ..Default::default()
        };
        let registry = ToolRegistry::discover(&config);
        // PATH may or may not have ffmpeg; the bogus override must never be
        // reported either way.
        if let Ok(path) = registry.require("ffmpeg") {
            assert_ne!(path, Path::new("/nonexistent/ffmpeg-build"));
        }
    }
}
