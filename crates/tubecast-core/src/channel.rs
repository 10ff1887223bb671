//! Channel identity types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Maximum length of a channel name in characters.
const MAX_NAME_LEN: usize = 64;

/// Validated channel name.
///
/// Names double as cache file stems (`<name>.mp4`) and URL path segments, so
/// the character set is restricted to lowercase ASCII alphanumerics plus `-`
/// and `_`. That keeps names safe to embed in paths without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// The raw name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this channel's cached rendition.
    pub fn file_name(&self) -> String {
        format!("{}.mp4", self.0)
    }
}

fn valid_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

impl FromStr for ChannelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::Validation("channel name is empty".into()));
        }
        if s.len() > MAX_NAME_LEN {
            return Err(Error::Validation(format!(
                "channel name exceeds {MAX_NAME_LEN} characters: {s}"
            )));
        }
        if let Some(c) = s.chars().find(|c| !valid_name_char(*c)) {
            return Err(Error::Validation(format!(
                "channel name contains invalid character {c:?}: {s}"
            )));
        }
        Ok(ChannelName(s.to_string()))
    }
}

impl TryFrom<String> for ChannelName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A channel to mirror: a stable name plus the upstream page listing its uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Name used for the cache file and the `/<name>.mp4` route.
    pub name: ChannelName,
    /// Channel or playlist URL handed to the resolver.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["qasimi", "sharique", "channel-2", "news_247", "a"] {
            assert!(name.parse::<ChannelName>().is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "UPPER", "has space", "a/b", "../evil", "dots.mp4"] {
            assert!(name.parse::<ChannelName>().is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(name.parse::<ChannelName>().is_err());
    }

    #[test]
    fn file_name_appends_extension() {
        let name: ChannelName = "qasimi".parse().unwrap();
        assert_eq!(name.file_name(), "qasimi.mp4");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let name: ChannelName = serde_json::from_str(r#""qasimi""#).unwrap();
        assert_eq!(name.as_str(), "qasimi");

        let bad: Result<ChannelName, _> = serde_json::from_str(r#""../evil""#);
        assert!(bad.is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let name: ChannelName = "qasimi".parse().unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""qasimi""#);
    }
}
