//! Normalization of client-supplied parameters.
//!
//! Result limits are clamped or defaulted per endpoint without any I/O.
//! Channel references are parsed into a [`ChannelReference`]; turning a handle
//! into a canonical id needs the provider and lives in the aggregator.

use url::Url;

use crate::error::VideoError;

/// What happens to a `max_results` value that falls outside `[1, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutOfBounds {
    Replace(u32),
    Reject,
}

/// Per-endpoint bounds for `max_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    name: &'static str,
    default: u32,
    max: u32,
    below: OutOfBounds,
    above: OutOfBounds,
}

/// Keyword search: default 9, anything outside `[1, 9]` becomes 9.
pub const SEARCH_LIMIT: LimitPolicy = LimitPolicy {
    name: "search",
    default: 9,
    max: 9,
    below: OutOfBounds::Replace(9),
    above: OutOfBounds::Replace(9),
};

/// Trending chart: same bounds as search.
pub const TRENDING_LIMIT: LimitPolicy = LimitPolicy {
    name: "trending",
    default: 9,
    max: 9,
    below: OutOfBounds::Replace(9),
    above: OutOfBounds::Replace(9),
};

/// Channel videos by id: default 10, values outside `[1, 50]` are rejected.
pub const CHANNEL_ID_LIMIT: LimitPolicy = LimitPolicy {
    name: "channel videos",
    default: 10,
    max: 50,
    below: OutOfBounds::Reject,
    above: OutOfBounds::Reject,
};

/// Channel videos by URL: default 20, capped at 50.
pub const CHANNEL_URL_LIMIT: LimitPolicy = LimitPolicy {
    name: "channel url videos",
    default: 20,
    max: 50,
    below: OutOfBounds::Replace(20),
    above: OutOfBounds::Replace(50),
};

/// Predefined channels: default 5, anything outside `[1, 20]` becomes 10.
pub const CATALOGUE_LIMIT: LimitPolicy = LimitPolicy {
    name: "predefined channel videos",
    default: 5,
    max: 20,
    below: OutOfBounds::Replace(10),
    above: OutOfBounds::Replace(10),
};

impl LimitPolicy {
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns the effective limit for a raw `max_results` value. The result
    /// always satisfies `1 <= limit <= max`.
    pub fn apply(&self, raw: Option<i64>) -> Result<u32, VideoError> {
        let Some(raw) = raw else {
            return Ok(self.default);
        };

        let outcome = if raw < 1 {
            self.below
        } else if raw > i64::from(self.max) {
            self.above
        } else {
            return Ok(raw as u32);
        };

        match outcome {
            OutOfBounds::Replace(value) => Ok(value),
            OutOfBounds::Reject => Err(VideoError::InvalidInput(format!(
                "max_results for {} must be between 1 and {}, got {raw}",
                self.name, self.max
            ))),
        }
    }
}

/// Parses a query-string `max_results`. Values that are not integers count
/// as absent so the endpoint default applies.
pub fn parse_query_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// A channel as the client named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// Canonical provider id, e.g. `UCsBjURrPoezykLs9EqgamOA`.
    Id(String),
    /// Public handle without the leading `@`.
    Handle(String),
    /// Legacy `/user/<name>` username.
    Username(String),
    /// Legacy `/c/<name>` custom URL.
    Custom(String),
}

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

impl ChannelReference {
    /// Parses a bare id, a bare `@handle`, or a profile URL.
    pub fn parse(input: &str) -> Result<Self, VideoError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VideoError::InvalidReference("empty channel reference".into()));
        }

        if looks_like_channel_id(trimmed) {
            return Ok(ChannelReference::Id(trimmed.to_owned()));
        }

        if let Some(handle) = trimmed.strip_prefix('@') {
            return handle_reference(handle, trimmed);
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&with_scheme)
            .map_err(|_| VideoError::InvalidReference(trimmed.to_owned()))?;

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !YOUTUBE_HOSTS.contains(&host.as_str()) {
            return Err(VideoError::InvalidReference(trimmed.to_owned()));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["channel", id, ..] if is_identifier(id) => Ok(ChannelReference::Id((*id).to_owned())),
            ["user", name, ..] if is_identifier(name) => {
                Ok(ChannelReference::Username((*name).to_owned()))
            }
            ["c", name, ..] if is_identifier(name) => {
                Ok(ChannelReference::Custom((*name).to_owned()))
            }
            [first, ..] if first.starts_with('@') => handle_reference(&first[1..], trimmed),
            _ => Err(VideoError::InvalidReference(trimmed.to_owned())),
        }
    }

    /// The canonical id, when no provider lookup is needed.
    pub fn canonical_id(&self) -> Option<&str> {
        match self {
            ChannelReference::Id(id) => Some(id),
            _ => None,
        }
    }
}

fn handle_reference(handle: &str, original: &str) -> Result<ChannelReference, VideoError> {
    if is_handle(handle) {
        Ok(ChannelReference::Handle(handle.to_owned()))
    } else {
        Err(VideoError::InvalidReference(original.to_owned()))
    }
}

fn looks_like_channel_id(value: &str) -> bool {
    value.len() > 2 && value.starts_with("UC") && is_identifier(value)
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// Handles additionally allow periods.
fn is_handle(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Named video categories accepted by the trending endpoint.
const CATEGORY_NAMES: &[(&str, &str)] = &[
    ("film", "1"),
    ("music", "10"),
    ("sports", "17"),
    ("gaming", "20"),
    ("comedy", "23"),
    ("entertainment", "24"),
    ("news", "25"),
    ("howto", "26"),
    ("education", "27"),
    ("science", "28"),
    ("tech", "28"),
];

/// Maps the trending `category` parameter to a provider category id.
pub fn trending_category(raw: Option<&str>) -> Result<Option<String>, VideoError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(Some(value.to_owned()));
    }

    let lowered = value.to_ascii_lowercase();
    CATEGORY_NAMES
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, id)| Some((*id).to_owned()))
        .ok_or_else(|| VideoError::InvalidInput(format!("unknown trending category: {value}")))
}
