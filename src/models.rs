//! Value types handed between the provider, the cache and the HTTP layer.
//!
//! Everything here is a point-in-time snapshot of provider data. Nothing holds
//! a reference back to where it came from, so a response can own its own copy
//! independent of whatever the cache keeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque continuation cursor issued by the provider.
///
/// The token is never built or edited locally; it travels from one listing
/// response into the next request untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Empty strings are what clients send when they have no cursor.
    pub fn from_request(token: Option<String>) -> Option<Self> {
        token.filter(|value| !value.trim().is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// View/like/comment counters. The provider omits counters that a channel
/// has hidden, so each one is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u64>,
}

/// One page of a provider listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPage {
    pub videos: Vec<VideoSummary>,
    pub next_page_token: Option<PageToken>,
}

impl VideoPage {
    pub fn new(videos: Vec<VideoSummary>, next_page_token: Option<PageToken>) -> Self {
        Self {
            videos,
            next_page_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_token_from_request_drops_blank_values() {
        assert_eq!(PageToken::from_request(None), None);
        assert_eq!(PageToken::from_request(Some("   ".into())), None);
        assert_eq!(
            PageToken::from_request(Some("CAoQAA".into())),
            Some(PageToken::new("CAoQAA"))
        );
    }

    #[test]
    fn page_token_from_request_is_forwarded_verbatim() {
        let token = PageToken::from_request(Some(" CAoQAA\n".into())).unwrap();
        assert_eq!(token.as_str(), " CAoQAA\n");
    }

    #[test]
    fn video_summary_skips_missing_optional_fields() {
        let video = VideoSummary {
            id: "abc".into(),
            title: "Title".into(),
            description: String::new(),
            channel_id: "UC1".into(),
            channel_title: String::new(),
            published_at: None,
            thumbnail_url: None,
            statistics: None,
        };
        let value = serde_json::to_value(&video).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "abc", "title": "Title", "channel_id": "UC1"})
        );
    }
}
