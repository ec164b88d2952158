//! Blocking client for the YouTube Data API v3.
//!
//! Every public operation maps to exactly one HTTP request. Raw API payloads
//! are deserialized into private structs that mirror the parts of the API
//! resources we read, then flattened into the crate's [`models`] types.
//!
//! [`models`]: crate::models

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::VideoError;
use crate::models::{ChannelInfo, PageToken, VideoPage, VideoStatistics, VideoSummary};
use crate::params::ChannelReference;
use crate::provider::VideoProvider;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_REGION: &str = "US";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("tubefeed/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`YouTubeClient`].
#[derive(Debug, Clone)]
pub struct YouTubeSettings {
    pub api_key: String,
    pub base_url: String,
    pub region: String,
    pub timeout: Duration,
}

impl YouTubeSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            region: DEFAULT_REGION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct YouTubeClient {
    agent: ureq::Agent,
    settings: YouTubeSettings,
}

/// A failed request, before it is mapped to an operation-specific error.
#[derive(Debug)]
struct Upstream {
    status: Option<u16>,
    reason: Option<String>,
    message: String,
}

impl Upstream {
    fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    fn into_video_error(self) -> VideoError {
        if self.reason.as_deref() == Some("invalidPageToken") {
            return VideoError::InvalidInput(self.message);
        }
        VideoError::Provider(self.message)
    }
}

impl YouTubeClient {
    pub fn new(settings: YouTubeSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent, settings }
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T, Upstream> {
        let url = format!("{}/{endpoint}", self.settings.base_url.trim_end_matches('/'));
        debug!(endpoint, ?params, "calling YouTube API");

        let mut request = self.agent.get(&url);
        for (name, value) in params {
            request = request.query(name, value);
        }
        request = request.query("key", &self.settings.api_key);

        match request.call() {
            Ok(response) => response.into_json::<T>().map_err(|err| Upstream {
                status: None,
                reason: None,
                message: format!("decoding {endpoint} response: {err}"),
            }),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(parse_error_body(code, &body))
            }
            Err(ureq::Error::Transport(transport)) => Err(Upstream {
                status: None,
                reason: None,
                message: format!("{endpoint} request failed: {transport}"),
            }),
        }
    }

    fn lookup_channel_id(&self, filter: &str, value: &str) -> Result<Option<String>, VideoError> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "id"), (filter, value)])
            .map_err(Upstream::into_video_error)?;
        Ok(response.items.into_iter().next().map(|item| item.id))
    }
}

impl VideoProvider for YouTubeClient {
    fn search(
        &self,
        query: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError> {
        let max_results = limit.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let response: ListResponse<SearchItem> = self
            .get("search", &params)
            .map_err(Upstream::into_video_error)?;
        Ok(response.into_page(SearchItem::into_summary))
    }

    fn video_details(&self, video_id: &str) -> Result<VideoSummary, VideoError> {
        let response: ListResponse<VideoItem> = self
            .get("videos", &[("part", "snippet,statistics"), ("id", video_id)])
            .map_err(Upstream::into_video_error)?;
        response.into_video(video_id)
    }

    fn channel_videos(
        &self,
        channel_id: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError> {
        let playlist = uploads_playlist(channel_id)
            .ok_or_else(|| VideoError::ChannelNotFound(channel_id.to_owned()))?;
        let max_results = limit.to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let response: ListResponse<PlaylistItem> =
            self.get("playlistItems", &params).map_err(|err| {
                if err.is_not_found() {
                    VideoError::ChannelNotFound(channel_id.to_owned())
                } else {
                    err.into_video_error()
                }
            })?;

        let next_page_token = response.next_page_token.map(PageToken::new);
        let videos = response
            .items
            .into_iter()
            .filter_map(|item| item.into_summary(channel_id))
            .collect();
        Ok(VideoPage::new(videos, next_page_token))
    }

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo, VideoError> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "snippet,statistics"), ("id", channel_id)])
            .map_err(Upstream::into_video_error)?;
        response
            .items
            .into_iter()
            .next()
            .map(ChannelItem::into_info)
            .ok_or_else(|| VideoError::ChannelNotFound(channel_id.to_owned()))
    }

    fn resolve_channel(&self, reference: &ChannelReference) -> Result<String, VideoError> {
        let (filter, value, label) = match reference {
            ChannelReference::Id(id) => return Ok(id.clone()),
            ChannelReference::Handle(handle) => ("forHandle", format!("@{handle}"), handle),
            ChannelReference::Custom(name) => ("forHandle", format!("@{name}"), name),
            ChannelReference::Username(name) => ("forUsername", name.clone(), name),
        };

        self.lookup_channel_id(filter, &value)?
            .ok_or_else(|| VideoError::ChannelNotFound(label.clone()))
    }

    fn trending(&self, category_id: Option<&str>, limit: u32) -> Result<VideoPage, VideoError> {
        let max_results = limit.to_string();
        let mut params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", self.settings.region.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(category) = category_id {
            params.push(("videoCategoryId", category));
        }

        let response: ListResponse<VideoItem> = self
            .get("videos", &params)
            .map_err(Upstream::into_video_error)?;
        Ok(response.into_page(VideoItem::into_summary))
    }
}

/// Every channel `UC…` has an uploads playlist `UU…` with the same suffix.
fn uploads_playlist(channel_id: &str) -> Option<String> {
    channel_id
        .strip_prefix("UC")
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!("UU{rest}"))
}

fn parse_error_body(status: u16, body: &str) -> Upstream {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reason = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.errors.first())
        .and_then(|detail| detail.reason.clone());
    let message = parsed
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("YouTube API returned HTTP {status}"));
    Upstream {
        status: Some(status),
        reason,
        message,
    }
}

fn parse_count(value: Option<String>) -> Option<u64> {
    value.and_then(|raw| raw.parse().ok())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

impl<T> ListResponse<T> {
    fn into_page(self, convert: impl Fn(T) -> Option<VideoSummary>) -> VideoPage {
        let videos = self.items.into_iter().filter_map(convert).collect();
        VideoPage::new(videos, self.next_page_token.map(PageToken::new))
    }
}

impl ListResponse<VideoItem> {
    /// An empty `items` list is how the API reports an unknown video id.
    fn into_video(self, video_id: &str) -> Result<VideoSummary, VideoError> {
        self.items
            .into_iter()
            .next()
            .and_then(VideoItem::into_summary)
            .ok_or_else(|| VideoError::VideoNotFound(video_id.to_owned()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|thumbnail| thumbnail.url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: Thumbnails,
    video_owner_channel_id: Option<String>,
    video_owner_channel_title: Option<String>,
}

impl VideoSnippet {
    fn into_summary(self, id: String, statistics: Option<VideoStatistics>) -> VideoSummary {
        VideoSummary {
            id,
            title: self.title,
            description: self.description,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            published_at: self.published_at,
            thumbnail_url: self.thumbnails.best(),
            statistics,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

impl SearchItem {
    fn into_summary(self) -> Option<VideoSummary> {
        let id = self.id.video_id?;
        Some(self.snippet.into_summary(id, None))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

impl From<RawVideoStatistics> for VideoStatistics {
    fn from(raw: RawVideoStatistics) -> Self {
        VideoStatistics {
            view_count: parse_count(raw.view_count),
            like_count: parse_count(raw.like_count),
            comment_count: parse_count(raw.comment_count),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    statistics: Option<RawVideoStatistics>,
}

impl VideoItem {
    fn into_summary(self) -> Option<VideoSummary> {
        let statistics = self.statistics.map(VideoStatistics::from);
        Some(self.snippet.into_summary(self.id, statistics))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: VideoSnippet,
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_id: String,
    video_published_at: Option<DateTime<Utc>>,
}

impl PlaylistItem {
    /// Private and deleted uploads carry no owner and are skipped.
    fn into_summary(self, channel_id: &str) -> Option<VideoSummary> {
        let PlaylistItem {
            mut snippet,
            content_details,
        } = self;
        let owner = snippet.video_owner_channel_id.take()?;
        snippet.channel_id = if owner.is_empty() {
            channel_id.to_owned()
        } else {
            owner
        };
        if let Some(title) = snippet.video_owner_channel_title.take() {
            snippet.channel_title = title;
        }
        // The snippet timestamp is when the item joined the playlist.
        if content_details.video_published_at.is_some() {
            snippet.published_at = content_details.video_published_at;
        }
        Some(snippet.into_summary(content_details.video_id, None))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    title: String,
    #[serde(default)]
    description: String,
    custom_url: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: Option<ChannelSnippet>,
    statistics: Option<RawChannelStatistics>,
}

impl ChannelItem {
    fn into_info(self) -> ChannelInfo {
        let (subscriber_count, video_count) = self
            .statistics
            .map(|stats| {
                (
                    parse_count(stats.subscriber_count),
                    parse_count(stats.video_count),
                )
            })
            .unwrap_or_default();

        match self.snippet {
            Some(snippet) => ChannelInfo {
                id: self.id,
                title: snippet.title,
                description: snippet.description,
                custom_url: snippet.custom_url,
                thumbnail_url: snippet.thumbnails.best(),
                subscriber_count,
                video_count,
            },
            None => ChannelInfo {
                title: self.id.clone(),
                id: self.id,
                description: String::new(),
                custom_url: None,
                thumbnail_url: None,
                subscriber_count,
                video_count,
            },
        }
    }
}
