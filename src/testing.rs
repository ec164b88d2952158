//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheKey, Clock, SnapshotBackend};
use crate::error::{CacheError, VideoError};
use crate::models::{ChannelInfo, PageToken, VideoPage, VideoSummary};
use crate::params::ChannelReference;
use crate::provider::VideoProvider;

/// Backend whose every operation fails.
pub struct BrokenBackend;

impl SnapshotBackend for BrokenBackend {
    fn load(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Unavailable("disk on fire".into()))
    }

    fn store(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("disk on fire".into()))
    }

    fn evict(&self, _key: &CacheKey, _fetched_at: DateTime<Utc>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("disk on fire".into()))
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += TimeDelta::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn sample_video(id: &str) -> VideoSummary {
    VideoSummary {
        id: id.to_string(),
        title: format!("Video {id}"),
        description: String::new(),
        channel_id: "UC123".into(),
        channel_title: "Channel".into(),
        published_at: None,
        thumbnail_url: Some(format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg")),
        statistics: None,
    }
}

/// Provider calls the fake has seen, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search { query: String, limit: u32 },
    VideoDetails(String),
    ChannelVideos { channel_id: String, limit: u32, page_token: Option<String> },
    ChannelInfo(String),
    Resolve(ChannelReference),
    Trending { category: Option<String>, limit: u32 },
}

/// Provider with a fixed set of channels and handles. Each channel's video
/// list is regenerated per call with a version suffix, so two fetches of the
/// same channel are distinguishable.
#[derive(Default)]
pub struct ScriptedProvider {
    channels: HashMap<String, String>,
    handles: HashMap<String, String>,
    fail_with: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, id: &str, title: &str) -> Self {
        self.channels.insert(id.to_string(), title.to_string());
        self
    }

    pub fn with_handle(mut self, handle: &str, id: &str) -> Self {
        self.handles.insert(handle.to_string(), id.to_string());
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn channel_video_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::ChannelVideos { .. }))
            .count()
    }

    fn record(&self, call: Call) -> Result<usize, VideoError> {
        let mut calls = self.calls.lock();
        calls.push(call);
        match &self.fail_with {
            Some(message) => Err(VideoError::Provider(message.clone())),
            None => Ok(calls.len()),
        }
    }

    fn videos(prefix: &str, channel_id: &str, count: u32, version: usize) -> Vec<VideoSummary> {
        (0..count)
            .map(|n| VideoSummary {
                channel_id: channel_id.to_string(),
                ..sample_video(&format!("{prefix}-{n}-v{version}"))
            })
            .collect()
    }
}

impl VideoProvider for ScriptedProvider {
    fn search(
        &self,
        query: &str,
        limit: u32,
        _page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError> {
        let version = self.record(Call::Search {
            query: query.to_string(),
            limit,
        })?;
        Ok(VideoPage::new(
            Self::videos("search", "UC123", limit, version),
            Some(PageToken::new("search-next")),
        ))
    }

    fn video_details(&self, video_id: &str) -> Result<VideoSummary, VideoError> {
        self.record(Call::VideoDetails(video_id.to_string()))?;
        if video_id == "missing" {
            return Err(VideoError::VideoNotFound(video_id.to_string()));
        }
        Ok(sample_video(video_id))
    }

    fn channel_videos(
        &self,
        channel_id: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError> {
        let version = self.record(Call::ChannelVideos {
            channel_id: channel_id.to_string(),
            limit,
            page_token: page_token.map(|token| token.as_str().to_string()),
        })?;
        if !self.channels.contains_key(channel_id) {
            return Err(VideoError::ChannelNotFound(channel_id.to_string()));
        }
        Ok(VideoPage::new(
            Self::videos(channel_id, channel_id, limit, version),
            Some(PageToken::new(format!("{channel_id}-page-2"))),
        ))
    }

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo, VideoError> {
        self.record(Call::ChannelInfo(channel_id.to_string()))?;
        let title = self
            .channels
            .get(channel_id)
            .ok_or_else(|| VideoError::ChannelNotFound(channel_id.to_string()))?;
        Ok(ChannelInfo {
            id: channel_id.to_string(),
            title: title.clone(),
            description: String::new(),
            custom_url: None,
            thumbnail_url: None,
            subscriber_count: Some(1000),
            video_count: Some(10),
        })
    }

    fn resolve_channel(&self, reference: &ChannelReference) -> Result<String, VideoError> {
        self.record(Call::Resolve(reference.clone()))?;
        let name = match reference {
            ChannelReference::Id(id) => return Ok(id.clone()),
            ChannelReference::Handle(name)
            | ChannelReference::Username(name)
            | ChannelReference::Custom(name) => name,
        };
        self.handles
            .get(name)
            .cloned()
            .ok_or_else(|| VideoError::ChannelNotFound(name.clone()))
    }

    fn trending(&self, category_id: Option<&str>, limit: u32) -> Result<VideoPage, VideoError> {
        let version = self.record(Call::Trending {
            category: category_id.map(str::to_string),
            limit,
        })?;
        Ok(VideoPage::new(
            Self::videos("trending", "UC123", limit, version),
            None,
        ))
    }
}
