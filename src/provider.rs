//! The capability the rest of the crate needs from the video platform.
//!
//! Production binds this to [`crate::youtube::YouTubeClient`]; tests bind it to
//! a scripted fake so cache behaviour can be checked without the network.
//! Implementations issue exactly one upstream request per call and never
//! retry. Calls block, so async callers run them on the blocking pool.

use crate::error::VideoError;
use crate::models::{ChannelInfo, PageToken, VideoPage, VideoSummary};
use crate::params::ChannelReference;

pub trait VideoProvider: Send + Sync {
    /// Keyword search, in provider relevance order.
    fn search(
        &self,
        query: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError>;

    /// Fails with [`VideoError::VideoNotFound`] when the id does not resolve.
    fn video_details(&self, video_id: &str) -> Result<VideoSummary, VideoError>;

    /// Newest uploads of a channel. Fails with
    /// [`VideoError::ChannelNotFound`] for unknown channels.
    fn channel_videos(
        &self,
        channel_id: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<VideoPage, VideoError>;

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo, VideoError>;

    /// Looks up the canonical id behind a handle, username or custom URL.
    fn resolve_channel(&self, reference: &ChannelReference) -> Result<String, VideoError>;

    /// Most-popular chart, optionally restricted to a provider category id.
    fn trending(&self, category_id: Option<&str>, limit: u32) -> Result<VideoPage, VideoError>;
}
