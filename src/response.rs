//! Wire shapes returned by the video endpoints.
//!
//! Assembly only wraps values: video summaries are moved into the response
//! as-is, with counts and continuation tokens added around them.

use serde::Serialize;

use crate::aggregator::ChannelListing;
use crate::catalogue::CatalogueEntry;
use crate::models::{ChannelInfo, PageToken, VideoPage, VideoSummary};

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageToken>,
}

impl From<VideoPage> for VideoListResponse {
    fn from(page: VideoPage) -> Self {
        Self {
            videos: page.videos,
            next_page_token: page.next_page_token,
        }
    }
}

impl From<ChannelListing> for VideoListResponse {
    fn from(listing: ChannelListing) -> Self {
        listing.page.into()
    }
}

#[derive(Debug, Serialize)]
pub struct ChannelVideosResponse {
    pub channel: ChannelInfo,
    pub videos: Vec<VideoSummary>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageToken>,
}

impl ChannelVideosResponse {
    pub fn assemble(channel: ChannelInfo, listing: ChannelListing) -> Self {
        let VideoPage {
            videos,
            next_page_token,
        } = listing.page;
        Self {
            channel,
            count: videos.len(),
            videos,
            next_page_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub videos: Vec<VideoSummary>,
}

#[derive(Debug, Serialize)]
pub struct CatalogueVideosResponse {
    pub slug: String,
    pub channel_id: String,
    pub channel_name: String,
    pub videos: Vec<VideoSummary>,
    pub count: usize,
}

impl CatalogueVideosResponse {
    pub fn assemble(entry: CatalogueEntry, listing: ChannelListing) -> Self {
        let videos = listing.page.videos;
        Self {
            slug: entry.slug,
            channel_id: entry.id,
            channel_name: entry.name,
            count: videos.len(),
            videos,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogueResponse {
    pub channels: Vec<CatalogueEntry>,
    pub count: usize,
}
