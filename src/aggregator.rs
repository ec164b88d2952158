//! Channel-level orchestration: cache-then-fetch for video lists, reference
//! resolution, and the predefined channel catalogue.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, SnapshotCache};
use crate::catalogue::{CatalogueEntry, ChannelCatalogue};
use crate::error::VideoError;
use crate::models::{ChannelInfo, PageToken, VideoPage};
use crate::params::ChannelReference;
use crate::provider::VideoProvider;

/// Where a channel listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Cache,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListing {
    pub page: VideoPage,
    pub source: ListingSource,
}

pub struct ChannelAggregator {
    provider: Arc<dyn VideoProvider>,
    cache: SnapshotCache,
    catalogue: ChannelCatalogue,
}

impl ChannelAggregator {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        cache: SnapshotCache,
        catalogue: ChannelCatalogue,
    ) -> Self {
        Self {
            provider,
            cache,
            catalogue,
        }
    }

    pub fn catalogue(&self) -> &ChannelCatalogue {
        &self.catalogue
    }

    /// Lists a channel's videos. Without a page token the cache is consulted
    /// first and refilled after a provider fetch; a cached snapshot carries
    /// no continuation token. With a page token the cache is bypassed since
    /// snapshots only ever hold the first page.
    pub fn channel_videos(
        &self,
        channel_id: &str,
        limit: u32,
        page_token: Option<&PageToken>,
    ) -> Result<ChannelListing, VideoError> {
        if page_token.is_some() {
            let page = self.provider.channel_videos(channel_id, limit, page_token)?;
            return Ok(ChannelListing {
                page,
                source: ListingSource::Provider,
            });
        }

        let key = CacheKey::new(channel_id, limit);
        if let Some(entry) = self.cache.get(&key) {
            debug!(channel = channel_id, limit, "channel snapshot cache hit");
            return Ok(ChannelListing {
                page: VideoPage::new(entry.videos, None),
                source: ListingSource::Cache,
            });
        }

        debug!(channel = channel_id, limit, "channel snapshot cache miss");
        let page = self.provider.channel_videos(channel_id, limit, None)?;
        self.cache.put(&key, &page.videos);
        Ok(ChannelListing {
            page,
            source: ListingSource::Provider,
        })
    }

    /// Always a provider call; channel metadata is never cached.
    pub fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo, VideoError> {
        self.provider.channel_info(channel_id)
    }

    /// Turns a reference into a canonical channel id. Ids pass through
    /// untouched; handles and legacy names need a provider lookup.
    pub fn resolve(&self, reference: &ChannelReference) -> Result<String, VideoError> {
        match reference.canonical_id() {
            Some(id) => Ok(id.to_owned()),
            None => self.provider.resolve_channel(reference),
        }
    }

    /// Resolves a channel URL or handle, then returns its metadata alongside
    /// its videos.
    pub fn channel_by_reference(
        &self,
        raw_reference: &str,
        limit: u32,
    ) -> Result<(ChannelInfo, ChannelListing), VideoError> {
        let reference = ChannelReference::parse(raw_reference)?;
        let channel_id = self.resolve(&reference)?;
        let info = self.channel_info(&channel_id)?;
        let listing = self.channel_videos(&channel_id, limit, None)?;
        Ok((info, listing))
    }

    /// Videos of a catalogue channel, looked up by slug.
    pub fn catalogue_videos(
        &self,
        slug: &str,
        limit: u32,
    ) -> Result<(CatalogueEntry, ChannelListing), VideoError> {
        let entry = self
            .catalogue
            .get(slug)
            .cloned()
            .ok_or_else(|| VideoError::UnknownCatalogueEntry(slug.to_owned()))?;
        let listing = self.channel_videos(&entry.id, limit, None)?;
        Ok((entry, listing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySnapshots;
    use crate::testing::{BrokenBackend, Call, ManualClock, ScriptedProvider};
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_secs(3600);

    struct Fixture {
        provider: Arc<ScriptedProvider>,
        clock: Arc<ManualClock>,
        backend: Arc<MemorySnapshots>,
        aggregator: ChannelAggregator,
    }

    fn fixture(provider: ScriptedProvider) -> Fixture {
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::default());
        let backend = Arc::new(MemorySnapshots::new());
        let cache = SnapshotCache::with_clock(backend.clone(), WINDOW, clock.clone());
        let catalogue = ChannelCatalogue::new(vec![CatalogueEntry {
            slug: "gophers".into(),
            id: "UCgo".into(),
            name: "Gophers".into(),
        }])
        .unwrap();
        let aggregator = ChannelAggregator::new(provider.clone(), cache, catalogue);
        Fixture {
            provider,
            clock,
            backend,
            aggregator,
        }
    }

    fn default_provider() -> ScriptedProvider {
        ScriptedProvider::new()
            .with_channel("UC123", "Channel 123")
            .with_channel("UCgo", "Gophers")
            .with_handle("gophers", "UCgo")
    }

    #[test]
    fn second_call_within_window_is_served_from_cache() {
        let fx = fixture(default_provider());

        let first = fx.aggregator.channel_videos("UC123", 10, None).unwrap();
        let second = fx.aggregator.channel_videos("UC123", 10, None).unwrap();

        assert_eq!(first.source, ListingSource::Provider);
        assert!(first.page.next_page_token.is_some());
        assert_eq!(second.source, ListingSource::Cache);
        assert_eq!(second.page.videos, first.page.videos);
        assert_eq!(second.page.next_page_token, None);
        assert_eq!(fx.provider.channel_video_calls(), 1);
    }

    #[test]
    fn expired_snapshot_is_refetched_and_replaced() {
        let fx = fixture(default_provider());

        let first = fx.aggregator.channel_videos("UC123", 3, None).unwrap();
        fx.clock.advance(WINDOW);
        let second = fx.aggregator.channel_videos("UC123", 3, None).unwrap();
        let third = fx.aggregator.channel_videos("UC123", 3, None).unwrap();

        assert_eq!(fx.provider.channel_video_calls(), 2);
        assert_eq!(second.source, ListingSource::Provider);
        assert_ne!(first.page.videos, second.page.videos);
        assert_eq!(third.source, ListingSource::Cache);
        assert_eq!(third.page.videos, second.page.videos);
        assert!(third.page.videos.iter().all(|video| video.id.ends_with("-v2")));
    }

    #[test]
    fn unknown_channel_is_not_found_and_not_cached() {
        let fx = fixture(default_provider());

        let result = fx.aggregator.channel_videos("UC_unknown", 10, None);
        assert!(matches!(result, Err(VideoError::ChannelNotFound(_))));
        assert!(fx.backend.is_empty());
    }

    #[test]
    fn provider_errors_propagate_unchanged() {
        let fx = fixture(default_provider().failing("quota exceeded"));

        let result = fx.aggregator.channel_videos("UC123", 10, None);
        assert!(matches!(result, Err(VideoError::Provider(message)) if message == "quota exceeded"));
        assert!(fx.backend.is_empty());
    }

    #[test]
    fn page_tokens_bypass_the_cache() {
        let fx = fixture(default_provider());
        fx.aggregator.channel_videos("UC123", 10, None).unwrap();

        let token = PageToken::new("UC123-page-2");
        let next = fx
            .aggregator
            .channel_videos("UC123", 10, Some(&token))
            .unwrap();

        assert_eq!(next.source, ListingSource::Provider);
        assert_eq!(fx.provider.channel_video_calls(), 2);
        assert_eq!(
            fx.provider.calls().last(),
            Some(&Call::ChannelVideos {
                channel_id: "UC123".into(),
                limit: 10,
                page_token: Some("UC123-page-2".into()),
            })
        );
        // The first-page snapshot is untouched by the second page.
        let cached = fx.aggregator.channel_videos("UC123", 10, None).unwrap();
        assert_eq!(cached.source, ListingSource::Cache);
        assert!(cached.page.videos[0].id.ends_with("-v1"));
    }

    #[test]
    fn channel_info_is_never_cached() {
        let fx = fixture(default_provider());
        fx.aggregator.channel_info("UC123").unwrap();
        fx.aggregator.channel_info("UC123").unwrap();
        let info_calls = fx
            .provider
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::ChannelInfo(_)))
            .count();
        assert_eq!(info_calls, 2);
    }

    #[test]
    fn resolving_a_url_matches_direct_lookup() {
        let fx = fixture(default_provider());

        let by_url = fx
            .aggregator
            .resolve(&ChannelReference::parse("https://www.youtube.com/channel/UCgo").unwrap())
            .unwrap();
        let by_handle = fx
            .aggregator
            .resolve(&ChannelReference::parse("https://www.youtube.com/@gophers").unwrap())
            .unwrap();

        assert_eq!(by_url, "UCgo");
        assert_eq!(by_handle, "UCgo");
        // Only the handle needed the provider.
        assert_eq!(
            fx.provider.calls(),
            vec![Call::Resolve(ChannelReference::Handle("gophers".into()))]
        );
    }

    #[test]
    fn channel_by_reference_shares_the_id_cache() {
        let fx = fixture(default_provider());

        let direct = fx.aggregator.channel_videos("UCgo", 20, None).unwrap();
        let (info, listing) = fx.aggregator.channel_by_reference("@gophers", 20).unwrap();

        assert_eq!(info.id, "UCgo");
        assert_eq!(info.title, "Gophers");
        assert_eq!(listing.source, ListingSource::Cache);
        assert_eq!(listing.page.videos, direct.page.videos);
    }

    #[test]
    fn unresolvable_handles_are_not_found() {
        let fx = fixture(default_provider());
        assert!(matches!(
            fx.aggregator.channel_by_reference("@nobody", 20),
            Err(VideoError::ChannelNotFound(_))
        ));
        assert!(matches!(
            fx.aggregator.channel_by_reference("https://example.com/@gophers", 20),
            Err(VideoError::InvalidReference(_))
        ));
    }

    #[test]
    fn catalogue_channels_use_their_configured_id() {
        let fx = fixture(default_provider());

        let (entry, listing) = fx.aggregator.catalogue_videos("gophers", 5).unwrap();
        assert_eq!(entry.name, "Gophers");
        assert_eq!(listing.page.videos.len(), 5);
        assert!(listing.page.videos.iter().all(|video| video.channel_id == "UCgo"));

        let (_, again) = fx.aggregator.catalogue_videos("GOPHERS", 5).unwrap();
        assert_eq!(again.source, ListingSource::Cache);
        assert_eq!(fx.provider.channel_video_calls(), 1);
    }

    #[test]
    fn unknown_catalogue_slug_is_not_found() {
        let fx = fixture(default_provider());
        let err = fx.aggregator.catalogue_videos("rustaceans", 5).unwrap_err();
        assert!(matches!(err, VideoError::UnknownCatalogueEntry(_)));
        assert!(err.is_not_found());
        assert!(fx.provider.calls().is_empty());
    }

    #[test]
    fn disabled_cache_always_calls_the_provider() {
        let provider = Arc::new(default_provider());
        let aggregator = ChannelAggregator::new(
            provider.clone(),
            SnapshotCache::disabled(),
            ChannelCatalogue::default(),
        );

        aggregator.channel_videos("UC123", 10, None).unwrap();
        let second = aggregator.channel_videos("UC123", 10, None).unwrap();
        assert_eq!(second.source, ListingSource::Provider);
        assert_eq!(provider.channel_video_calls(), 2);
    }

    #[test]
    fn failing_cache_writes_still_return_the_fetched_page() {
        let provider = Arc::new(default_provider());
        let cache = SnapshotCache::new(Arc::new(BrokenBackend), WINDOW);
        let aggregator =
            ChannelAggregator::new(provider.clone(), cache, ChannelCatalogue::default());

        let listing = aggregator.channel_videos("UC123", 4, None).unwrap();
        assert_eq!(listing.source, ListingSource::Provider);
        assert_eq!(listing.page.videos.len(), 4);
        assert!(listing.page.next_page_token.is_some());

        let again = aggregator.channel_videos("UC123", 4, None).unwrap();
        assert_eq!(again.source, ListingSource::Provider);
        assert_eq!(provider.channel_video_calls(), 2);
    }
}
