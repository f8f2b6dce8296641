//! End-to-end pipelines.
//!
//! Two variants share the harvester and ranker but differ in how they
//! establish recency: the video path reads recency text straight off
//! the list page, the social path opens each post's page. An empty
//! result is a normal outcome, never an error.

use chrono::Duration;
use tracing::info;

use pulsescout_common::{
    normalize::parse_abbreviated_count, Config, EnrichedItem, PulseScoutError, VideoItem,
};

use crate::enricher::{enrich_all, EnrichOptions};
use crate::filter::filter_fresh;
use crate::harvester::harvest_list;
use crate::ranker::{rank_posts, rank_videos};
use crate::surfaces::{SocialSurface, VideoSurface};
use crate::traits::Browser;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub freshness: Duration,
    pub enrich: EnrichOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            freshness: Duration::hours(48),
            enrich: EnrichOptions::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        let freshness = Duration::hours(config.freshness_hours);
        Self {
            top_k: config.top_k,
            freshness,
            enrich: EnrichOptions {
                concurrency: config.enrich_concurrency,
                nav_timeout: std::time::Duration::from_secs(config.nav_timeout_secs),
                freshness,
                ..EnrichOptions::default()
            },
        }
    }
}

/// Harvest video search results for `query`, keep the fresh ones, and
/// return the top K by view count.
pub async fn video_pipeline(
    browser: &dyn Browser,
    query: &str,
    options: &PipelineOptions,
) -> Result<Vec<VideoItem>, PulseScoutError> {
    let raw = harvest_list(browser, &VideoSurface, query).await?;
    let fresh = filter_fresh(raw, options.freshness);

    let videos: Vec<VideoItem> = fresh
        .into_iter()
        .map(|item| VideoItem {
            title: item.title,
            url: item.detail_url,
            views: parse_abbreviated_count(&item.raw_metric_text),
            uploaded: item.raw_recency_text.unwrap_or_default(),
            kind: item.kind,
        })
        .collect();

    let ranked = rank_videos(videos, options.top_k);
    info!(query, count = ranked.len(), "Video pipeline complete");
    Ok(ranked)
}

/// Harvest social search results for `niche`, enrich each post from its
/// own page, and return the top K by engagement.
pub async fn social_pipeline(
    browser: &dyn Browser,
    niche: &str,
    options: &PipelineOptions,
) -> Result<Vec<EnrichedItem>, PulseScoutError> {
    let surface = SocialSurface;
    let raw = harvest_list(browser, &surface, niche).await?;
    let enriched = enrich_all(browser, &surface, raw, &options.enrich).await;

    let ranked = rank_posts(enriched, options.top_k);
    info!(niche, count = ranked.len(), "Social pipeline complete");
    Ok(ranked)
}
