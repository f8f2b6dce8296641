//! Detail enricher: opens each item's page under bounded concurrency,
//! extracts the publish date and reply excerpts, and gates on recency.
//!
//! Enrichment is strictly lossy: every per-item fault (navigation
//! failure, timeout, missing date, stale date) drops that item and
//! nothing else. The batch itself cannot fail.

use std::time::Duration;

use chrono::Utc;
use futures::{stream, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use pulsescout_common::{EnrichedItem, RawListItem};

use crate::surfaces::DetailPageSource;
use crate::traits::{Browser, PageHandle};

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Maximum detail pages open at once.
    pub concurrency: usize,
    /// Per-item navigation timeout.
    pub nav_timeout: Duration,
    /// Recency window; items published before `now - freshness` are
    /// dropped.
    pub freshness: chrono::Duration,
    /// Maximum reply excerpts kept per item.
    pub max_excerpts: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            nav_timeout: Duration::from_secs(15),
            freshness: chrono::Duration::hours(48),
            max_excerpts: 3,
        }
    }
}

/// Enrich a batch of raw items. Output order follows completion order;
/// ranking downstream re-establishes a total order.
pub async fn enrich_all(
    browser: &dyn Browser,
    source: &dyn DetailPageSource,
    items: Vec<RawListItem>,
    options: &EnrichOptions,
) -> Vec<EnrichedItem> {
    let total = items.len();
    let enriched: Vec<EnrichedItem> = stream::iter(items)
        .map(|item| enrich_one(browser, source, item, options))
        .buffer_unordered(options.concurrency.max(1))
        .filter_map(|outcome| async move { outcome })
        .collect()
        .await;
    info!(total, kept = enriched.len(), "Enrichment complete");
    enriched
}

async fn enrich_one(
    browser: &dyn Browser,
    source: &dyn DetailPageSource,
    item: RawListItem,
    options: &EnrichOptions,
) -> Option<EnrichedItem> {
    let url = item.detail_url.clone();

    let page = match timeout(options.nav_timeout, browser.open_detail(&url)).await {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => {
            warn!(url = url.as_str(), error = %e, "Detail page failed to open, dropping item");
            return None;
        }
        Err(_) => {
            warn!(url = url.as_str(), "Detail navigation timed out, dropping item");
            return None;
        }
    };

    let outcome = extract_detail(&*page, source, item, options).await;

    // The page is released on every path, kept or dropped.
    if let Err(e) = page.close().await {
        warn!(url = url.as_str(), error = %e, "Failed to close detail page");
    }
    outcome
}

async fn extract_detail(
    page: &dyn PageHandle,
    source: &dyn DetailPageSource,
    item: RawListItem,
    options: &EnrichOptions,
) -> Option<EnrichedItem> {
    let Some(published_date) = source.publish_date(page).await else {
        debug!(url = item.detail_url.as_str(), "No parseable publish date, dropping item");
        return None;
    };

    let cutoff = (Utc::now() - options.freshness).date_naive();
    if published_date < cutoff {
        debug!(
            url = item.detail_url.as_str(),
            %published_date,
            "Published outside freshness window, dropping item"
        );
        return None;
    }

    let (excerpt_replies, feedback_disabled) =
        source.reply_excerpts(page, options.max_excerpts).await;

    Some(EnrichedItem {
        raw: item,
        published_date,
        excerpt_replies,
        feedback_disabled,
    })
}
