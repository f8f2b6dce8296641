//! Per-surface adapters.
//!
//! A surface owns everything site-specific: the target URL, the
//! browser-side extraction scripts, and the mapping from script output
//! to domain records. The harvester and enricher stay generic over
//! these two traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use pulsescout_common::RawListItem;

use crate::traits::PageHandle;

mod social;
mod video;

pub use social::SocialSurface;
pub use video::VideoSurface;

/// Site-specific knowledge for materializing a list page.
pub trait ListItemSource: Send + Sync {
    /// Full list URL for a query string.
    fn target_url(&self, query: &str) -> String;

    /// Whether the list page needs an authenticated session to render.
    fn requires_session(&self) -> bool;

    /// Script to dismiss a consent interstitial, if the surface shows
    /// one. Best-effort; failures are ignored.
    fn consent_script(&self) -> Option<&'static str> {
        None
    }

    /// Script returning a single number that grows while the list is
    /// still loading and stops growing once it has settled.
    fn measure_script(&self) -> &'static str;

    /// Script returning an array of raw item objects for `parse_item`.
    fn items_script(&self) -> &'static str;

    /// Hard cap on scroll rounds if the list never stabilizes.
    fn max_scroll_rounds(&self) -> usize;

    /// Map one raw script object to a domain record. `None` drops the
    /// entry (missing required fields, disallowed link shape).
    fn parse_item(&self, raw: &Value) -> Option<RawListItem>;
}

/// Site-specific knowledge for reading a single detail page.
#[async_trait]
pub trait DetailPageSource: Send + Sync {
    /// Extract the publish date, trying the surface's selector
    /// strategies in priority order. `None` means no strategy produced
    /// a parseable date.
    async fn publish_date(&self, page: &dyn PageHandle) -> Option<NaiveDate>;

    /// Extract up to `max` reply excerpts plus whether the page
    /// positively reports replies as disabled. Never fails: faults
    /// degrade to an empty list.
    async fn reply_excerpts(&self, page: &dyn PageHandle, max: usize) -> (Vec<String>, bool);
}
