//! Video search surface.
//!
//! Public search results page, no session required. Items carry their
//! view count and upload recency directly on the list page, so the
//! video pipeline never opens detail pages.

use serde_json::Value;
use url::form_urlencoded;

use pulsescout_common::{
    normalize::{clean_text, parse_abbreviated_count},
    Engagement, ItemKind, RawListItem,
};

use super::ListItemSource;

const RESULTS_URL: &str = "https://www.youtube.com/results";

/// Search filter pinning results to most recent uploads.
const UPLOAD_DATE_FILTER: &str = "CAMSBAgDEAE%253D";

const CONSENT_SCRIPT: &str = r#"
    const button = document.querySelector(
        'button[aria-label*="Accept"], button[aria-label*="accept"]');
    if (button) { button.click(); return true; }
    return false;
"#;

const MEASURE_SCRIPT: &str = "return document.documentElement.scrollHeight;";

/// Pulls title, link and the two metadata spans (view count text,
/// upload recency text) off each result tile. Tiles missing either
/// metadata span come back incomplete and are dropped in `parse_item`.
const ITEMS_SCRIPT: &str = r#"
    return Array.from(document.querySelectorAll('ytd-video-renderer')).map(el => {
        const link = el.querySelector('#video-title');
        const meta = Array.from(el.querySelectorAll('span.inline-metadata-item'))
            .map(s => s.textContent.trim());
        return {
            title: link ? link.textContent.trim() : null,
            href: link ? link.getAttribute('href') : null,
            views: meta.length >= 2 ? meta[0] : null,
            uploaded: meta.length >= 2 ? meta[1] : null,
        };
    });
"#;

pub struct VideoSurface;

impl ListItemSource for VideoSurface {
    fn target_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{RESULTS_URL}?search_query={encoded}&sp={UPLOAD_DATE_FILTER}")
    }

    fn requires_session(&self) -> bool {
        false
    }

    fn consent_script(&self) -> Option<&'static str> {
        Some(CONSENT_SCRIPT)
    }

    fn measure_script(&self) -> &'static str {
        MEASURE_SCRIPT
    }

    fn items_script(&self) -> &'static str {
        ITEMS_SCRIPT
    }

    fn max_scroll_rounds(&self) -> usize {
        10
    }

    fn parse_item(&self, raw: &Value) -> Option<RawListItem> {
        let title = raw["title"].as_str().filter(|t| !t.is_empty())?;
        let href = raw["href"].as_str()?;
        if !href.starts_with("/watch") && !href.starts_with("/shorts") {
            return None;
        }
        let views = raw["views"].as_str()?;
        let uploaded = raw["uploaded"].as_str()?;

        Some(RawListItem {
            title: clean_text(title),
            detail_url: format!("https://www.youtube.com{href}"),
            raw_metric_text: views.to_string(),
            raw_recency_text: Some(uploaded.to_string()),
            kind: ItemKind::from_url(href),
            engagement: Engagement {
                views: parse_abbreviated_count(views),
                ..Engagement::default()
            },
        })
    }
}
