use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account identity and secret for the session provider. The core
/// pipeline never reads these; they only flow into the login flow.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Standard,
    ShortForm,
}

impl ItemKind {
    /// Classify from the detail URL path. A `/shorts/` segment signals
    /// short-form content; everything else is standard.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/shorts/") {
            ItemKind::ShortForm
        } else {
            ItemKind::Standard
        }
    }
}

/// Engagement counts read off a list entry. Metrics whose elements are
/// missing default to 0 rather than disqualifying the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub replies: u64,
    pub reshares: u64,
    pub likes: u64,
    pub views: u64,
}

/// One list entry as extracted during harvesting. Records missing a
/// title or detail link are never constructed; they are dropped at
/// extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListItem {
    pub title: String,
    pub detail_url: String,
    pub raw_metric_text: String,
    pub raw_recency_text: Option<String>,
    pub kind: ItemKind,
    #[serde(default)]
    pub engagement: Engagement,
}

/// A list entry that survived detail enrichment. Construction requires
/// a parsed publish date: date-absent items are dropped before this
/// type exists, so "unranked but present" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub raw: RawListItem,
    pub published_date: NaiveDate,
    pub excerpt_replies: Vec<String>,
    pub feedback_disabled: bool,
}

impl EnrichedItem {
    pub fn engagement(&self) -> &Engagement {
        &self.raw.engagement
    }
}

/// The lighter video-path record: list-page fields only, no detail
/// fetch involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub title: String,
    pub url: String,
    pub views: u64,
    pub uploaded: String,
    pub kind: ItemKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorts_path_classifies_as_short_form() {
        assert_eq!(
            ItemKind::from_url("https://www.youtube.com/shorts/abc123"),
            ItemKind::ShortForm
        );
        assert_eq!(
            ItemKind::from_url("https://www.youtube.com/watch?v=abc123"),
            ItemKind::Standard
        );
    }

    #[test]
    fn engagement_defaults_to_zero() {
        let e = Engagement::default();
        assert_eq!((e.replies, e.reshares, e.likes, e.views), (0, 0, 0, 0));
    }
}
