//! Inline recency gate for surfaces that carry recency text on the
//! list page.

use chrono::Duration;
use tracing::debug;

use pulsescout_common::{normalize::parse_relative_recency, RawListItem};

/// Keep only items whose relative recency text parses and falls within
/// `window`. Unparseable or absent recency text disqualifies the item.
pub fn filter_fresh(items: Vec<RawListItem>, window: Duration) -> Vec<RawListItem> {
    let total = items.len();
    let fresh: Vec<RawListItem> = items
        .into_iter()
        .filter(|item| {
            item.raw_recency_text
                .as_deref()
                .and_then(parse_relative_recency)
                .map(|age| age <= window)
                .unwrap_or(false)
        })
        .collect();
    debug!(total, kept = fresh.len(), "Recency filter applied");
    fresh
}

#[cfg(test)]
mod tests {
    use pulsescout_common::{Engagement, ItemKind};

    use super::*;

    fn item(recency: Option<&str>) -> RawListItem {
        RawListItem {
            title: "t".to_string(),
            detail_url: "https://example.com/watch?v=1".to_string(),
            raw_metric_text: "1K views".to_string(),
            raw_recency_text: recency.map(str::to_string),
            kind: ItemKind::Standard,
            engagement: Engagement::default(),
        }
    }

    #[test]
    fn recent_items_pass() {
        let fresh = filter_fresh(
            vec![item(Some("5 hours ago")), item(Some("2 days ago"))],
            Duration::hours(48),
        );
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn stale_items_are_dropped() {
        let fresh = filter_fresh(vec![item(Some("3 days ago"))], Duration::hours(48));
        assert!(fresh.is_empty());
    }

    #[test]
    fn unparseable_recency_disqualifies() {
        let fresh = filter_fresh(
            vec![item(Some("yesterday")), item(None)],
            Duration::hours(48),
        );
        assert!(fresh.is_empty());
    }
}
