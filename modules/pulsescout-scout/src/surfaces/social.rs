//! Social search surface.
//!
//! Authenticated live-search page. Engagement counts are read off each
//! post's aria-labels on the list page; the publish date and reply
//! excerpts require opening the post's own page, so this surface also
//! implements [`DetailPageSource`].

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde_json::Value;
use url::form_urlencoded;

use pulsescout_common::{
    normalize::{clean_text, parse_abbreviated_count, parse_absolute_date},
    Engagement, ItemKind, RawListItem,
};

use super::{DetailPageSource, ListItemSource};
use crate::traits::PageHandle;

const SEARCH_URL: &str = "https://twitter.com/search";

/// Minimum-engagement qualifiers baked into every search. Keeps the
/// list page from filling up with zero-traction posts.
const ENGAGEMENT_QUALIFIERS: &str = "min_replies:5 min_faves:10 min_retweets:2";

/// Search window in days behind the current date.
const WINDOW_DAYS: u64 = 2;

const MEASURE_SCRIPT: &str = "return document.querySelectorAll('article').length;";

/// Reads the four engagement counts from each post's group aria-label
/// ("5 replies, 2 reposts, 10 likes, 1.2K views"). Posts that render
/// without the label still expose a retweet count via the retweet
/// button's data-testid, captured separately as a fallback.
const ITEMS_SCRIPT: &str = r#"
    const count = (label, name) => {
        const m = label.match(new RegExp('(\\d[\\d,.]*[KkMm]?)\\s+' + name));
        return m ? m[1] : null;
    };
    return Array.from(document.querySelectorAll('article')).map(el => {
        const textEl = el.querySelector('[data-testid="tweetText"]');
        const linkEl = el.querySelector('a[href*="/status/"]');
        const group = el.querySelector('[role="group"]');
        const label = group ? (group.getAttribute('aria-label') || '') : '';
        const rtEl = el.querySelector('[data-testid="retweet"]');
        return {
            text: textEl ? textEl.innerText : null,
            href: linkEl ? linkEl.getAttribute('href') : null,
            replies: count(label, '(?:repl)'),
            reposts: count(label, '(?:repost|retweet)'),
            retweet_fallback: rtEl ? rtEl.innerText.trim() : null,
            likes: count(label, '(?:like)'),
            views: count(label, '(?:view)'),
        };
    });
"#;

/// Date strategies, in priority order: the focal post's own timestamp,
/// any timestamp on the page, then structured page metadata.
const DATE_SCRIPTS: &[&str] = &[
    r#"
        const t = document.querySelector('article time');
        return t ? t.getAttribute('datetime') : null;
    "#,
    r#"
        const t = document.querySelector('time');
        return t ? t.getAttribute('datetime') : null;
    "#,
    r#"
        const m = document.querySelector(
            'meta[property="og:article:published_time"], meta[itemprop="datePublished"]');
        return m ? m.getAttribute('content') : null;
    "#,
];

/// First article is the focal post itself; replies start at index 1.
const REPLY_TEXTS_SCRIPT: &str = r#"
    return Array.from(document.querySelectorAll('article')).slice(1, 9).map(el => {
        const textEl = el.querySelector('[data-testid="tweetText"]');
        return textEl ? textEl.innerText : '';
    });
"#;

const REPLIES_DISABLED_SCRIPT: &str = r#"
    return !!document.querySelector('[data-testid="reply"][aria-disabled="true"]');
"#;

pub struct SocialSurface;

impl ListItemSource for SocialSurface {
    fn target_url(&self, niche: &str) -> String {
        let until = Utc::now().date_naive();
        let since = until - Days::new(WINDOW_DAYS);
        let query = format!("{niche} {ENGAGEMENT_QUALIFIERS} until:{until} since:{since}");
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{SEARCH_URL}?q={encoded}&src=typed_query&f=live")
    }

    fn requires_session(&self) -> bool {
        true
    }

    fn measure_script(&self) -> &'static str {
        MEASURE_SCRIPT
    }

    fn items_script(&self) -> &'static str {
        ITEMS_SCRIPT
    }

    fn max_scroll_rounds(&self) -> usize {
        50
    }

    fn parse_item(&self, raw: &Value) -> Option<RawListItem> {
        let text = raw["text"].as_str()?;
        let title = clean_text(text);
        if title.is_empty() {
            return None;
        }
        let href = raw["href"].as_str()?;
        if !href.contains("/status/") {
            return None;
        }
        let detail_url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("https://twitter.com{href}")
        };

        let count = |key: &str| {
            raw[key]
                .as_str()
                .map(parse_abbreviated_count)
                .unwrap_or(0)
        };
        let mut reshares = count("reposts");
        if reshares == 0 {
            reshares = count("retweet_fallback");
        }

        Some(RawListItem {
            title,
            detail_url,
            raw_metric_text: raw["views"].as_str().unwrap_or_default().to_string(),
            raw_recency_text: None,
            kind: ItemKind::Standard,
            engagement: Engagement {
                replies: count("replies"),
                reshares,
                likes: count("likes"),
                views: count("views"),
            },
        })
    }
}

#[async_trait]
impl DetailPageSource for SocialSurface {
    async fn publish_date(&self, page: &dyn PageHandle) -> Option<NaiveDate> {
        for script in DATE_SCRIPTS {
            if let Ok(value) = page.execute(script).await {
                if let Some(date) = value.as_str().and_then(parse_absolute_date) {
                    return Some(date);
                }
            }
        }
        None
    }

    async fn reply_excerpts(&self, page: &dyn PageHandle, max: usize) -> (Vec<String>, bool) {
        if let Ok(value) = page.execute(REPLIES_DISABLED_SCRIPT).await {
            if value.as_bool() == Some(true) {
                return (Vec::new(), true);
            }
        }
        match page.execute(REPLY_TEXTS_SCRIPT).await {
            Ok(value) => {
                let excerpts = value
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str())
                            .map(clean_text)
                            .filter(|t| !t.is_empty())
                            .take(max)
                            .collect()
                    })
                    .unwrap_or_default();
                (excerpts, false)
            }
            Err(_) => (Vec::new(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn target_url_carries_qualifiers_and_window() {
        let url = SocialSurface.target_url("rustlang");
        assert!(url.contains("min_replies%3A5"));
        assert!(url.contains("min_faves%3A10"));
        assert!(url.contains("min_retweets%3A2"));
        assert!(url.contains("until%3A"));
        assert!(url.contains("since%3A"));
        assert!(url.ends_with("&src=typed_query&f=live"));
    }

    #[test]
    fn live_search_requires_a_session() {
        assert!(SocialSurface.requires_session());
    }

    #[test]
    fn posts_parse_with_engagement_counts() {
        let raw = json!({
            "text": "Shipping a new\nparser today",
            "href": "/someone/status/12345",
            "replies": "8",
            "reposts": "3",
            "retweet_fallback": "3",
            "likes": "41",
            "views": "1.2K",
        });
        let item = SocialSurface.parse_item(&raw).unwrap();
        assert_eq!(item.title, "Shipping a new parser today");
        assert_eq!(item.detail_url, "https://twitter.com/someone/status/12345");
        assert_eq!(item.engagement.replies, 8);
        assert_eq!(item.engagement.reshares, 3);
        assert_eq!(item.engagement.likes, 41);
        assert_eq!(item.engagement.views, 1200);
    }

    #[test]
    fn retweet_fallback_fills_missing_reshares() {
        let raw = json!({
            "text": "fallback case",
            "href": "/a/status/1",
            "replies": "5",
            "reposts": null,
            "retweet_fallback": "7",
            "likes": "10",
            "views": "900",
        });
        let item = SocialSurface.parse_item(&raw).unwrap();
        assert_eq!(item.engagement.reshares, 7);
    }

    #[test]
    fn non_status_links_are_dropped() {
        let raw = json!({
            "text": "promoted thing",
            "href": "/i/trending/xyz",
            "replies": "1",
            "likes": "2",
        });
        assert!(SocialSurface.parse_item(&raw).is_none());
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let raw = json!({
            "text": "sparse post",
            "href": "/b/status/2",
        });
        let item = SocialSurface.parse_item(&raw).unwrap();
        assert_eq!(item.engagement, Engagement::default());
        assert_eq!(item.raw_metric_text, "");
    }
}
