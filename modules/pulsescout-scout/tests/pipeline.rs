//! End-to-end pipeline tests against the mock browser.

use chrono::Utc;
use serde_json::{json, Value};

use pulsescout_common::PulseScoutError;
use pulsescout_scout::pipeline::{social_pipeline, video_pipeline, PipelineOptions};
use pulsescout_scout::surfaces::{ListItemSource, SocialSurface, VideoSurface};
use pulsescout_scout::testing::{social_post, video_tile, MockBrowser, PageScript};

const VIDEO_MEASURE: &str = "scrollHeight";
const VIDEO_ITEMS: &str = "ytd-video-renderer";
const SOCIAL_MEASURE: &str = "article').length";
const SOCIAL_ITEMS: &str = "role=\"group\"";
const DATE_PRIMARY: &str = "'article time'";
const REPLIES_DISABLED: &str = "aria-disabled";
const REPLY_TEXTS: &str = "slice(1, 9)";

fn recent_iso() -> Value {
    json!(format!("{}T12:00:00.000Z", Utc::now().date_naive()))
}

fn detail_page(replies: &[&str]) -> PageScript {
    PageScript::new()
        .on(DATE_PRIMARY, recent_iso())
        .on(REPLIES_DISABLED, json!(false))
        .on(REPLY_TEXTS, json!(replies))
}

#[tokio::test(start_paused = true)]
async fn video_pipeline_ranks_fresh_results_by_views() {
    let url = VideoSurface.target_url("rust");
    let list = PageScript::new()
        .on_sequence(VIDEO_MEASURE, vec![json!(1000), json!(1000)])
        .on(
            VIDEO_ITEMS,
            json!([
                video_tile("mid", "/watch?v=1", "4K views", "5 hours ago"),
                video_tile("top", "/watch?v=2", "90K views", "1 day ago"),
                video_tile("stale", "/watch?v=3", "500K views", "3 days ago"),
                video_tile("channel ad", "/channel/UCx", "1M views", "1 hour ago"),
                video_tile("low", "/shorts/4", "900 views", "30 minutes ago"),
            ]),
        );
    let browser = MockBrowser::new().on_list(&url, list);

    let ranked = video_pipeline(&browser, "rust", &PipelineOptions::default())
        .await
        .unwrap();

    let titles: Vec<&str> = ranked.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["top", "mid", "low"]);
    assert_eq!(ranked[0].views, 90_000);
    assert!(browser.all_pages_closed());
}

#[tokio::test(start_paused = true)]
async fn video_pipeline_with_only_stale_results_is_empty_not_error() {
    let url = VideoSurface.target_url("rust");
    let list = PageScript::new()
        .on_sequence(VIDEO_MEASURE, vec![json!(1000), json!(1000)])
        .on(
            VIDEO_ITEMS,
            json!([
                video_tile("old", "/watch?v=1", "4K views", "3 days ago"),
                video_tile("older", "/watch?v=2", "9K views", "2 weeks ago"),
                video_tile("vague", "/watch?v=3", "1K views", "yesterday"),
            ]),
        );
    let browser = MockBrowser::new().on_list(&url, list);

    let ranked = video_pipeline(&browser, "rust", &PipelineOptions::default())
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test(start_paused = true)]
async fn video_pipeline_fails_when_list_page_never_loads() {
    let browser = MockBrowser::new();
    let err = video_pipeline(&browser, "rust", &PipelineOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PulseScoutError::Navigation(_)));
}

#[tokio::test(start_paused = true)]
async fn scrolling_stops_once_the_measure_stabilizes() {
    let url = VideoSurface.target_url("rust");
    // Grows for three rounds, then repeats: the loop must stop on the
    // fourth round, well under the surface's cap of ten.
    let list = PageScript::new()
        .on("scrollBy", json!(true))
        .on_sequence(
            VIDEO_MEASURE,
            vec![json!(1000), json!(2000), json!(3000), json!(3000)],
        )
        .on(VIDEO_ITEMS, json!([]));
    let browser = MockBrowser::new().on_list(&url, list);

    video_pipeline(&browser, "rust", &PipelineOptions::default())
        .await
        .unwrap();

    assert_eq!(browser.script_hits(VIDEO_MEASURE), 4);
    assert_eq!(browser.script_hits("scrollBy"), 4);
}

#[tokio::test(start_paused = true)]
async fn social_pipeline_enriches_ranks_and_truncates() {
    let url = SocialSurface.target_url("rustlang");
    let posts: Vec<Value> = (1..=8)
        .map(|i| {
            social_post(
                &format!("post {i}"),
                &format!("/u/status/{i}"),
                &format!("{}", (9 - i) * 100),
                "10",
            )
        })
        .collect();
    let list = PageScript::new()
        .on_sequence(SOCIAL_MEASURE, vec![json!(8), json!(8)])
        .on(SOCIAL_ITEMS, Value::Array(posts));

    let mut browser = MockBrowser::new().on_list(&url, list);
    for i in 1..=6 {
        browser = browser.on_detail(
            &format!("https://twitter.com/u/status/{i}"),
            detail_page(&["Nice!", "", "Great writeup", "Agreed", "Bonus"]),
        );
    }
    // Post 7 renders without any timestamp; post 8 never loads.
    browser = browser
        .on_detail("https://twitter.com/u/status/7", PageScript::new())
        .detail_unavailable("https://twitter.com/u/status/8");

    let ranked = social_pipeline(&browser, "rustlang", &PipelineOptions::default())
        .await
        .unwrap();

    let titles: Vec<&str> = ranked.iter().map(|p| p.raw.title.as_str()).collect();
    assert_eq!(titles, ["post 1", "post 2", "post 3", "post 4", "post 5"]);
    assert_eq!(ranked[0].engagement().views, 800);
    // Empty excerpt filtered, remainder capped at three.
    assert_eq!(
        ranked[0].excerpt_replies,
        ["Nice!", "Great writeup", "Agreed"]
    );
    assert_eq!(browser.details_opened(), 7);
    assert!(browser.all_pages_closed());
}

#[tokio::test(start_paused = true)]
async fn stale_posts_are_dropped_during_enrichment() {
    let url = SocialSurface.target_url("rustlang");
    let list = PageScript::new()
        .on_sequence(SOCIAL_MEASURE, vec![json!(1), json!(1)])
        .on(
            SOCIAL_ITEMS,
            json!([social_post("ancient", "/u/status/1", "5000", "99")]),
        );
    let old_detail = PageScript::new()
        .on(DATE_PRIMARY, json!("2020-01-15T08:00:00.000Z"))
        .on(REPLIES_DISABLED, json!(false));
    let browser = MockBrowser::new()
        .on_list(&url, list)
        .on_detail("https://twitter.com/u/status/1", old_detail);

    let ranked = social_pipeline(&browser, "rustlang", &PipelineOptions::default())
        .await
        .unwrap();
    assert!(ranked.is_empty());
    assert!(browser.all_pages_closed());
}

#[tokio::test(start_paused = true)]
async fn hung_detail_page_times_out_and_drops_only_that_item() {
    let url = SocialSurface.target_url("rustlang");
    let list = PageScript::new()
        .on_sequence(SOCIAL_MEASURE, vec![json!(2), json!(2)])
        .on(
            SOCIAL_ITEMS,
            json!([
                social_post("healthy", "/u/status/1", "300", "10"),
                social_post("stuck", "/u/status/2", "9000", "10"),
            ]),
        );
    let browser = MockBrowser::new()
        .on_list(&url, list)
        .on_detail("https://twitter.com/u/status/1", detail_page(&["ok"]))
        .detail_hangs("https://twitter.com/u/status/2");

    let ranked = social_pipeline(&browser, "rustlang", &PipelineOptions::default())
        .await
        .unwrap();

    let titles: Vec<&str> = ranked.iter().map(|p| p.raw.title.as_str()).collect();
    assert_eq!(titles, ["healthy"]);
    assert!(browser.all_pages_closed());
}

#[tokio::test(start_paused = true)]
async fn disabled_replies_keep_the_item_with_empty_excerpts() {
    let url = SocialSurface.target_url("rustlang");
    let list = PageScript::new()
        .on_sequence(SOCIAL_MEASURE, vec![json!(1), json!(1)])
        .on(
            SOCIAL_ITEMS,
            json!([social_post("locked", "/u/status/1", "400", "20")]),
        );
    let locked_detail = PageScript::new()
        .on(DATE_PRIMARY, recent_iso())
        .on(REPLIES_DISABLED, json!(true));
    let browser = MockBrowser::new()
        .on_list(&url, list)
        .on_detail("https://twitter.com/u/status/1", locked_detail);

    let ranked = social_pipeline(&browser, "rustlang", &PipelineOptions::default())
        .await
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert!(ranked[0].feedback_disabled);
    assert!(ranked[0].excerpt_replies.is_empty());
}
