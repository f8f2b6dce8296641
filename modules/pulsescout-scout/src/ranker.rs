//! Stable top-K ranking.

use pulsescout_common::{EnrichedItem, VideoItem};

/// Rank videos by view count descending and keep the top `k`. The sort
/// is stable, so equally-viewed items keep their harvest order.
pub fn rank_videos(mut items: Vec<VideoItem>, k: usize) -> Vec<VideoItem> {
    items.sort_by(|a, b| b.views.cmp(&a.views));
    items.truncate(k);
    items
}

/// Rank posts lexicographically by (views, likes, reshares, replies)
/// descending and keep the top `k`. Stable on full ties.
pub fn rank_posts(mut items: Vec<EnrichedItem>, k: usize) -> Vec<EnrichedItem> {
    items.sort_by(|a, b| post_key(b).cmp(&post_key(a)));
    items.truncate(k);
    items
}

fn post_key(item: &EnrichedItem) -> (u64, u64, u64, u64) {
    let e = item.engagement();
    (e.views, e.likes, e.reshares, e.replies)
}
