//! List harvester: scroll until the page stops growing, then extract.

use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use pulsescout_common::{PulseScoutError, RawListItem};

use crate::surfaces::ListItemSource;
use crate::traits::Browser;

const SCROLL_SCRIPT: &str = "window.scrollBy(0, 10000); return true;";

const SETTLE_MIN_MS: u64 = 1200;
const SETTLE_MAX_MS: u64 = 2200;

/// Materialize a surface's list page for `query` and extract its items.
///
/// Scrolls in rounds, sleeping a jittered interval after each scroll,
/// and stops as soon as two consecutive stability measures are equal or
/// the surface's round cap is hit. Only the initial navigation is
/// fatal; scroll, measure and extraction faults degrade to whatever
/// items the page yields.
pub async fn harvest_list(
    browser: &dyn Browser,
    surface: &dyn ListItemSource,
    query: &str,
) -> Result<Vec<RawListItem>, PulseScoutError> {
    let url = surface.target_url(query);
    info!(url = url.as_str(), "Harvesting list");

    let page = browser
        .open_list(&url)
        .await
        .map_err(|e| PulseScoutError::Navigation(format!("list load failed for {url}: {e}")))?;

    if let Some(script) = surface.consent_script() {
        // Consent prompts come and go; a miss here means nothing.
        let _ = page.execute(script).await;
    }

    let mut previous: Option<u64> = None;
    for round in 0..surface.max_scroll_rounds() {
        let _ = page.execute(SCROLL_SCRIPT).await;
        sleep(settle_interval()).await;

        let measure = match page.execute(surface.measure_script()).await {
            Ok(value) => value.as_u64().unwrap_or(0),
            Err(e) => {
                warn!(round, error = %e, "Stability measure failed");
                0
            }
        };
        if previous == Some(measure) {
            debug!(round, measure, "List stable, stopping scroll");
            break;
        }
        previous = Some(measure);
    }

    let raw = page
        .execute(surface.items_script())
        .await
        .unwrap_or(Value::Null);
    let items: Vec<RawListItem> = raw
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| surface.parse_item(v)).collect())
        .unwrap_or_default();

    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close list page");
    }

    info!(count = items.len(), "Harvest complete");
    Ok(items)
}

fn settle_interval() -> Duration {
    let ms = rand::rng().random_range(SETTLE_MIN_MS..=SETTLE_MAX_MS);
    Duration::from_millis(ms)
}
