//! HTTP surface over the harvest pipelines.
//!
//! Thin by intent: handlers load config-derived options, run one
//! pipeline, and serialize the ranked result. Fatal pipeline errors map
//! to 502 since they mean the upstream browser endpoint failed us; an
//! empty result is a normal 200.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pulsescout_common::{Config, PulseScoutError};
use pulsescout_scout::browser::{default_capabilities, WebDriverBrowser};
use pulsescout_scout::pipeline::{social_pipeline, video_pipeline, PipelineOptions};
use pulsescout_scout::session::{SessionProvider, WebDriverLoginFlow};
use pulsescout_scout::surfaces::{ListItemSource, SocialSurface};
use webdriver_client::WebDriverClient;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let state = AppState {
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/crawl/videos", get(crawl_videos))
        .route("/crawl/social", get(crawl_social))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!(addr = addr.as_str(), "Listening");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct VideoParams {
    query: String,
}

async fn crawl_videos(
    State(state): State<AppState>,
    Query(params): Query<VideoParams>,
) -> Response {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("crawl_videos", %run_id, query = params.query.as_str());

    async move {
        let client = WebDriverClient::new(&state.config.webdriver_url);
        let browser = WebDriverBrowser::new(client);
        let options = PipelineOptions::from_config(&state.config);

        match video_pipeline(&browser, &params.query, &options).await {
            Ok(ranked) => Json(ranked).into_response(),
            Err(e) => upstream_failure(e),
        }
    }
    .instrument(span)
    .await
}

#[derive(Deserialize)]
struct SocialParams {
    niche: String,
}

async fn crawl_social(
    State(state): State<AppState>,
    Query(params): Query<SocialParams>,
) -> Response {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("crawl_social", %run_id, niche = params.niche.as_str());

    async move {
        let config = &state.config;
        let client = WebDriverClient::new(&config.webdriver_url);
        let mut browser = WebDriverBrowser::new(client);

        if SocialSurface.requires_session() {
            let login_client = WebDriverClient::new(&config.webdriver_url);
            let flow = WebDriverLoginFlow::new(login_client, default_capabilities());
            let provider = SessionProvider::new(&config.session_dir, Arc::new(flow));
            match provider.get_session(&config.credentials()).await {
                Ok(session) => browser = browser.with_session(session),
                Err(e) => return upstream_failure(e),
            }
        }

        let options = PipelineOptions::from_config(config);

        match social_pipeline(&browser, &params.niche, &options).await {
            Ok(ranked) => Json(ranked).into_response(),
            Err(e) => upstream_failure(e),
        }
    }
    .instrument(span)
    .await
}

fn upstream_failure(e: PulseScoutError) -> Response {
    error!(error = %e, "Pipeline failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}
