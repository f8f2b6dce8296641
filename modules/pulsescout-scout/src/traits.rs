//! Trait seams between the pipeline and the outside world.
//!
//! The harvester and enricher only ever talk to these traits, so the
//! whole pipeline runs against in-memory mocks in tests and against a
//! real WebDriver endpoint in production.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use pulsescout_common::Credentials;
use webdriver_client::Cookie;

/// Opens pages. List pages share the configured session state; detail
/// pages each get an isolated browsing context so concurrent
/// enrichments never observe each other's DOM.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open_list(&self, url: &str) -> Result<Box<dyn PageHandle>>;
    async fn open_detail(&self, url: &str) -> Result<Box<dyn PageHandle>>;
}

/// A single open page. `close` consumes the handle so a page cannot be
/// used after release.
#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn execute(&self, script: &str) -> Result<Value>;
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Performs an interactive login and hands back the resulting cookies.
/// Only the session provider calls this, and only when no persisted
/// artifact exists for the account.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Vec<Cookie>>;
}
