//! WebDriver-backed [`Browser`] implementation.
//!
//! Every page gets its own WebDriver session rather than a tab in a
//! shared one: W3C commands always target a session's single current
//! window, so concurrent tab switching races. Isolation per page keeps
//! the enricher's parallelism safe; the configured cookies are what the
//! pages share.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;
use url::Url;

use webdriver_client::{Cookie, Session, WebDriverClient};

use crate::session::SessionState;
use crate::traits::{Browser, PageHandle};

pub fn default_capabilities() -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": [
                        "--headless=new",
                        "--no-sandbox",
                        "--disable-dev-shm-usage",
                        "--window-size=1280,2000"
                    ]
                }
            }
        }
    })
}

pub struct WebDriverBrowser {
    client: WebDriverClient,
    capabilities: Value,
    cookies: Vec<Cookie>,
}

impl WebDriverBrowser {
    pub fn new(client: WebDriverClient) -> Self {
        Self {
            client,
            capabilities: default_capabilities(),
            cookies: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Value) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Attach persisted session state; its cookies are installed into
    /// every page this browser opens.
    pub fn with_session(mut self, state: SessionState) -> Self {
        self.cookies = state.cookies;
        self
    }

    async fn open(&self, url: &str) -> Result<Box<dyn PageHandle>> {
        let session = self.client.new_session(&self.capabilities).await?;

        if !self.cookies.is_empty() {
            // Cookies can only be installed once a page on the target
            // origin is loaded.
            if let Some(origin) = origin_of(url) {
                session.navigate(&origin).await?;
                for cookie in &self.cookies {
                    if let Err(e) = session.add_cookie(cookie).await {
                        warn!(name = cookie.name.as_str(), error = %e, "Cookie rejected");
                    }
                }
            }
        }

        session.navigate(url).await?;
        Ok(Box::new(WebDriverPage { session }))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open_list(&self, url: &str) -> Result<Box<dyn PageHandle>> {
        self.open(url).await
    }

    async fn open_detail(&self, url: &str) -> Result<Box<dyn PageHandle>> {
        self.open(url).await
    }
}

struct WebDriverPage {
    session: Session,
}

#[async_trait]
impl PageHandle for WebDriverPage {
    async fn execute(&self, script: &str) -> Result<Value> {
        Ok(self.session.execute(script, Vec::new()).await?)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.session.delete().await?;
        Ok(())
    }
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{host}:{port}/", parsed.scheme())),
        None => Some(format!("{}://{host}/", parsed.scheme())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_strips_path_and_query() {
        assert_eq!(
            origin_of("https://twitter.com/a/status/1?x=1").as_deref(),
            Some("https://twitter.com/")
        );
        assert_eq!(
            origin_of("http://localhost:4444/wd/hub").as_deref(),
            Some("http://localhost:4444/")
        );
        assert!(origin_of("not a url").is_none());
    }
}
