//! Authenticated session reuse.
//!
//! Interactive login is slow and rate-limited, so the cookies from a
//! successful login are persisted as a per-account JSON artifact and
//! reused on every later run. A missing artifact triggers exactly one
//! login; a present one skips login entirely.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::info;

use pulsescout_common::{Credentials, PulseScoutError};
use webdriver_client::{Cookie, Session, WebDriverClient};

use crate::traits::LoginFlow;

/// Persisted session state. Currently just cookies; the artifact is
/// versioned implicitly by its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Vec<Cookie>,
}

pub struct SessionProvider {
    dir: PathBuf,
    flow: Arc<dyn LoginFlow>,
}

impl SessionProvider {
    pub fn new(dir: impl Into<PathBuf>, flow: Arc<dyn LoginFlow>) -> Self {
        Self { dir: dir.into(), flow }
    }

    fn artifact_path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{username}.json"))
    }

    /// Return session state for the account, logging in only if no
    /// persisted artifact exists. Login failure is fatal: without a
    /// session the authenticated pipeline cannot produce anything.
    pub async fn get_session(&self, credentials: &Credentials) -> Result<SessionState, PulseScoutError> {
        let path = self.artifact_path(&credentials.username);
        if path.exists() {
            let state = load_artifact(&path)
                .map_err(|e| PulseScoutError::Session(format!("artifact unreadable: {e:#}")))?;
            info!(
                account = credentials.username.as_str(),
                "Reusing persisted session artifact"
            );
            return Ok(state);
        }

        info!(
            account = credentials.username.as_str(),
            "No session artifact found, logging in"
        );
        let cookies = self
            .flow
            .login(credentials)
            .await
            .map_err(|e| PulseScoutError::Session(format!("login failed: {e:#}")))?;
        let state = SessionState { cookies };

        store_artifact(&self.dir, &path, &state)
            .map_err(|e| PulseScoutError::Session(format!("artifact write failed: {e:#}")))?;
        info!(
            account = credentials.username.as_str(),
            path = %path.display(),
            "Session artifact persisted"
        );
        Ok(state)
    }
}

fn load_artifact(path: &Path) -> Result<SessionState> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn store_artifact(dir: &Path, path: &Path, state: &SessionState) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let raw = serde_json::to_string_pretty(state).context("serialize session state")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// WebDriver-backed login flow
// ---------------------------------------------------------------------------

const LOGIN_URL: &str = "https://twitter.com/i/flow/login";

const SELECTOR_PRESENT_SCRIPT: &str =
    "return !!document.querySelector(arguments[0]);";

/// Sets the field through the native value setter so the page's own
/// change tracking sees the input, then submits the enclosing form.
const FILL_AND_SUBMIT_SCRIPT: &str = r#"
    const el = document.querySelector(arguments[0]);
    if (!el) return false;
    const setter = Object.getOwnPropertyDescriptor(
        window.HTMLInputElement.prototype, 'value').set;
    setter.call(el, arguments[1]);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    const form = el.closest('form');
    if (form && form.requestSubmit) form.requestSubmit();
    return true;
"#;

const USERNAME_SELECTOR: &str = "input[autocomplete=\"username\"]";
const PASSWORD_SELECTOR: &str = "input[name=\"password\"]";

const FIELD_WAIT: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives the interactive login form through a throwaway WebDriver
/// session and returns the cookies it produced.
pub struct WebDriverLoginFlow {
    client: WebDriverClient,
    capabilities: Value,
}

impl WebDriverLoginFlow {
    pub fn new(client: WebDriverClient, capabilities: Value) -> Self {
        Self { client, capabilities }
    }

    async fn drive_login(&self, session: &Session, credentials: &Credentials) -> Result<()> {
        session.navigate(LOGIN_URL).await?;

        wait_for_selector(session, USERNAME_SELECTOR).await?;
        fill_and_submit(session, USERNAME_SELECTOR, &credentials.username).await?;

        wait_for_selector(session, PASSWORD_SELECTOR).await?;
        fill_and_submit(session, PASSWORD_SELECTOR, &credentials.secret).await?;

        // Let the post-login redirects land before reading cookies.
        sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LoginFlow for WebDriverLoginFlow {
    async fn login(&self, credentials: &Credentials) -> Result<Vec<Cookie>> {
        let session = self.client.new_session(&self.capabilities).await?;

        let outcome = self.drive_login(&session, credentials).await;
        let cookies = match outcome {
            Ok(()) => session.cookies().await.map_err(Into::into),
            Err(e) => Err(e),
        };

        // The login session is throwaway either way; only its cookies
        // survive.
        let _ = session.delete().await;
        cookies
    }
}

async fn wait_for_selector(session: &Session, selector: &str) -> Result<()> {
    let deadline = tokio::time::Instant::now() + FIELD_WAIT;
    loop {
        let present = session
            .execute(SELECTOR_PRESENT_SCRIPT, vec![json!(selector)])
            .await?;
        if present.as_bool() == Some(true) {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("timed out waiting for {selector}");
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn fill_and_submit(session: &Session, selector: &str, value: &str) -> Result<()> {
    let filled = session
        .execute(FILL_AND_SUBMIT_SCRIPT, vec![json!(selector), json!(value)])
        .await?;
    if filled.as_bool() != Some(true) {
        bail!("{selector} disappeared before it could be filled");
    }
    Ok(())
}
