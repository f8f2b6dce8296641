//! In-memory mocks for the pipeline's trait seams.
//!
//! `MockBrowser` maps URLs to scripted pages; `MockPage` answers
//! `execute` calls by substring-matching the script against registered
//! rules. A rule with multiple responses yields them in order and then
//! repeats the last one, which is how scroll-stability sequences are
//! expressed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use pulsescout_common::Credentials;
use webdriver_client::Cookie;

use crate::traits::{Browser, LoginFlow, PageHandle};

// ---------------------------------------------------------------------------
// Scripted pages
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct PageScript {
    rules: Vec<(String, Vec<Value>)>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any script containing `pattern` with `response`, forever.
    pub fn on(mut self, pattern: &str, response: Value) -> Self {
        self.rules.push((pattern.to_string(), vec![response]));
        self
    }

    /// Answer successive matching calls with successive responses; the
    /// last response repeats once the sequence is exhausted.
    pub fn on_sequence(mut self, pattern: &str, responses: Vec<Value>) -> Self {
        self.rules.push((pattern.to_string(), responses));
        self
    }

    fn spawn(&self) -> Arc<MockPageState> {
        Arc::new(MockPageState {
            rules: Mutex::new(self.rules.clone()),
            hits: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }
}

pub struct MockPageState {
    rules: Mutex<Vec<(String, Vec<Value>)>>,
    hits: Mutex<HashMap<String, usize>>,
    closed: AtomicBool,
}

impl MockPageState {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// How many `execute` calls matched `pattern`.
    pub fn hits(&self, pattern: &str) -> usize {
        *self.hits.lock().unwrap().get(pattern).unwrap_or(&0)
    }
}

struct MockPage {
    state: Arc<MockPageState>,
}

#[async_trait]
impl PageHandle for MockPage {
    async fn execute(&self, script: &str) -> Result<Value> {
        let mut rules = self.state.rules.lock().unwrap();
        for (pattern, responses) in rules.iter_mut() {
            if script.contains(pattern.as_str()) {
                *self
                    .state
                    .hits
                    .lock()
                    .unwrap()
                    .entry(pattern.clone())
                    .or_insert(0) += 1;
                let response = if responses.len() > 1 {
                    responses.remove(0)
                } else {
                    responses.first().cloned().unwrap_or(Value::Null)
                };
                return Ok(response);
            }
        }
        Ok(Value::Null)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum DetailBehavior {
    Page(PageScript),
    Unavailable,
    /// Never completes within any sane timeout.
    Hang,
}

#[derive(Default)]
pub struct MockBrowser {
    list_pages: Mutex<HashMap<String, PageScript>>,
    detail_pages: Mutex<HashMap<String, DetailBehavior>>,
    spawned: Mutex<Vec<Arc<MockPageState>>>,
    details_opened: AtomicUsize,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_list(self, url: &str, script: PageScript) -> Self {
        self.list_pages.lock().unwrap().insert(url.to_string(), script);
        self
    }

    pub fn on_detail(self, url: &str, script: PageScript) -> Self {
        self.detail_pages
            .lock()
            .unwrap()
            .insert(url.to_string(), DetailBehavior::Page(script));
        self
    }

    pub fn detail_unavailable(self, url: &str) -> Self {
        self.detail_pages
            .lock()
            .unwrap()
            .insert(url.to_string(), DetailBehavior::Unavailable);
        self
    }

    pub fn detail_hangs(self, url: &str) -> Self {
        self.detail_pages
            .lock()
            .unwrap()
            .insert(url.to_string(), DetailBehavior::Hang);
        self
    }

    pub fn details_opened(&self) -> usize {
        self.details_opened.load(Ordering::SeqCst)
    }

    /// True when every page this browser handed out has been closed.
    pub fn all_pages_closed(&self) -> bool {
        self.spawned.lock().unwrap().iter().all(|p| p.closed())
    }

    /// Total `execute` calls matching `pattern` across all pages.
    pub fn script_hits(&self, pattern: &str) -> usize {
        self.spawned
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.hits(pattern))
            .sum()
    }

    fn track(&self, state: Arc<MockPageState>) -> Box<dyn PageHandle> {
        self.spawned.lock().unwrap().push(state.clone());
        Box::new(MockPage { state })
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open_list(&self, url: &str) -> Result<Box<dyn PageHandle>> {
        let script = self
            .list_pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no list page registered for {url}"))?;
        Ok(self.track(script.spawn()))
    }

    async fn open_detail(&self, url: &str) -> Result<Box<dyn PageHandle>> {
        let behavior = self.detail_pages.lock().unwrap().get(url).cloned();
        match behavior {
            Some(DetailBehavior::Page(script)) => {
                self.details_opened.fetch_add(1, Ordering::SeqCst);
                Ok(self.track(script.spawn()))
            }
            Some(DetailBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                bail!("hung page for {url} finally gave up")
            }
            Some(DetailBehavior::Unavailable) | None => {
                bail!("detail page unavailable: {url}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Login flow
// ---------------------------------------------------------------------------

/// Hands out fixed cookies and counts how often it is asked.
pub struct CountingLoginFlow {
    cookies: Vec<Cookie>,
    calls: AtomicUsize,
    failing: bool,
}

impl CountingLoginFlow {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies,
            calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            cookies: Vec::new(),
            calls: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginFlow for CountingLoginFlow {
    async fn login(&self, _credentials: &Credentials) -> Result<Vec<Cookie>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            bail!("login rejected");
        }
        Ok(self.cookies.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn auth_cookie() -> Cookie {
    Cookie {
        name: "auth_token".to_string(),
        value: "tok-fixture".to_string(),
        domain: Some(".twitter.com".to_string()),
        path: Some("/".to_string()),
        secure: Some(true),
        http_only: Some(true),
        expiry: None,
    }
}

/// Raw video tile as the video items script would return it.
pub fn video_tile(title: &str, href: &str, views: &str, uploaded: &str) -> Value {
    json!({ "title": title, "href": href, "views": views, "uploaded": uploaded })
}

/// Raw social post as the social items script would return it.
pub fn social_post(text: &str, href: &str, views: &str, likes: &str) -> Value {
    json!({
        "text": text,
        "href": href,
        "replies": "5",
        "reposts": "2",
        "retweet_fallback": "2",
        "likes": likes,
        "views": views,
    })
}
