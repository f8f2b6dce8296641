pub mod error;

pub use error::{Result, WebDriverError};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// A browser cookie as exchanged over the WebDriver /cookie endpoints.
/// The full list of these is what gets persisted as a session artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a new browsing session. `capabilities` is the full W3C
    /// capabilities payload (browser name, headless args, etc.).
    pub async fn new_session(&self, capabilities: &Value) -> Result<Session> {
        let endpoint = format!("{}/session", self.base_url);
        let value = post_json(&self.client, &endpoint, capabilities).await?;

        let session_id = value
            .pointer("/value/sessionId")
            .or_else(|| value.pointer("/sessionId"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| WebDriverError::Malformed("missing sessionId".to_string()))?
            .to_string();

        debug!(session_id, "WebDriver session created");

        Ok(Session {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id,
        })
    }
}

/// One live WebDriver session. All commands target this session's
/// current window; the session is torn down with [`Session::delete`].
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl Session {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.session_id, path)
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        post_json(&self.client, &self.endpoint("url"), &json!({ "url": url })).await?;
        Ok(())
    }

    /// Run a synchronous script in the page and return its result value.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let body = json!({ "script": script, "args": args });
        let value = post_json(&self.client, &self.endpoint("execute/sync"), &body).await?;
        Ok(value.pointer("/value").cloned().unwrap_or(Value::Null))
    }

    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        let resp = self.client.get(self.endpoint("cookie")).send().await?;
        let value = check_response(resp).await?;
        let cookies = value.pointer("/value").cloned().unwrap_or(Value::Null);
        serde_json::from_value(cookies)
            .map_err(|e| WebDriverError::Malformed(format!("cookie list: {e}")))
    }

    pub async fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        post_json(
            &self.client,
            &self.endpoint("cookie"),
            &json!({ "cookie": cookie }),
        )
        .await?;
        Ok(())
    }

    /// Tear the session down. Consumes the session; the server-side
    /// browser and all its windows are released.
    pub async fn delete(self) -> Result<()> {
        let endpoint = format!("{}/session/{}", self.base_url, self.session_id);
        let resp = self.client.delete(endpoint).send().await?;
        check_response(resp).await?;
        debug!(session_id = self.session_id, "WebDriver session deleted");
        Ok(())
    }
}

async fn post_json(client: &reqwest::Client, endpoint: &str, body: &Value) -> Result<Value> {
    let resp = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;
    check_response(resp).await
}

/// Read a WebDriver response, surfacing HTTP failures as `Api` and
/// in-band `/value/error` payloads as `Protocol`.
async fn check_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        // Most drivers still wrap the error detail in /value even on 4xx/5xx.
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if let Some(err) = protocol_error(&value) {
                return Err(err);
            }
        }
        return Err(WebDriverError::Api {
            status: status.as_u16(),
            message: truncate(&body, 260),
        });
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| WebDriverError::Malformed(format!("{e}; body={}", truncate(&body, 220))))?;
    if let Some(err) = protocol_error(&value) {
        return Err(err);
    }
    Ok(value)
}

fn protocol_error(value: &Value) -> Option<WebDriverError> {
    let error = value.pointer("/value/error")?.as_str()?.to_string();
    let message = value
        .pointer("/value/message")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown webdriver error")
        .to_string();
    Some(WebDriverError::Protocol { error, message })
}

fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "..."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_extracted_from_value() {
        let body: Value = serde_json::json!({
            "value": { "error": "no such window", "message": "window was closed" }
        });
        match protocol_error(&body) {
            Some(WebDriverError::Protocol { error, message }) => {
                assert_eq!(error, "no such window");
                assert_eq!(message, "window was closed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn protocol_error_absent_for_success_payload() {
        let body: Value = serde_json::json!({ "value": { "sessionId": "abc" } });
        assert!(protocol_error(&body).is_none());
    }

    #[test]
    fn cookie_roundtrips_through_json() {
        let cookie = Cookie {
            name: "auth_token".to_string(),
            value: "tok123".to_string(),
            domain: Some(".example.com".to_string()),
            path: Some("/".to_string()),
            secure: Some(true),
            http_only: Some(true),
            expiry: Some(1_900_000_000),
        };
        let json = serde_json::to_value(&cookie).unwrap();
        assert_eq!(json["httpOnly"], Value::Bool(true));
        let back: Cookie = serde_json::from_value(json).unwrap();
        assert_eq!(back, cookie);
    }
}
