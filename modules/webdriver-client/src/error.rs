use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebDriverError>;

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("WebDriver error {error}: {message}")]
    Protocol { error: String, message: String },

    #[error("Malformed WebDriver response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for WebDriverError {
    fn from(err: reqwest::Error) -> Self {
        WebDriverError::Network(err.to_string())
    }
}
