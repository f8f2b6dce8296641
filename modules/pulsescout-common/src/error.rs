use thiserror::Error;

/// Fatal pipeline errors. Per-item faults (missing elements, detail
/// navigation timeouts, unparseable counts or dates) never reach this
/// type; they degrade the single record to a default or drop it.
#[derive(Error, Debug)]
pub enum PulseScoutError {
    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
