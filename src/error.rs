//! Error taxonomy for arena generation

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Set once the first missing-anchor failure has been logged.
static MISSING_ANCHOR_REPORTED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Error)]
pub enum ArenaError {
    /// Rejected before any generation work starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("arena is missing required anchor `{name}`")]
    MissingAnchor { name: String },
    #[error("terrain is not ready (stage: {0})")]
    NotReady(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image export error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ArenaError>;

impl ArenaError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Build a `MissingAnchor` error, logging it only the first time any arena in
/// this process hits one.
pub fn missing_anchor(name: &str, available: &[String]) -> ArenaError {
    if !MISSING_ANCHOR_REPORTED.swap(true, Ordering::SeqCst) {
        log::error!(
            "Arena is missing required anchor `{}` (available anchors: [{}])",
            name,
            available.join(", ")
        );
    }
    ArenaError::MissingAnchor {
        name: name.to_string(),
    }
}
