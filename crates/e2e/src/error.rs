//! Error types for the storefront E2E suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright bridge failed to start: {0}")]
    BridgeStartup(String),

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Locator {locator} failed: {reason}")]
    Locator { locator: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Order id label is missing or empty")]
    OrderIdMissing,

    #[error("Order {0} not found in order history")]
    OrderNotFound(String),

    #[error("Test data error: {0}")]
    TestData(String),

    #[error("Site {url} unreachable after {attempts} attempts")]
    SiteUnreachable { url: String, attempts: usize },

    #[error("Visual regression: {0}")]
    VisualRegression(String),

    #[error("Screenshot mismatch: {name} differs by {diff_percent:.2}% (threshold: {threshold:.2}%)")]
    ScreenshotMismatch {
        name: String,
        diff_percent: f64,
        threshold: f64,
    },

    #[error("Baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Screenshot decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl E2eError {
    /// Build an assertion failure with an expected/actual diff.
    pub fn mismatch(what: impl std::fmt::Display, expected: &str, actual: Option<&str>) -> Self {
        E2eError::AssertionFailed(format!(
            "{what}\n  expected: {expected:?}\n  received: {}",
            actual.map(|a| format!("{a:?}")).unwrap_or_else(|| "<none>".to_string())
        ))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
