//! Step checkpoints
//!
//! After every scenario step the step runner hands the page to a
//! [`StepObserver`]. Observation never changes the outcome of the step:
//! capture failures are logged and the scenario carries on.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::BrowserPage;
use crate::visual::{VisualDiff, VisualTester};

/// A named artifact attached to the scenario report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualDiff>,
}

impl Attachment {
    pub fn is_visual_regression(&self) -> bool {
        self.visual.as_ref().map(|v| !v.matches).unwrap_or(false)
    }
}

#[async_trait]
pub trait StepObserver: Send + Sync {
    /// Record checkpoint `name` for the current page state.
    async fn checkpoint(&self, name: &str, page: &dyn BrowserPage) -> E2eResult<Attachment>;
}

/// Observer that records nothing.
pub struct NoopObserver;

#[async_trait]
impl StepObserver for NoopObserver {
    async fn checkpoint(&self, name: &str, _page: &dyn BrowserPage) -> E2eResult<Attachment> {
        Ok(Attachment {
            name: name.to_string(),
            content_type: "image/png".to_string(),
            path: None,
            visual: None,
        })
    }
}

/// Writes `<dir>/<checkpoint>.png` for every checkpoint and optionally
/// compares it with a visual baseline.
pub struct ScreenshotRecorder {
    dir: PathBuf,
    baseline_prefix: String,
    visual: Option<Arc<VisualTester>>,
}

impl ScreenshotRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> E2eResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            baseline_prefix: String::new(),
            visual: None,
        })
    }

    /// Compare every capture with the baseline stored under
    /// `<prefix>/<checkpoint>`.
    pub fn with_visual(mut self, prefix: impl Into<String>, visual: Arc<VisualTester>) -> Self {
        self.baseline_prefix = prefix.into();
        self.visual = Some(visual);
        self
    }
}

#[async_trait]
impl StepObserver for ScreenshotRecorder {
    async fn checkpoint(&self, name: &str, page: &dyn BrowserPage) -> E2eResult<Attachment> {
        let png = page.screenshot().await?;
        let path = self.dir.join(format!("{name}.png"));
        tokio::fs::write(&path, &png).await?;
        debug!("Checkpoint {} -> {}", name, path.display());

        let visual = match &self.visual {
            Some(tester) => {
                let key = format!("{}/{}", self.baseline_prefix, name);
                match tester.compare(&key, &png) {
                    Ok(diff) => Some(diff),
                    Err(E2eError::BaselineNotFound(_)) => {
                        info!("No baseline for '{}' - run with --update-baselines to create it", key);
                        None
                    }
                    Err(e) => {
                        warn!("Visual comparison of '{}' failed: {}", key, e);
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Attachment {
            name: name.to_string(),
            content_type: "image/png".to_string(),
            path: Some(path),
            visual,
        })
    }
}
