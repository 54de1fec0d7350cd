//! Web-first assertions
//!
//! Assertions retry until the condition holds or the timeout elapses, the
//! same way Playwright's `expect` does, then fail with a diff-style message.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, WaitState};
use crate::page::BrowserPage;

/// Retry budget for one assertion.
#[derive(Debug, Clone, Copy)]
pub struct Expect {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Default for Expect {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll: Duration::from_millis(100),
        }
    }
}

impl Expect {
    /// Assert the element becomes visible.
    pub async fn visible(&self, page: &dyn BrowserPage, locator: &Locator) -> E2eResult<()> {
        match page.wait_for(locator, WaitState::Visible, self.timeout).await {
            Ok(()) => Ok(()),
            Err(E2eError::Timeout(reason)) | Err(E2eError::Locator { reason, .. }) => {
                Err(E2eError::AssertionFailed(format!(
                    "expected {locator} to be visible within {:?}: {reason}",
                    self.timeout
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Assert the element's text eventually contains `expected`.
    pub async fn contains_text(&self, page: &dyn BrowserPage, locator: &Locator, expected: &str) -> E2eResult<()> {
        self.poll_text(page, locator, expected, |actual| actual.contains(expected))
            .await
    }

    /// Assert the element's text eventually equals `expected`.
    pub async fn text_eq(&self, page: &dyn BrowserPage, locator: &Locator, expected: &str) -> E2eResult<()> {
        self.poll_text(page, locator, expected, |actual| actual == expected)
            .await
    }

    async fn poll_text(
        &self,
        page: &dyn BrowserPage,
        locator: &Locator,
        expected: &str,
        accept: impl Fn(&str) -> bool + Send,
    ) -> E2eResult<()> {
        let deadline = Instant::now() + self.timeout;

        if let Err(e) = page.wait_for(locator, WaitState::Attached, self.timeout).await {
            debug!("{} never attached: {}", locator, e);
            return Err(E2eError::mismatch(locator, expected, None));
        }

        let mut last = None;
        loop {
            last = page.text_content(locator).await?.or(last);
            if last.as_deref().map(&accept).unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::mismatch(locator, expected, last.as_deref()));
            }
            sleep(self.poll).await;
        }
    }
}
