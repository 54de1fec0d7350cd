//! The browser page seam
//!
//! Page objects only talk to the browser through [`BrowserPage`]. The
//! Playwright bridge implements it for real runs; tests plug in an
//! in-memory storefront.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::locator::{LoadState, Locator, WaitState};

/// One browser tab bound to a single scenario run.
///
/// Action methods expect the locator to resolve to exactly one element and
/// fail otherwise. `count` never waits.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to an absolute URL.
    async fn goto(&self, url: &str) -> E2eResult<()>;

    /// Wait until the page reports the given load state.
    async fn wait_for_load_state(&self, state: LoadState) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    /// Replace the value of an input.
    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Type `text` one key at a time, pausing `delay` between keys.
    async fn press_sequentially(&self, locator: &Locator, text: &str, delay: Duration) -> E2eResult<()>;

    /// `textContent` of the element, `None` when it has no text node.
    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Number of elements currently matching.
    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    /// Wait until the element reaches `state`, failing with a timeout.
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;
}
