//! Session-scoped storefront client

use std::time::Duration;

use crate::expect::Expect;
use crate::page::BrowserPage;

/// Timing knobs shared by every page-object action.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Upper bound for waits the page objects issue themselves.
    pub action: Duration,
    /// Retry budget of visibility/text assertions.
    pub expect: Duration,
    /// Interval between assertion retries.
    pub poll: Duration,
    /// Pause between keystrokes when typing into typeahead inputs.
    pub typing_delay: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action: Duration::from_secs(30),
            expect: Duration::from_secs(5),
            poll: Duration::from_millis(100),
            typing_delay: Duration::from_millis(50),
        }
    }
}

/// Storefront client bound to one browser page.
///
/// Exposes the base and shopping capabilities through
/// [`BaseActions`](super::BaseActions) and
/// [`ShoppingActions`](super::ShoppingActions).
pub struct StoreClient<P> {
    page: P,
    timeouts: Timeouts,
}

impl<P: BrowserPage> StoreClient<P> {
    pub fn new(page: P) -> Self {
        Self::with_timeouts(page, Timeouts::default())
    }

    pub fn with_timeouts(page: P, timeouts: Timeouts) -> Self {
        Self { page, timeouts }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn into_page(self) -> P {
        self.page
    }

    pub(crate) fn expect(&self) -> Expect {
        Expect {
            timeout: self.timeouts.expect,
            poll: self.timeouts.poll,
        }
    }
}
