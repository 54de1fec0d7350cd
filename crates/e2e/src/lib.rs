//! Storefront E2E Test Suite
//!
//! Page objects and end-to-end scenarios for the storefront web client:
//! - Drives a real browser through a long-lived Playwright bridge process
//! - Exposes the storefront as typed page-object capabilities
//! - Runs the checkout, find-order and delete-order scenarios
//! - Captures a screenshot checkpoint after every step, with optional
//!   visual regression against baselines
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── preflight() -> storefront reachable?                 │
//! │    ├── run_scenario(Scenario) -> ScenarioResult             │
//! │    │     ├── PlaywrightSession::launch() (fresh browser)    │
//! │    │     ├── StoreClient<P: BrowserPage>                    │
//! │    │     │     ├── BaseActions     (login, order id, ...)   │
//! │    │     │     └── ShoppingActions (cart, checkout, orders) │
//! │    │     └── StepObserver -> ScreenshotRecorder             │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Node bridge (JSON lines over stdio)                        │
//! │    {"id":1,"op":"click","locator":[...]} -> {"id":1,"ok":..}│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod checkpoint;
pub mod error;
pub mod expect;
pub mod locator;
pub mod order;
pub mod page;
pub mod pages;
pub mod playwright;
pub mod preflight;
pub mod runner;
pub mod scenario;
pub mod testdata;
pub mod visual;

pub use checkpoint::{NoopObserver, ScreenshotRecorder, StepObserver};
pub use error::{E2eError, E2eResult};
pub use locator::Locator;
pub use order::{DeleteOutcome, OrderId, OrderRow};
pub use page::BrowserPage;
pub use pages::{BaseActions, ShoppingActions, StoreClient, Timeouts};
pub use runner::{RunnerConfig, TestRunner};
pub use scenario::Scenario;
pub use testdata::TestData;
