//! Suite runner: one fresh browser session per scenario, aggregated report

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::checkpoint::{Attachment, ScreenshotRecorder, StepObserver};
use crate::error::{E2eError, E2eResult};
use crate::page::BrowserPage;
use crate::pages::{StoreClient, Timeouts};
use crate::playwright::{PlaywrightConfig, PlaywrightSession};
use crate::preflight;
use crate::scenario::{Scenario, ScenarioContext, StepResult};
use crate::testdata::TestData;
use crate::visual::{VisualConfig, VisualTester};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub attachments: Vec<Attachment>,
    pub order_id: Option<String>,
    pub error: Option<String>,
}

impl ScenarioResult {
    fn aborted(scenario: Scenario, duration_ms: u64, error: &E2eError) -> Self {
        Self {
            scenario,
            name: scenario.name().to_string(),
            success: false,
            duration_ms,
            steps: vec![],
            attachments: vec![],
            order_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Result of running the suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl TestSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    pub timeouts: Timeouts,
    /// Visual regression is off unless configured
    pub visual: Option<VisualConfig>,
    /// How long to wait for the storefront to answer before launching browsers
    pub preflight_timeout: Option<Duration>,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            timeouts: Timeouts::default(),
            visual: None,
            preflight_timeout: Some(Duration::from_secs(30)),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs scenarios in order, each in its own browser session.
pub struct TestRunner {
    config: RunnerConfig,
    data: TestData,
    visual: Option<Arc<VisualTester>>,
}

impl TestRunner {
    pub fn new(config: RunnerConfig, data: TestData) -> E2eResult<Self> {
        let visual = match &config.visual {
            Some(visual_config) => Some(Arc::new(VisualTester::new(visual_config.clone())?)),
            None => None,
        };
        Ok(Self { config, data, visual })
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.config.output_dir.join("screenshots")
    }

    /// Wait for the storefront to answer, if a preflight timeout is set.
    pub async fn preflight(&self) -> E2eResult<()> {
        match self.config.preflight_timeout {
            Some(timeout) => {
                preflight::wait_for_reachable(&self.data.application_url, timeout).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        self.run_scenarios(&Scenario::all()).await
    }

    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.preflight().await?;
        info!("Running {} scenario(s)...", scenarios.len());

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let result = self.run_scenario(*scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Test Results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        Ok(TestSuiteResult {
            started_at,
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Launch a fresh Playwright session, run `scenario`, close the session.
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name());

        let mut playwright = self.config.playwright.clone();
        playwright.action_timeout = self.config.timeouts.action;

        let session = match PlaywrightSession::launch(playwright).await {
            Ok(session) => session,
            Err(e) => return ScenarioResult::aborted(scenario, start.elapsed().as_millis() as u64, &e),
        };

        let client = StoreClient::with_timeouts(session, self.config.timeouts);
        let result = match self.observer_for(scenario) {
            Ok(observer) => self.execute(scenario, &client, &observer).await,
            Err(e) => ScenarioResult::aborted(scenario, start.elapsed().as_millis() as u64, &e),
        };

        if let Err(e) = client.into_page().close().await {
            warn!("Browser session for '{}' did not close cleanly: {}", scenario.name(), e);
        }

        result
    }

    /// Screenshot recorder writing under `<output>/screenshots/<scenario>`,
    /// wired to visual regression when configured.
    pub fn observer_for(&self, scenario: Scenario) -> E2eResult<ScreenshotRecorder> {
        let recorder = ScreenshotRecorder::new(self.screenshots_dir().join(scenario.slug()))?;
        Ok(match &self.visual {
            Some(visual) => recorder.with_visual(scenario.slug(), Arc::clone(visual)),
            None => recorder,
        })
    }

    /// Run `scenario` against an already-open client.
    pub async fn execute<P: BrowserPage>(
        &self,
        scenario: Scenario,
        client: &StoreClient<P>,
        observer: &dyn StepObserver,
    ) -> ScenarioResult {
        let start = Instant::now();
        let mut ctx = ScenarioContext::new(client.page(), observer);
        let outcome = scenario.run(client, &self.data, &mut ctx).await;
        let (steps, attachments, order_id) = ctx.into_parts();

        let error = match outcome {
            Err(e) => Some(e.to_string()),
            Ok(()) if self.refreshing_baselines() => {
                let stale = attachments.iter().filter(|a| a.is_visual_regression()).count();
                if stale > 0 {
                    info!("{} baseline(s) of '{}' differ and will be replaced", stale, scenario.name());
                }
                None
            }
            Ok(()) => attachments
                .iter()
                .find(|a| a.is_visual_regression())
                .and_then(|a| {
                    a.visual.as_ref().map(|v| {
                        E2eError::ScreenshotMismatch {
                            name: a.name.clone(),
                            diff_percent: v.diff_percent,
                            threshold: self.visual.as_ref().map(|t| t.threshold()).unwrap_or_default(),
                        }
                        .to_string()
                    })
                }),
        };

        ScenarioResult {
            scenario,
            name: scenario.name().to_string(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            attachments,
            order_id: order_id.map(|id| id.to_string()),
            error,
        }
    }

    fn refreshing_baselines(&self) -> bool {
        self.visual.as_ref().map(|v| v.auto_update()).unwrap_or(false)
    }

    /// Promote the screenshots of the last run to visual baselines.
    pub fn update_baselines(&self) -> E2eResult<usize> {
        match &self.visual {
            Some(visual) => visual.update_baselines(&self.screenshots_dir()),
            None => Err(E2eError::VisualRegression(
                "visual regression is not configured".to_string(),
            )),
        }
    }

    /// Write the suite report as JSON
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
