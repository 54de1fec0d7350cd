//! Scenarios against a real storefront through Playwright.
//!
//! Needs Node.js with `playwright` installed and the browsers downloaded.
//! Run with:
//! STOREFRONT_E2E_DATA=testdata/testdata.json STOREFRONT_E2E_EMAIL=.. STOREFRONT_E2E_PASSWORD=.. \
//!     cargo test --package storefront-e2e --test live_checkout -- --ignored

use std::path::PathBuf;

use storefront_e2e::{RunnerConfig, TestData, TestRunner};

fn live_runner() -> Option<TestRunner> {
    let path = PathBuf::from(std::env::var("STOREFRONT_E2E_DATA").ok()?);
    let data = TestData::from_file(&path).unwrap().with_credentials(
        std::env::var("STOREFRONT_E2E_EMAIL").ok(),
        std::env::var("STOREFRONT_E2E_PASSWORD").ok(),
    );
    let output = tempfile::tempdir().unwrap().into_path();
    let config = RunnerConfig {
        output_dir: output,
        ..Default::default()
    };
    Some(TestRunner::new(config, data).unwrap())
}

#[tokio::test]
#[ignore]
async fn test_live_suite() {
    let Some(runner) = live_runner() else {
        eprintln!("STOREFRONT_E2E_DATA not set, skipping");
        return;
    };

    let results = runner.run_all().await.unwrap();
    runner.write_results(&results).unwrap();

    for result in &results.results {
        assert!(result.success, "{}: {:?}", result.name, result.error);
    }
}
