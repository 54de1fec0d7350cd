//! Storefront E2E runner
//!
//! Run with: cargo run --package storefront-e2e -- --data testdata/testdata.json

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use storefront_e2e::playwright::{Browser, PlaywrightConfig};
use storefront_e2e::visual::VisualConfig;
use storefront_e2e::{E2eResult, RunnerConfig, Scenario, TestData, TestRunner, Timeouts};

#[derive(Parser, Debug)]
#[command(name = "storefront-e2e")]
#[command(about = "E2E scenarios for the storefront web client")]
struct Args {
    /// Test data file (JSON or YAML)
    #[arg(short, long, default_value = "crates/e2e/testdata/testdata.json")]
    data: PathBuf,

    /// Run only these scenarios (repeatable); all scenarios by default
    #[arg(short, long, value_enum)]
    scenario: Vec<Scenario>,

    /// Browser to use
    #[arg(long, value_enum, default_value_t = Browser::Chromium)]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Upper bound for each browser action, in seconds
    #[arg(long, default_value = "30")]
    action_timeout: u64,

    /// Output directory for screenshots and results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Compare checkpoints against visual baselines
    #[arg(long)]
    visual: bool,

    /// Promote this run's screenshots to visual baselines
    #[arg(long)]
    update_baselines: bool,

    /// Visual diff threshold (percentage)
    #[arg(long, default_value = "0.5")]
    visual_threshold: f64,

    /// Do not probe the storefront before launching browsers
    #[arg(long)]
    skip_preflight: bool,

    /// Node.js executable used for the Playwright bridge
    #[arg(long, default_value = "node")]
    node: PathBuf,

    /// Directory whose node_modules provides playwright
    #[arg(long, default_value = ".")]
    node_dir: PathBuf,

    /// Login email, overriding the data file
    #[arg(long, env = "STOREFRONT_E2E_EMAIL")]
    email: Option<String>,

    /// Login password, overriding the data file
    #[arg(long, env = "STOREFRONT_E2E_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let data = TestData::from_file(&args.data)?.with_credentials(args.email, args.password);
    info!("Loaded test data from {}", args.data.display());

    let visual = (args.visual || args.update_baselines).then(|| VisualConfig {
        baseline_dir: args.output.join("baselines"),
        diff_dir: args.output.join("diffs"),
        threshold: args.visual_threshold,
        auto_update: args.update_baselines,
    });

    let config = RunnerConfig {
        playwright: PlaywrightConfig {
            node_binary: args.node,
            working_dir: args.node_dir,
            browser: args.browser,
            headless: !args.headed,
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
            ..Default::default()
        },
        timeouts: Timeouts {
            action: Duration::from_secs(args.action_timeout),
            ..Default::default()
        },
        visual,
        preflight_timeout: (!args.skip_preflight).then(|| Duration::from_secs(30)),
        output_dir: args.output,
    };

    let runner = TestRunner::new(config, data)?;

    let results = if args.scenario.is_empty() {
        runner.run_all().await?
    } else {
        runner.run_scenarios(&args.scenario).await?
    };

    if args.update_baselines {
        let promoted = runner.update_baselines()?;
        info!("Updated {} baseline(s)", promoted);
    }

    runner.write_results(&results)?;

    Ok(results.all_passed())
}
