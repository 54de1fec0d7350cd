//! Reachability probe run before any browser is launched

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

const PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Poll `url` with GET until it answers without a server error.
///
/// Returns the number of attempts it took.
pub async fn wait_for_reachable(url: &str, timeout: Duration) -> E2eResult<usize> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while attempts == 0 || start.elapsed() < timeout {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("Storefront reachable at {} ({})", url, resp.status());
                return Ok(attempts);
            }
            Ok(resp) => {
                warn!("Storefront returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for storefront at {}...", url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Reachability check error: {}", e);
                }
            }
        }

        sleep(PROBE_INTERVAL).await;
    }

    Err(E2eError::SiteUnreachable {
        url: url.to_string(),
        attempts,
    })
}
