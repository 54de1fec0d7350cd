//! Playwright browser automation
//!
//! A [`PlaywrightSession`] owns one Node.js bridge process. The bridge
//! launches a browser with a fresh context and then serves JSON-lines
//! commands on stdin, one at a time, answering each on stdout:
//!
//! ```text
//! -> {"id":3,"op":"click","locator":[{"kind":"css","selector":"#userEmail"}]}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"kind":"timeout","error":"locator.click: Timeout 30000ms exceeded."}
//! ```

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::{LoadState, Locator, WaitState};
use crate::page::BrowserPage;

/// Extra time granted on top of Playwright's own timeouts before the Rust
/// side gives up on a reply.
const REPLY_GRACE: Duration = Duration::from_secs(10);

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

const BRIDGE_SCRIPT: &str = r##"'use strict';
const path = require('path');
const readline = require('readline');
const { createRequire } = require('module');

function write(msg) {
  process.stdout.write(JSON.stringify(msg) + '\n');
}

let playwright;
try {
  playwright = createRequire(path.join(process.cwd(), 'bridge.js'))('playwright');
} catch (err) {
  try {
    playwright = require('playwright');
  } catch (_) {
    write({ ready: false, code: err.code || 'MODULE_NOT_FOUND', error: err.message });
    process.exit(3);
  }
}

const config = JSON.parse(process.env.STOREFRONT_BRIDGE_CONFIG || '{}');

function build(root, segments) {
  let cur = root;
  for (const s of segments) {
    switch (s.kind) {
      case 'css': cur = cur.locator(s.selector); break;
      case 'xpath': cur = cur.locator('xpath=' + s.expression); break;
      case 'role': cur = cur.getByRole(s.role, s.name == null ? {} : { name: s.name }); break;
      case 'text': cur = cur.getByText(s.text, { exact: s.exact }); break;
      case 'has_text': cur = cur.filter({ hasText: s.text }); break;
      case 'has_pattern': cur = cur.filter({ hasText: new RegExp(s.pattern) }); break;
      case 'has': cur = cur.filter({ has: build(page, s.inner) }); break;
      case 'nth': cur = cur.nth(s.index); break;
      default: throw new Error('unknown locator segment ' + s.kind);
    }
  }
  return cur;
}

function classify(op, err) {
  if (op === 'goto' || op === 'wait_for_load_state') return 'navigation';
  if (err && err.name === 'TimeoutError') return 'timeout';
  return 'locator';
}

let browser;
let page;

(async () => {
  try {
    browser = await playwright[config.browser].launch({ headless: config.headless });
    const context = await browser.newContext({ viewport: { width: config.width, height: config.height } });
    page = await context.newPage();
    page.setDefaultTimeout(config.actionTimeoutMs);
    page.setDefaultNavigationTimeout(config.navigationTimeoutMs);
  } catch (err) {
    write({ ready: false, code: 'LAUNCH_FAILED', error: err.message });
    process.exit(4);
  }

  const handlers = {
    goto: (c) => page.goto(c.url),
    wait_for_load_state: (c) => page.waitForLoadState(c.state),
    click: (c) => build(page, c.locator).click(),
    fill: (c) => build(page, c.locator).fill(c.value),
    press_sequentially: (c) => build(page, c.locator).pressSequentially(c.text, { delay: c.delay_ms }),
    text_content: (c) => build(page, c.locator).textContent(),
    count: (c) => build(page, c.locator).count(),
    wait_for: (c) => build(page, c.locator).waitFor({ state: c.state, timeout: c.timeout_ms }),
    screenshot: async (c) => (await page.screenshot({ fullPage: c.full_page })).toString('base64'),
  };

  let queue = Promise.resolve();
  const rl = readline.createInterface({ input: process.stdin });
  rl.on('line', (line) => {
    queue = queue.then(async () => {
      let cmd;
      try {
        cmd = JSON.parse(line);
      } catch (err) {
        write({ id: null, ok: false, kind: 'protocol', error: err.message });
        return;
      }
      if (cmd.op === 'close') {
        await browser.close().catch(() => {});
        write({ id: cmd.id, ok: true, value: null });
        process.exit(0);
      }
      const handler = handlers[cmd.op];
      if (!handler) {
        write({ id: cmd.id, ok: false, kind: 'protocol', error: 'unknown op ' + cmd.op });
        return;
      }
      try {
        const value = await handler(cmd);
        write({ id: cmd.id, ok: true, value: value === undefined || cmd.op === 'goto' ? null : value });
      } catch (err) {
        write({ id: cmd.id, ok: false, kind: classify(cmd.op, err), error: err.message });
      }
    });
  });
  rl.on('close', () => {
    queue.then(() => browser.close()).catch(() => {}).then(() => process.exit(0));
  });

  write({ ready: true });
})();
"##;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Node.js executable
    pub node_binary: PathBuf,
    /// Directory whose `node_modules` provides the `playwright` package
    pub working_dir: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Playwright's default timeout for actions and waits
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
    /// How long to wait for the bridge to report the browser ready
    pub startup_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            working_dir: PathBuf::from("."),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(30),
            startup_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeCommand<'a> {
    Goto { url: &'a str },
    WaitForLoadState { state: LoadState },
    Click { locator: &'a Locator },
    Fill { locator: &'a Locator, value: &'a str },
    PressSequentially { locator: &'a Locator, text: &'a str, delay_ms: u64 },
    TextContent { locator: &'a Locator },
    Count { locator: &'a Locator },
    WaitFor { locator: &'a Locator, state: WaitState, timeout_ms: u64 },
    Screenshot { full_page: bool },
    Close,
}

impl BridgeCommand<'_> {
    /// What the command acts on, for error messages.
    fn target(&self) -> String {
        match self {
            BridgeCommand::Goto { url } => (*url).to_string(),
            BridgeCommand::WaitForLoadState { state } => format!("load state {state:?}"),
            BridgeCommand::Click { locator }
            | BridgeCommand::Fill { locator, .. }
            | BridgeCommand::PressSequentially { locator, .. }
            | BridgeCommand::TextContent { locator }
            | BridgeCommand::Count { locator }
            | BridgeCommand::WaitFor { locator, .. } => locator.to_string(),
            BridgeCommand::Screenshot { .. } => "screenshot".to_string(),
            BridgeCommand::Close => "close".to_string(),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl BridgeReply {
    fn into_error(self, command: &BridgeCommand<'_>) -> E2eError {
        let reason = self.error.unwrap_or_else(|| "unknown bridge error".to_string());
        let target = command.target();
        match self.kind.as_deref() {
            Some("navigation") => E2eError::Navigation(format!("{target}: {reason}")),
            Some("timeout") => E2eError::Timeout(format!("{target}: {reason}")),
            Some("locator") => E2eError::Locator { locator: target, reason },
            _ => E2eError::Playwright(reason),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadyLine {
    ready: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl BridgeIo {
    async fn read_reply(&mut self, id: u64) -> E2eResult<BridgeReply> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<BridgeReply>(line) {
                Ok(reply) if reply.id == Some(id) => return Ok(reply),
                Ok(reply) if reply.id.is_none() => {
                    warn!("Bridge protocol error: {}", reply.error.unwrap_or_default())
                }
                Ok(reply) => debug!("Discarding stale bridge reply {:?}", reply.id),
                Err(_) => debug!("[bridge] {}", line),
            }
        }
        Err(E2eError::Playwright("bridge exited unexpectedly".to_string()))
    }
}

/// One browser, one context, one page, driven through the Node bridge.
pub struct PlaywrightSession {
    io: Mutex<BridgeIo>,
    child: Child,
    config: PlaywrightConfig,
    _workdir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Start the bridge and wait until the browser page is ready.
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("bridge.js");
        tokio::fs::write(&script_path, BRIDGE_SCRIPT).await?;

        let bridge_config = serde_json::json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "width": config.viewport_width,
            "height": config.viewport_height,
            "actionTimeoutMs": config.action_timeout.as_millis() as u64,
            "navigationTimeoutMs": config.navigation_timeout.as_millis() as u64,
        });

        info!(
            "Launching {} ({}) via Playwright bridge",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" }
        );

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .current_dir(&config.working_dir)
            .env("STOREFRONT_BRIDGE_CONFIG", bridge_config.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    E2eError::PlaywrightNotFound
                } else {
                    E2eError::BridgeStartup(format!(
                        "failed to spawn {}: {}",
                        config.node_binary.display(),
                        e
                    ))
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::BridgeStartup("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::BridgeStartup("bridge stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge stderr] {}", line);
                }
            });
        }

        let mut stdout = BufReader::new(stdout).lines();
        timeout(config.startup_timeout, wait_ready(&mut stdout))
            .await
            .map_err(|_| E2eError::BridgeStartup(format!("browser not ready after {:?}", config.startup_timeout)))??;

        debug!("Playwright bridge ready (pid {:?})", child.id());

        Ok(Self {
            io: Mutex::new(BridgeIo {
                stdin,
                stdout,
                next_id: 0,
            }),
            child,
            config,
            _workdir: workdir,
        })
    }

    fn reply_budget(&self, command: &BridgeCommand<'_>) -> Duration {
        let base = self.config.action_timeout.max(self.config.navigation_timeout);
        match command {
            BridgeCommand::WaitFor { timeout_ms, .. } => base.max(Duration::from_millis(*timeout_ms)) + REPLY_GRACE,
            _ => base + REPLY_GRACE,
        }
    }

    async fn call(&self, command: BridgeCommand<'_>) -> E2eResult<Value> {
        let budget = self.reply_budget(&command);
        let mut io = self.io.lock().await;
        io.next_id += 1;
        let id = io.next_id;

        let mut line = serde_json::to_string(&Envelope { id, command: &command })?;
        line.push('\n');
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        let reply = timeout(budget, io.read_reply(id))
            .await
            .map_err(|_| E2eError::Timeout(format!("bridge reply for {}", command.target())))??;

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(reply.into_error(&command))
        }
    }

    /// Close the browser and wait for the bridge to exit.
    pub async fn close(mut self) -> E2eResult<()> {
        if let Err(e) = self.call(BridgeCommand::Close).await {
            debug!("Close command failed: {}", e);
        }

        match timeout(CLOSE_TIMEOUT, self.child.wait()).await {
            Ok(status) => {
                debug!("Playwright bridge exited: {}", status?);
                Ok(())
            }
            Err(_) => {
                warn!("Playwright bridge did not exit, terminating");
                self.terminate().await;
                Ok(())
            }
        }
    }

    async fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && timeout(Duration::from_millis(500), self.child.wait()).await.is_ok()
            {
                return;
            }
        }

        let _ = self.child.kill().await;
    }
}

impl Drop for PlaywrightSession {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.start_kill();
        }
    }
}

async fn wait_ready(stdout: &mut Lines<BufReader<ChildStdout>>) -> E2eResult<()> {
    while let Some(line) = stdout.next_line().await? {
        let Ok(ready) = serde_json::from_str::<ReadyLine>(line.trim()) else {
            debug!("[bridge] {}", line);
            continue;
        };
        if ready.ready {
            return Ok(());
        }
        let reason = ready.error.unwrap_or_default();
        return Err(match ready.code.as_deref() {
            Some("MODULE_NOT_FOUND") => E2eError::PlaywrightNotFound,
            _ => E2eError::BridgeStartup(reason),
        });
    }
    Err(E2eError::BridgeStartup("bridge exited before the browser was ready".to_string()))
}

#[async_trait]
impl BrowserPage for PlaywrightSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Goto { url }).await.map(drop)
    }

    async fn wait_for_load_state(&self, state: LoadState) -> E2eResult<()> {
        self.call(BridgeCommand::WaitForLoadState { state }).await.map(drop)
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.call(BridgeCommand::Click { locator }).await.map(drop)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Fill { locator, value }).await.map(drop)
    }

    async fn press_sequentially(&self, locator: &Locator, text: &str, delay: Duration) -> E2eResult<()> {
        self.call(BridgeCommand::PressSequentially {
            locator,
            text,
            delay_ms: delay.as_millis() as u64,
        })
        .await
        .map(drop)
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self.call(BridgeCommand::TextContent { locator }).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.call(BridgeCommand::Count { locator }).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.call(BridgeCommand::WaitFor {
            locator,
            state,
            timeout_ms: timeout.as_millis() as u64,
        })
        .await
        .map(drop)
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let value = self.call(BridgeCommand::Screenshot { full_page: false }).await?;
        let encoded: String = serde_json::from_value(value)?;
        Ok(BASE64.decode(encoded)?)
    }
}
