use std::env;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use aitk_contracts::{NetworkFailure, ToolError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing::{debug, warn};

use super::cdp::CdpConnection;
use super::{PageCapturer, Viewport};

const BROWSER_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];
const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);
const DEVTOOLS_BANNER: &str = "DevTools listening on ";

/// Screenshots pages with a headless Chrome/Chromium driven over DevTools.
#[derive(Debug, Clone)]
pub struct ChromeCapture {
    executable: Option<PathBuf>,
    navigation_timeout: Duration,
}

impl ChromeCapture {
    pub fn new(executable: Option<PathBuf>, navigation_timeout: Duration) -> Self {
        Self {
            executable,
            navigation_timeout,
        }
    }

    /// Explicit path if configured, else the first known browser on `PATH`.
    pub fn locate_executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.executable {
            return Some(path.clone());
        }
        let search = env::var_os("PATH")?;
        find_browser_in(env::split_paths(&search))
    }

    fn launch(&self, viewport: Viewport) -> Result<BrowserProcess, ToolError> {
        let executable = self.locate_executable().ok_or_else(|| {
            ToolError::configuration(
                "No Chrome or Chromium executable found. Install one or set AITK_CHROME.",
            )
        })?;
        let profile = tempfile::Builder::new()
            .prefix("aitk-chrome-")
            .tempdir()
            .map_err(|err| ToolError::io(env::temp_dir(), err))?;

        debug!(executable = %executable.display(), "launching headless browser");
        let mut child = Command::new(&executable)
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--no-first-run",
                "--no-default-browser-check",
                "--hide-scrollbars",
                "--mute-audio",
                "--remote-debugging-port=0",
            ])
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg(format!("--window-size={},{}", viewport.width, viewport.height))
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                ToolError::configuration(format!(
                    "failed to launch {}: {err}",
                    executable.display()
                ))
            })?;

        let stderr = child.stderr.take();
        let mut process = BrowserProcess {
            child,
            ws_url: None,
            _profile: profile,
        };
        let Some(stderr) = stderr else {
            return Err(ToolError::Navigation(
                "browser stderr was not captured".to_string(),
            ));
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut sent = false;
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if sent {
                    continue;
                }
                if let Some(url) = parse_devtools_banner(&line) {
                    sent = tx.send(url).is_ok();
                }
            }
        });

        match rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(url) => {
                process.ws_url = Some(url);
                Ok(process)
            }
            Err(_) => Err(ToolError::Navigation(
                "headless browser did not report a DevTools endpoint".to_string(),
            )),
        }
    }
}

impl PageCapturer for ChromeCapture {
    fn capture(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>, ToolError> {
        let browser = self.launch(viewport)?;
        let ws_url = browser.ws_url.clone().unwrap_or_default();
        let mut cdp = CdpConnection::open(&ws_url)?;
        let result = capture_page(&mut cdp, url, viewport, self.navigation_timeout);
        cdp.close();
        drop(browser);
        result
    }
}

fn capture_page(
    cdp: &mut CdpConnection,
    url: &str,
    viewport: Viewport,
    navigation_timeout: Duration,
) -> Result<Vec<u8>, ToolError> {
    let setup_deadline = Instant::now() + STARTUP_TIMEOUT;
    let target = cdp.call(
        None,
        "Target.createTarget",
        json!({ "url": "about:blank" }),
        setup_deadline,
    )?;
    let target_id = string_field(&target, "targetId", "Target.createTarget")?;
    let attached = cdp.call(
        None,
        "Target.attachToTarget",
        json!({ "targetId": target_id, "flatten": true }),
        setup_deadline,
    )?;
    let session_id = string_field(&attached, "sessionId", "Target.attachToTarget")?;
    let session = Some(session_id.as_str());

    cdp.call(session, "Page.enable", json!({}), setup_deadline)?;
    cdp.call(
        session,
        "Page.setLifecycleEventsEnabled",
        json!({ "enabled": true }),
        setup_deadline,
    )?;
    cdp.call(
        session,
        "Emulation.setDeviceMetricsOverride",
        json!({
            "width": viewport.width,
            "height": viewport.height,
            "deviceScaleFactor": 1,
            "mobile": false,
        }),
        setup_deadline,
    )?;

    let deadline = Instant::now() + navigation_timeout;
    debug!(%url, "navigating");
    let navigation = cdp.call(session, "Page.navigate", json!({ "url": url }), deadline)?;
    if let Some(error_text) = navigation
        .get("errorText")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        return Err(classify_navigation_error(error_text));
    }
    let loader_id = navigation
        .get("loaderId")
        .and_then(Value::as_str)
        .map(str::to_string);

    loop {
        let event = cdp.next_event(deadline, "network idle")?;
        if is_network_idle(&event, &session_id, loader_id.as_deref()) {
            break;
        }
    }

    let shot = cdp.call(
        session,
        "Page.captureScreenshot",
        json!({ "format": "png", "captureBeyondViewport": false }),
        Instant::now() + STARTUP_TIMEOUT,
    )?;
    let data = string_field(&shot, "data", "Page.captureScreenshot")?;
    BASE64
        .decode(data.as_bytes())
        .map_err(|err| ToolError::Navigation(format!("screenshot payload was not base64: {err}")))
}

fn string_field(value: &Value, key: &str, method: &str) -> Result<String, ToolError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::Navigation(format!("{method} returned no {key}")))
}

fn is_network_idle(event: &Value, session_id: &str, loader_id: Option<&str>) -> bool {
    if event.get("method").and_then(Value::as_str) != Some("Page.lifecycleEvent") {
        return false;
    }
    if event.get("sessionId").and_then(Value::as_str) != Some(session_id) {
        return false;
    }
    let params = event.get("params").cloned().unwrap_or(Value::Null);
    if params.get("name").and_then(Value::as_str) != Some("networkIdle") {
        return false;
    }
    match loader_id {
        Some(expected) => params.get("loaderId").and_then(Value::as_str) == Some(expected),
        None => true,
    }
}

/// Maps a Chrome `net::ERR_*` navigation failure onto the error taxonomy.
pub fn classify_navigation_error(error_text: &str) -> ToolError {
    let upper = error_text.to_ascii_uppercase();
    if upper.contains("ERR_NAME_NOT_RESOLVED") || upper.contains("ERR_NAME_RESOLUTION_FAILED") {
        return ToolError::network(NetworkFailure::Resolution, error_text);
    }
    if upper.contains("ERR_TIMED_OUT")
        || upper.contains("ERR_CONNECTION_TIMED_OUT")
        || upper.contains("TIMEOUT")
    {
        return ToolError::network(NetworkFailure::Timeout, error_text);
    }
    if upper.contains("ERR_INTERNET_DISCONNECTED")
        || upper.contains("ERR_CONNECTION_REFUSED")
        || upper.contains("ERR_CONNECTION_RESET")
        || upper.contains("ERR_ADDRESS_UNREACHABLE")
    {
        return ToolError::network(NetworkFailure::Connection, error_text);
    }
    ToolError::Navigation(error_text.to_string())
}

fn parse_devtools_banner(line: &str) -> Option<String> {
    let (_, rest) = line.split_once(DEVTOOLS_BANNER)?;
    let url = rest.trim();
    if url.starts_with("ws://") {
        return Some(url.to_string());
    }
    None
}

fn find_browser_in(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = dirs.into_iter().collect();
    BROWSER_CANDIDATES.iter().find_map(|name| {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

struct BrowserProcess {
    child: Child,
    ws_url: Option<String>,
    _profile: TempDir,
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        if let Err(err) = self.child.kill() {
            warn!(error = %err, "failed to stop headless browser");
        }
        let _ = self.child.wait();
    }
}
