//! The session/automation-driving engine.
//!
//! One `JobScraper` owns one exclusive browsing surface (browser process,
//! CDP handler task, single page) plus the authentication gate and the
//! session store. It is not safe for concurrent extraction runs; the HTTP
//! layer serializes access through the engine mutex in `AppState`.

pub mod auth;
pub mod extract;
pub mod fingerprint;
pub mod humanize;
pub mod query;
pub mod selectors;
pub mod session;

use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::core::config::{self, ScoutConfig};
use crate::core::error::EngineError;
use auth::AuthGate;
use fingerprint::BrowsingIdentity;
use selectors::SelectorSet;
use session::SessionStore;

pub struct JobScraper {
    pub(crate) browser: Browser,
    pub(crate) handler_task: tokio::task::JoinHandle<()>,
    pub(crate) page: Page,
    pub(crate) identity: BrowsingIdentity,
    pub(crate) session: SessionStore,
    pub(crate) selectors: SelectorSet,
    pub(crate) config: Arc<ScoutConfig>,
    pub(crate) base: Url,
    pub(crate) gate: AuthGate,
}

impl JobScraper {
    /// Launch the browsing surface with a freshly selected fingerprint.
    ///
    /// Launch failure is fatal for this engine instance; there is no
    /// automatic retry.
    pub async fn launch(config: Arc<ScoutConfig>) -> Result<Self, EngineError> {
        let base = Url::parse(&config.resolve_base_url())
            .map_err(|e| EngineError::InvalidInput(format!("invalid base_url: {}", e)))?;

        let exe = fingerprint::find_browser_executable().ok_or_else(|| {
            EngineError::BrowserInit(
                "no Chromium-family browser found — install Chrome/Chromium or set CHROME_EXECUTABLE"
                    .to_string(),
            )
        })?;

        let identity = BrowsingIdentity::select();
        info!(
            "engine: launching browser ({}) ua=\"{}\" viewport={}x{}",
            exe, identity.user_agent, identity.viewport.0, identity.viewport.1
        );

        let browser_config = identity
            .browser_config(&exe, config.resolve_headless())
            .map_err(|e| EngineError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::BrowserInit(format!("launch failed ({}): {}", exe, e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("engine: CDP handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::BrowserInit(format!("failed to open page: {}", e)))?;

        // Per-page identity pieces CDP can set that browser flags cannot.
        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(
                fingerprint::STEALTH_INIT_SCRIPT,
            ))
            .await
        {
            warn!("engine: failed to install stealth init script: {}", e);
        }
        if let Err(e) = page
            .execute(SetTimezoneOverrideParams::new(identity.timezone))
            .await
        {
            warn!("engine: failed to set timezone override: {}", e);
        }

        Ok(Self {
            browser,
            handler_task,
            page,
            identity,
            session: SessionStore::new(config.resolve_session_dir()),
            selectors: selectors::V1,
            config,
            base,
            gate: AuthGate::new(),
        })
    }

    pub(crate) fn login_url(&self) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), config::LOGIN_PATH)
    }

    pub(crate) fn jobs_search_base(&self) -> Result<Url, EngineError> {
        self.base
            .join(config::JOBS_SEARCH_PATH)
            .map_err(|e| EngineError::InvalidInput(format!("invalid jobs search path: {}", e)))
    }

    pub(crate) fn profile_url(&self) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), config::PROFILE_PATH)
    }

    /// Navigate the engine's page, mapping CDP failures to the generic
    /// "automation surface unavailable" error.
    pub(crate) async fn goto(&self, url: &str) -> Result<(), EngineError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| EngineError::nav(&format!("navigation to {} failed", url), e))?;
        Ok(())
    }

    /// Current page URL, empty string when the surface cannot report one.
    pub(crate) async fn current_url(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }

    /// Scoped teardown of the browsing surface. Consumes the engine so a
    /// closed handle cannot be reused; run on every exit path.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("engine: browser close error (non-fatal): {}", e);
        }
        self.handler_task.abort();
        info!("engine: 🛑 browsing surface released");
    }
}

/// Wait until the page network goes idle (no new resource entries for
/// `quiet_ms` consecutive ms) or until `timeout_ms` has elapsed.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms — a
/// networkidle heuristic that works without subscribing to CDP Network
/// events.
pub(crate) async fn wait_until_stable(page: &Page, quiet_ms: u64, timeout_ms: u64) {
    let poll_ms = 250u64;
    let start = std::time::Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = std::time::Instant::now();

    loop {
        if start.elapsed().as_millis() as u64 >= timeout_ms {
            info!("engine: network-idle wait timed out after {}ms", timeout_ms);
            return;
        }

        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready_complete: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready_complete {
            // DOM still loading; don't let "idle" trigger yet.
            stable_since = std::time::Instant::now();
            last_count = count;
        } else if count != last_count {
            last_count = count;
            stable_since = std::time::Instant::now();
        } else if stable_since.elapsed().as_millis() as u64 >= quiet_ms {
            return;
        }

        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
    }
}

impl Drop for JobScraper {
    fn drop(&mut self) {
        // Best-effort cleanup when `close()` was skipped. Drop cannot await;
        // abort the handler task so the CDP stream doesn't outlive us.
        self.handler_task.abort();
    }
}
