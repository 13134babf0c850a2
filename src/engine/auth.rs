//! Authentication state machine.
//!
//! The single authoritative "logged in" flag lives here, and only the
//! operations in this module mutate it. The cached flag can silently go
//! stale — the session can expire server-side, or the operator can log out
//! in the same browser window — so protected operations never gate on it:
//! authorization always goes through [`AuthGate::authorize`] with the result
//! of a fresh live check. (Gating on the cached flag was a real defect class
//! in an earlier incarnation of this flow: it produced false "not logged in"
//! errors after external session expiry.)

use std::time::Instant;
use tracing::{info, warn};

use crate::core::error::EngineError;
use crate::core::types::{LoginOutcome, UserInfo};
use crate::engine::{humanize, session::SessionStore, wait_until_stable, JobScraper};

/// Authentication state of the browsing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn,
}

/// Holder of the cached auth flag. The cache exists only for cheap
/// state-machine decisions (`logout` no-op detection); it is never an input
/// to authorization.
#[derive(Debug)]
pub struct AuthGate {
    state: AuthState,
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            state: AuthState::LoggedOut,
        }
    }

    /// Record the outcome of a live status check.
    pub(crate) fn record(&mut self, live: AuthState) {
        self.state = live;
    }

    pub(crate) fn force_logged_out(&mut self) {
        self.state = AuthState::LoggedOut;
    }

    /// Cached value — internal use only. Protected operations must not read
    /// this; they call [`AuthGate::authorize`] with fresh live evidence.
    pub(crate) fn cached(&self) -> AuthState {
        self.state
    }

    /// Gate a protected operation on *live* evidence. Deliberately an
    /// associated function with no access to the cached flag, so a stale
    /// cache cannot leak into an authorization decision.
    pub fn authorize(live: AuthState) -> Result<(), EngineError> {
        match live {
            AuthState::LoggedIn => Ok(()),
            AuthState::LoggedOut => Err(EngineError::NotAuthenticated),
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Logout postcondition, shared by every `logout` path: the artifact is gone
/// from disk and the cached flag is LoggedOut. Runs even when the cached
/// flag already says LoggedOut, because the artifact on disk can belong to a
/// prior process this instance never knew about.
fn teardown_session(session: &SessionStore, gate: &mut AuthGate) {
    session.clear();
    gate.force_logged_out();
}

impl JobScraper {
    /// Live authentication check — the only operation that transitions the
    /// cached flag from evidence.
    ///
    /// Navigates to the site root, waits for network idle, then probes a
    /// small fixed set of DOM indicators. Presence of ANY indicator means
    /// logged in.
    pub async fn check_status(&mut self) -> Result<AuthState, EngineError> {
        self.goto(self.base.as_str()).await?;
        wait_until_stable(&self.page, 800, 15_000).await;
        humanize::pause(humanize::DEFAULT).await;

        let mut live = AuthState::LoggedOut;
        for indicator in self.selectors.login_indicators {
            if self.page.find_element(*indicator).await.is_ok() {
                live = AuthState::LoggedIn;
                break;
            }
        }

        self.gate.record(live);
        info!("auth: status check → {:?}", live);
        Ok(live)
    }

    /// External entry point for an authoritative state read. Same as
    /// `check_status`; the name exists so call sites make the freshness
    /// requirement explicit.
    pub async fn authoritative_state(&mut self) -> Result<AuthState, EngineError> {
        self.check_status().await
    }

    /// One-shot status report for the HTTP layer: a fresh live check, plus
    /// user info when it came back logged in.
    pub async fn status_report(&mut self) -> Result<crate::core::types::AuthResponse, EngineError> {
        match self.check_status().await? {
            AuthState::LoggedIn => {
                let user = self.fetch_user_info().await;
                Ok(crate::core::types::AuthResponse {
                    success: true,
                    logged_in: true,
                    message: "Already logged in".to_string(),
                    user: Some(user),
                })
            }
            AuthState::LoggedOut => Ok(crate::core::types::AuthResponse {
                success: true,
                logged_in: false,
                message: "Not logged in".to_string(),
                user: None,
            }),
        }
    }

    /// Log in, preferring a silent session restore over operator
    /// interaction.
    ///
    /// Fast path: replay the stored cookie artifact and run a live check.
    /// Slow path: open the login surface and poll until the operator
    /// completes the form manually, up to the configured ceiling. Timeout is
    /// a failure *result*, not an error — the caller can simply try again.
    pub async fn login(&mut self) -> Result<LoginOutcome, EngineError> {
        // Session restore fast path. The artifact's existence only makes it
        // a candidate; the live check below decides whether it still works.
        if let Some(cookies) = self.session.load() {
            SessionStore::inject(&self.page, &cookies).await;
            if self.check_status().await? == AuthState::LoggedIn {
                info!("auth: ✅ session restored from disk");
                let user = self.fetch_user_info().await;
                return Ok(LoginOutcome {
                    success: true,
                    message: "Session restored successfully".to_string(),
                    user: Some(user),
                });
            }
            info!("auth: stored session is expired — falling back to manual login");
        }

        self.manual_login_wait().await
    }

    /// Manual-login wait loop: the operator types credentials into the
    /// visible browser window while we poll for completion.
    async fn manual_login_wait(&mut self) -> Result<LoginOutcome, EngineError> {
        let login_url = self.login_url();
        self.goto(&login_url).await?;
        wait_until_stable(&self.page, 800, 15_000).await;
        humanize::pause(humanize::DEFAULT).await;

        info!("auth: 🔑 waiting for manual login in the browser window...");

        let ceiling = self.config.resolve_login_wait();
        let poll = self.config.resolve_login_poll();
        let started = Instant::now();

        while started.elapsed() < ceiling {
            let current = self.current_url().await;

            // Leaving the login path is the cheap completion signal; a full
            // live check confirms it before we trust it.
            if !current.contains(crate::core::config::LOGIN_PATH) {
                if self.check_status().await? == AuthState::LoggedIn {
                    return self.finish_manual_login().await;
                }
                // Redirected somewhere that is not a logged-in state (e.g. a
                // checkpoint page bounced back). Re-open the login surface
                // and keep waiting.
                self.goto(&login_url).await?;
            }

            tokio::time::sleep(poll).await;
        }

        info!("auth: manual login timed out after {:?}", ceiling);
        Ok(LoginOutcome {
            success: false,
            message: "Login timeout. Please try again.".to_string(),
            user: None,
        })
    }

    async fn finish_manual_login(&mut self) -> Result<LoginOutcome, EngineError> {
        // check_status already recorded LoggedIn; persist the session so the
        // next engine instance can skip the manual flow. A failed save is
        // logged inside the store and must not fail the login.
        match SessionStore::capture(&self.page).await {
            Ok(cookies) => self.session.save(&cookies),
            Err(e) => warn!("auth: session capture failed (login still succeeds): {}", e),
        }

        let user = self.fetch_user_info().await;
        info!("auth: ✅ manual login completed for {}", user.name);
        Ok(LoginOutcome {
            success: true,
            message: "Login successful! Session saved for future use.".to_string(),
            user: Some(user),
        })
    }

    /// Log out and destroy the session artifact.
    ///
    /// The UI-driven part (profile menu → logout link) is best-effort; its
    /// failure never blocks the guarantees: after this returns the state is
    /// LoggedOut and no artifact remains on disk — including when this
    /// instance was never logged in but a prior process left an artifact
    /// behind.
    pub async fn logout(&mut self) -> Result<crate::core::types::AuthOutcome, EngineError> {
        if self.gate.cached() == AuthState::LoggedOut {
            teardown_session(&self.session, &mut self.gate);
            return Ok(crate::core::types::AuthOutcome {
                success: true,
                message: "Already logged out".to_string(),
            });
        }

        if let Err(e) = self.ui_logout().await {
            warn!("auth: UI logout failed (continuing with teardown): {}", e);
        }

        teardown_session(&self.session, &mut self.gate);
        info!("auth: logged out, session artifact cleared");

        Ok(crate::core::types::AuthOutcome {
            success: true,
            message: "Logged out successfully".to_string(),
        })
    }

    async fn ui_logout(&mut self) -> Result<(), EngineError> {
        self.goto(self.base.as_str()).await?;
        wait_until_stable(&self.page, 800, 15_000).await;

        let menu = self
            .page
            .find_element(self.selectors.profile_menu)
            .await
            .map_err(|e| EngineError::nav("profile menu not found", e))?;
        menu.click()
            .await
            .map_err(|e| EngineError::nav("profile menu click failed", e))?;
        humanize::pause(humanize::DEFAULT).await;

        let link = self
            .page
            .find_element(self.selectors.logout_link)
            .await
            .map_err(|e| EngineError::nav("logout link not found", e))?;
        link.click()
            .await
            .map_err(|e| EngineError::nav("logout click failed", e))?;
        humanize::pause(humanize::SETTLE).await;
        Ok(())
    }

    /// Fresh-gated user info for the external API.
    pub async fn user_info(&mut self) -> Result<UserInfo, EngineError> {
        let live = self.check_status().await?;
        AuthGate::authorize(live)?;
        Ok(self.fetch_user_info().await)
    }

    /// Read the operator's display name from the profile page. Failures
    /// degrade to a placeholder; the caller already verified auth.
    pub(crate) async fn fetch_user_info(&self) -> UserInfo {
        let fallback = UserInfo {
            name: "Unknown User".to_string(),
            logged_in: true,
        };

        if self.goto(&self.profile_url()).await.is_err() {
            return fallback;
        }
        wait_until_stable(&self.page, 800, 15_000).await;

        let name = match self.page.find_element(self.selectors.user_name).await {
            Ok(el) => el
                .inner_text()
                .await
                .ok()
                .flatten()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            Err(_) => None,
        };

        UserInfo {
            name: name.unwrap_or_else(|| fallback.name.clone()),
            logged_in: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_passes_only_on_live_logged_in() {
        assert!(AuthGate::authorize(AuthState::LoggedIn).is_ok());
        assert!(matches!(
            AuthGate::authorize(AuthState::LoggedOut),
            Err(EngineError::NotAuthenticated)
        ));
    }

    /// Regression for the stale-flag defect: even with the cache claiming
    /// LoggedIn, a live LoggedOut must fail authorization — the gate has no
    /// path from the cached value into the decision.
    #[test]
    fn stale_cache_cannot_authorize() {
        let mut gate = AuthGate::new();
        gate.record(AuthState::LoggedIn); // cache goes stale after this
        assert_eq!(gate.cached(), AuthState::LoggedIn);
        assert!(matches!(
            AuthGate::authorize(AuthState::LoggedOut),
            Err(EngineError::NotAuthenticated)
        ));
    }

    /// A fresh engine starts with a LoggedOut cache, but an artifact from a
    /// prior process can still sit in the session directory. Logout teardown
    /// must remove it even on that "already logged out" path.
    #[test]
    fn logout_teardown_clears_artifact_even_when_already_logged_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session"));
        store.save(&[serde_json::json!({"name": "li_at", "value": "stale"})]);
        assert!(store.exists());

        let mut gate = AuthGate::new();
        assert_eq!(gate.cached(), AuthState::LoggedOut);

        teardown_session(&store, &mut gate);
        assert!(!store.exists(), "artifact must be gone after logout");
        assert_eq!(gate.cached(), AuthState::LoggedOut);
    }

    #[test]
    fn gate_starts_logged_out_and_forces_cleanly() {
        let mut gate = AuthGate::new();
        assert_eq!(gate.cached(), AuthState::LoggedOut);
        gate.record(AuthState::LoggedIn);
        gate.force_logged_out();
        assert_eq!(gate.cached(), AuthState::LoggedOut);
    }
}
