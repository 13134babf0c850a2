//! Session cookie persistence.
//!
//! After a successful manual login the browsing context's cookies are saved
//! to `{session_dir}/session_cookies.json` so the next engine instance can
//! restore the session without another operator interaction. The file's
//! existence only marks a *candidate* session: validity is established by
//! replaying the cookies into a fresh context and running a live status
//! check — `load` never touches authentication state on its own.

use chromiumoxide::Page;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::error::EngineError;

const SESSION_FILE: &str = "session_cookies.json";

/// Disk-backed store for the one session artifact this engine owns.
///
/// No locking discipline: two engine instances pointed at the same directory
/// can race on save/load. Documented limitation, not solved here.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Whether a candidate artifact exists on disk.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Serialize the cookie jar to the session file, overwriting any prior
    /// content. Writes to `{path}.tmp` then renames so a reader never
    /// observes a partial file. I/O failure is logged and swallowed — a
    /// failed save must not abort an otherwise-successful login.
    pub fn save(&self, cookies: &[serde_json::Value]) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("session: failed to create {}: {}", self.dir.display(), e);
            return;
        }

        let json = match serde_json::to_string_pretty(cookies) {
            Ok(s) => s,
            Err(e) => {
                warn!("session: cookie serialization failed: {}", e);
                return;
            }
        };

        let path = self.path();
        let tmp = path.with_extension("tmp");
        if let Err(e) = std::fs::write(&tmp, &json) {
            warn!("session: failed to write {}: {}", tmp.display(), e);
            return;
        }
        match std::fs::rename(&tmp, &path) {
            Ok(()) => info!("session: 🍪 saved {} cookies to {}", cookies.len(), path.display()),
            Err(e) => warn!("session: failed to rename {} → {}: {}", tmp.display(), path.display(), e),
        }
    }

    /// Load the stored cookie jar as raw JSON values.
    ///
    /// Returns `None` when the artifact is absent, unreadable, or empty.
    pub fn load(&self) -> Option<Vec<serde_json::Value>> {
        let path = self.path();
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        let cookies: Vec<serde_json::Value> = serde_json::from_str(&content).ok()?;
        if cookies.is_empty() {
            return None;
        }
        info!("session: loaded {} cookies from {}", cookies.len(), path.display());
        Some(cookies)
    }

    /// Delete the artifact if present. Idempotent: absence is success.
    pub fn clear(&self) {
        let path = self.path();
        if !path.exists() {
            return;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => info!("session: 🗑️  removed {}", path.display()),
            Err(e) => warn!("session: failed to remove {}: {}", path.display(), e),
        }
    }

    /// Capture the live context's cookies as raw JSON values, ready for
    /// `save`.
    pub async fn capture(page: &Page) -> Result<Vec<serde_json::Value>, EngineError> {
        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| EngineError::nav("cookie capture failed", e))?;
        Ok(cookies
            .iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect())
    }

    /// Replay stored cookies into a live CDP page via `Network.setCookies`.
    ///
    /// Individual cookies that fail to deserialize are skipped so a partially
    /// malformed artifact never blocks the restore attempt. Call before
    /// navigation so the cookies ride the first request.
    pub async fn inject(page: &Page, raw_cookies: &[serde_json::Value]) {
        use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams};

        let cookie_params: Vec<CookieParam> = raw_cookies
            .iter()
            .filter_map(|v| serde_json::from_value::<CookieParam>(v.clone()).ok())
            .collect();

        if cookie_params.is_empty() {
            warn!("session: stored artifact contained no valid cookies — skipping injection");
            return;
        }

        let count = cookie_params.len();
        match page.execute(SetCookiesParams::new(cookie_params)).await {
            Ok(_) => info!("session: 💉 injected {} cookies into browsing context", count),
            Err(e) => warn!("session: cookie injection failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session"));
        (dir, store)
    }

    #[test]
    fn load_returns_none_without_artifact() {
        let (_guard, store) = store();
        assert!(!store.exists());
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_guard, store) = store();
        let cookies = vec![
            json!({"name": "li_at", "value": "abc", "domain": ".example.com"}),
            json!({"name": "JSESSIONID", "value": "xyz", "domain": ".example.com"}),
        ];
        store.save(&cookies);
        assert!(store.exists());
        let loaded = store.load().expect("artifact present");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0]["name"], "li_at");
    }

    #[test]
    fn empty_jar_loads_as_none() {
        let (_guard, store) = store();
        store.save(&[]);
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_guard, store) = store();
        store.clear(); // nothing on disk — must not panic or error
        store.save(&[json!({"name": "a", "value": "1"})]);
        assert!(store.exists());
        store.clear();
        assert!(!store.exists());
        store.clear();
        assert!(!store.exists());
    }
}
