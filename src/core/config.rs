use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ScoutConfig — file-based config loader (jobscout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "JOBSCOUT_CONFIG";
pub const ENV_BASE_URL: &str = "JOBSCOUT_BASE_URL";
pub const ENV_SESSION_DIR: &str = "JOBSCOUT_SESSION_DIR";
pub const ENV_HEADLESS: &str = "JOBSCOUT_HEADLESS";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

/// Path fragments on the target site. These are fixed for the one property
/// this tool targets; arbitrary-site support is a non-goal.
pub const LOGIN_PATH: &str = "/login";
pub const JOBS_SEARCH_PATH: &str = "/jobs/search";
pub const PROFILE_PATH: &str = "/in/me/";

/// Top-level config loaded from `jobscout.json`. Every field is optional;
/// the `resolve_*` accessors apply env-var fallbacks and defaults.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ScoutConfig {
    /// Root of the target web property. Overridable mainly so tests can point
    /// the engine at a local fixture server.
    pub base_url: Option<String>,
    /// Directory holding the session cookie artifact.
    pub session_dir: Option<String>,
    /// Run the browser headless. Defaults to `false` — the manual-login flow
    /// needs a visible window for the operator to type into.
    pub headless: Option<bool>,
    /// Ceiling (seconds) for the manual-login wait loop.
    pub login_wait_secs: Option<u64>,
    /// Poll period (seconds) inside the manual-login wait loop.
    pub login_poll_secs: Option<u64>,
    /// Defensive page-traversal ceiling for one extraction run.
    pub max_pages: Option<usize>,
}

impl ScoutConfig {
    /// Base URL: JSON field → `JOBSCOUT_BASE_URL` env var → the live site.
    pub fn resolve_base_url(&self) -> String {
        if let Some(u) = &self.base_url {
            if !u.trim().is_empty() {
                return u.trim_end_matches('/').to_string();
            }
        }
        std::env::var(ENV_BASE_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://www.linkedin.com".to_string())
    }

    /// Session directory: JSON field → `JOBSCOUT_SESSION_DIR` env var →
    /// `~/.jobscout/session` → temp dir when no home directory exists.
    pub fn resolve_session_dir(&self) -> PathBuf {
        if let Some(d) = &self.session_dir {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        if let Ok(d) = std::env::var(ENV_SESSION_DIR) {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        match dirs::home_dir() {
            Some(home) => home.join(".jobscout").join("session"),
            None => std::env::temp_dir().join("jobscout_session"),
        }
    }

    /// Headless mode: JSON field → `JOBSCOUT_HEADLESS` env var → `false`.
    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        std::env::var(ENV_HEADLESS)
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false)
    }

    /// Manual-login wait ceiling. Default: 300 s.
    pub fn resolve_login_wait(&self) -> Duration {
        Duration::from_secs(self.login_wait_secs.unwrap_or(300))
    }

    /// Manual-login poll period. Default: 2 s.
    pub fn resolve_login_poll(&self) -> Duration {
        Duration::from_secs(self.login_poll_secs.unwrap_or(2).max(1))
    }

    /// Page-traversal ceiling per extraction run. Default: 25.
    ///
    /// The record cap alone does not bound the loop: a pathological results
    /// page that keeps offering an enabled "next" control while yielding no
    /// extractable records would otherwise paginate forever.
    pub fn resolve_max_pages(&self) -> usize {
        self.max_pages.unwrap_or(25).max(1)
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Default behavior is auto-discovery (see `engine::find_browser_executable`).
/// This only returns a value when `CHROME_EXECUTABLE` points at an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

/// Load `jobscout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `JOBSCOUT_CONFIG` env var path
/// 2. `./jobscout.json`  (process cwd)
/// 3. `../jobscout.json` (one level up when running from a subdirectory)
///
/// Missing file → `ScoutConfig::default()` (silent, env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_config() -> ScoutConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("jobscout.json"),
            PathBuf::from("../jobscout.json"),
        ];
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            v.insert(0, PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ScoutConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("jobscout.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "jobscout.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return ScoutConfig::default();
                }
            },
            Err(_) => continue, // not found at this path — try next
        }
    }

    ScoutConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_field_wins_and_is_trimmed() {
        let cfg = ScoutConfig {
            base_url: Some("http://127.0.0.1:8099/".into()),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_base_url(), "http://127.0.0.1:8099");
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = ScoutConfig::default();
        assert_eq!(cfg.resolve_login_wait(), Duration::from_secs(300));
        assert_eq!(cfg.resolve_login_poll(), Duration::from_secs(2));
        assert_eq!(cfg.resolve_max_pages(), 25);
    }

    #[test]
    fn max_pages_floor_is_one() {
        let cfg = ScoutConfig {
            max_pages: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_max_pages(), 1);
    }
}
