//! Browsing-identity selection and stealth browser configuration.
//!
//! One `BrowsingIdentity` is drawn at engine construction and never changes
//! for the lifetime of that engine: target sites correlate user-agent,
//! viewport, locale, and timezone across requests, so consistency within a
//! session matters more than variety.

use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use rand::seq::IndexedRandom;
use std::path::Path;

const USER_AGENTS: &[&str] = &[
    // Chrome 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Firefox 133 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Safari 17 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
];

const VIEWPORTS: &[(u32, u32)] = &[(1366, 768), (1920, 1080), (1440, 900), (1536, 864)];

/// The fingerprint one browsing surface presents: user-agent, viewport,
/// locale, timezone. Locale and timezone are fixed — rotating them against a
/// stable cookie jar is itself a detection signal.
#[derive(Debug, Clone)]
pub struct BrowsingIdentity {
    pub user_agent: &'static str,
    pub viewport: (u32, u32),
    pub locale: &'static str,
    pub timezone: &'static str,
}

impl BrowsingIdentity {
    /// Draw one identity from the candidate pool. The pool is non-empty by
    /// construction, so there is no error path; the `unwrap_or` is only
    /// there to satisfy `choose`'s Option.
    pub fn select() -> Self {
        let mut rng = rand::rng();
        Self {
            user_agent: USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]),
            viewport: VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]),
            locale: "en-US",
            timezone: "America/New_York",
        }
    }

    /// Build a `BrowserConfig` carrying this identity plus the usual stealth
    /// flags. `--disable-blink-features=AutomationControlled` suppresses the
    /// `navigator.webdriver` flag at the process level; the JS-level
    /// hardening is injected per page (see [`STEALTH_INIT_SCRIPT`]).
    pub fn browser_config(&self, exe: &str, headless: bool) -> Result<BrowserConfig> {
        let (width, height) = self.viewport;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(exe)
            .viewport(Viewport {
                width,
                height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .window_size(width, height)
            .arg("--disable-gpu")
            .arg("--no-sandbox") // often required in CI / restricted environments
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage") // avoids /dev/shm OOM in constrained environments
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--disable-infobars")
            .arg("--disable-default-apps")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            // Stealth: suppress CDP automation fingerprint
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--lang={}", self.locale))
            .arg(format!("--user-agent={}", self.user_agent));

        if !headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }
}

/// JS-level hardening evaluated on every new document before page scripts
/// run. Covers the checks commercial detectors actually perform: webdriver
/// flag, chrome runtime presence, languages/plugins emptiness, and the
/// notification-permission probe.
pub const STEALTH_INIT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined,
});

if (!window.chrome) {
    window.chrome = {};
}
if (!window.chrome.runtime) {
    window.chrome.runtime = {};
}

Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en'],
});

Object.defineProperty(navigator, 'plugins', {
    get: () => [1, 2, 3, 4, 5],
});

const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}
"#;

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan — finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_browser_executable() -> Option<String> {
    if let Some(p) = crate::core::config::chrome_executable_override() {
        return Some(p);
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
            "brave",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/brave-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_comes_from_the_pool() {
        let id = BrowsingIdentity::select();
        assert!(USER_AGENTS.contains(&id.user_agent));
        assert!(VIEWPORTS.contains(&id.viewport));
    }

    #[test]
    fn locale_and_timezone_are_fixed() {
        for _ in 0..16 {
            let id = BrowsingIdentity::select();
            assert_eq!(id.locale, "en-US");
            assert_eq!(id.timezone, "America/New_York");
        }
    }

    #[test]
    fn stealth_script_hides_webdriver() {
        assert!(STEALTH_INIT_SCRIPT.contains("webdriver"));
        assert!(STEALTH_INIT_SCRIPT.contains("chrome.runtime"));
    }
}
