use serde::{Deserialize, Serialize};

// ── Auth API ─────────────────────────────────────────────────────────────────

/// Body of `POST /api/auth`. The action is matched as a plain string so an
/// unknown value can be rejected as a client-input error with a helpful
/// message instead of a serde parse failure.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub action: String,
}

/// Basic identity of the logged-in operator, read from the profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub logged_in: bool,
}

/// Result of `check_status` / `login`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub logged_in: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Result of `logout` (and other success/message-only operations).
#[derive(Debug, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
}

// ── Filter specification ─────────────────────────────────────────────────────

fn default_max_jobs() -> usize {
    50
}

/// Caller-supplied search criteria for one extraction run. Immutable input;
/// maps deterministically onto a query-parameter set (see `engine::query`).
///
/// Enum-ish fields are free strings on the wire: unrecognized values are
/// simply omitted from the generated query rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFilter {
    pub keywords: String,
    #[serde(default)]
    pub location: Option<String>,
    /// One of `24h`, `3d`, `1w`, `2w`, `1m`.
    #[serde(default)]
    pub date_posted: Option<String>,
    /// One of `internship`, `entry`, `associate`, `mid`, `director`, `executive`.
    #[serde(default)]
    pub experience_level: Option<String>,
    /// One of `full-time`, `part-time`, `contract`, `temporary`, `volunteer`,
    /// `internship`.
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub salary_min: Option<String>,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
}

// ── Extracted records ────────────────────────────────────────────────────────

/// One structured listing produced by the extraction engine. Ownership
/// transfers to the caller as soon as the run returns; the engine keeps no
/// copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub posted_date: String,
    /// Description snippet, truncated to 500 chars. `"N/A"` when the detail
    /// expansion degraded.
    pub description: String,
    pub salary: String,
    /// Email addresses found in the description, deduplicated in first-seen
    /// order.
    pub emails: Vec<String>,
}

/// Terminal result of one extraction run. A failed run carries an empty
/// record list and a descriptive message; it is a result, not an error, so
/// the HTTP layer can return it as a 200 with `success: false`.
#[derive(Debug, Serialize)]
pub struct ScrapeOutcome {
    pub success: bool,
    pub message: String,
    pub jobs: Vec<JobListing>,
    pub total_found: usize,
}

impl ScrapeOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            jobs: Vec::new(),
            total_found: 0,
        }
    }
}

/// Result of `login`: either a restored/completed session with user info, or
/// a recoverable failure (timeout) the caller can retry.
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

// ── Generic API plumbing ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
