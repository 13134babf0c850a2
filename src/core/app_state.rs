use std::sync::Arc;

use crate::core::config::ScoutConfig;
use crate::core::error::EngineError;
use crate::engine::JobScraper;
use crate::records::RecordStore;

/// Shared application state for the HTTP layer.
///
/// The engine slot replaces the source-of-record's ambient global singleton:
/// one lazily-launched `JobScraper` lives behind a `tokio::sync::Mutex`, and
/// every handler that touches the browsing surface holds the lock for the
/// whole operation. Two concurrent extraction requests would otherwise race
/// on shared navigation state (one page, one cookie jar), so single-flight is
/// enforced here rather than trusted to callers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScoutConfig>,
    pub records: RecordStore,
    pub engine: Arc<tokio::sync::Mutex<Option<JobScraper>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("records", &self.records.len())
            .finish()
    }
}

impl AppState {
    pub fn new(config: ScoutConfig) -> Self {
        Self {
            config: Arc::new(config),
            records: RecordStore::new(),
            engine: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }
}

/// Lazily launch the engine inside an already-held slot lock.
///
/// Launch failure leaves the slot empty so the next request retries from a
/// clean state instead of reusing a half-initialized browser.
pub async fn ensure_engine<'a>(
    slot: &'a mut Option<JobScraper>,
    config: Arc<ScoutConfig>,
) -> Result<&'a mut JobScraper, EngineError> {
    if slot.is_none() {
        *slot = Some(JobScraper::launch(config).await?);
    }
    Ok(slot.as_mut().expect("engine present after init"))
}
