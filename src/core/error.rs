use thiserror::Error;

/// Engine-level error taxonomy.
///
/// Only failures a caller can act on get their own variant: a
/// `NotAuthenticated` response should prompt a re-login, an `InvalidInput`
/// should be fixed client-side, and a `BrowserInit` means this engine
/// instance is unusable. Transient navigation trouble inside an extraction
/// run is caught by the engine itself and reported as a failure outcome
/// instead of bubbling up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("browser initialization failed: {0}")]
    BrowserInit(String),

    #[error("automation surface unavailable: {0}")]
    Navigation(String),

    #[error("not authenticated — log in first")]
    NotAuthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    /// Shorthand for wrapping a CDP/navigation failure with context.
    pub fn nav(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Navigation(format!("{}: {}", context, err))
    }
}
