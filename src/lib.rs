pub mod core;
pub mod engine;
pub mod records;

// --- Primary exports ---
pub use crate::core::types;
pub use crate::core::types::*;
pub use crate::core::AppState;
pub use crate::core::EngineError;
pub use engine::auth::AuthState;
pub use engine::JobScraper;
