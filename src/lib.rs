// Patent Scout - finds patents for a chemical compound and verifies their titles

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod patents;   // Google Patents lookups and title extraction
pub mod analysis;  // Title similarity and script detection
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use agents::PatentSearchPipeline;
pub use config::Config;
pub use models::{SearchQuery, SearchSummary};
pub use types::{AppError, AppResult};
