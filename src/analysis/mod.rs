//! Text analysis used by title verification
//!
//! - [`similarity`]: sequence-alignment ratio between a claimed and a scraped title
//! - [`script`]: heuristic detection of titles written in a non-Latin script

pub mod script;
pub mod similarity;

pub use script::{is_non_latin, non_latin_fraction};
pub use similarity::{similarity_ratio, title_similarity};
