// Result storage on the local filesystem

pub mod results;

pub use results::*;
