pub mod engine;
pub mod pricing;
pub mod prompt;
pub mod thread;
pub mod token_budget;
pub mod types;

pub use types::{SummaryError, SummaryPolicy};
