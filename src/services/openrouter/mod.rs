pub mod catalog;
pub mod client;
pub mod error;
pub mod payload;
pub mod types;

pub use client::OpenRouterClient;
pub use error::OpenRouterError;
pub use types::{AssistantMessage, ChatMessage, ChatRelay, FileUpload, ModelSource, SendOptions};
