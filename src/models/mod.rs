pub mod chat_history;
pub mod conversation;
pub mod message;
pub mod summary;
