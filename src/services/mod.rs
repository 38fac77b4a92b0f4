pub mod attachments;
pub mod chat;
pub mod conversation;
pub mod openrouter;
pub mod pdf_text;
pub mod summary;
