pub mod chat_histories;
pub mod conversations;
pub mod db;
pub mod messages;
pub mod summaries;
