pub mod sql_query;
pub mod time;
