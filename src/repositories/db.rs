use std::sync::Arc;

use crate::db::{self, Database};

pub async fn get_db() -> Result<Arc<Database>, String> {
    db::get_db().await
}
