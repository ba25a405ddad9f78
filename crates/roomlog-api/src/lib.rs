pub mod entries;
pub mod error;
pub mod storage;
pub mod timesheets;

use std::sync::Arc;

use roomlog_db::Database;

use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
}
