use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fury::config::Config;
use fury::db::FuryDb;

/// Shared application state. The connection behind the mutex serves the
/// short read/write endpoints; the import pipeline opens its own
/// connections from `db_path` for its worker pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<FuryDb>>,
    pub db_path: PathBuf,
    pub config: Config,
}
