//! Shared application state handed to every handler.

use std::time::Instant;

use mostrador_db::Database;

/// Cloning is cheap: the database handle wraps a reference-counted pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db,
            started_at: Instant::now(),
        }
    }
}
