mod routes;
mod state;

use std::sync::{Arc, Mutex};

use fury::config::Config;
use fury::db::FuryDb;
use fury::utils;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::load();

    let data_dir = utils::get_default_dbdir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("fury.db");

    let db = FuryDb::init(&db_path)?;
    let seeded = db.ensure_defaults()?;
    if seeded > 0 {
        log::info!("seeded {} default categories", seeded);
    }

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        db_path,
        config,
    };

    let app = routes::router(state);

    let addr = std::env::var("FURY_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("fury-server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
