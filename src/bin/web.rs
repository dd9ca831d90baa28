//! Roster console server: chat webhook plus control/report API.
//! Run with: cargo run --bin web
//! Configured from the environment: HOST, PORT, DATABASE_PATH, ADMIN_IDS,
//! SESSION_TIMEOUT_SECS, REAP_INTERVAL_SECS.

use actix_web::{web::Data, App, HttpServer};
use roster_console::{web, Config, Console, SqliteStore};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    if config.admin_ids.is_empty() {
        log::warn!("ADMIN_IDS is empty: only the public card catalog will answer");
    }

    let store = SqliteStore::open(&config.database_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    log::info!("Using database {}", config.database_path);

    let state: web::AppState = Data::new(Mutex::new(Console::new(
        Arc::new(store),
        config.admin_ids.clone(),
    )));

    // Background task: drop control sessions and dialogues nobody has touched for a while.
    let state_cleanup = state.clone();
    let (timeout, every) = (config.session_timeout, config.reap_interval);
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let mut console = match state_cleanup.lock() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            console.reap_idle(Instant::now(), timeout);
        }
    });

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(web::configure))
        .bind(bind)?
        .run()
        .await
}
