use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use cairn::app_config::AppConfig;
use cairn::context::AppState;
use cairn::db::{Database, DbConfig};
use env_logger::Env;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let database = Database::new();
    let store = database
        .initialize(&DbConfig::from_settings(&config.database)?)
        .await
        .context("Failed to initialize database")?;

    let bind = config.server.bind.clone();
    let state = Data::new(AppState::from_config(config, store)?);
    state
        .bootstrap()
        .await
        .context("Failed to seed roles and the initial administrator")?;
    let production = state.is_production();

    // Spawn rate limiter cleanup task
    let limits = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(300)); // Every 5 minutes
        loop {
            interval.tick().await;
            limits.rate_limits.cleanup();
            log::debug!("Rate limiter cleanup completed");
        }
    });

    log::info!("Listening on {}", bind);
    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(state.clone())
            .wrap(cairn::web::security_headers(production))
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(cairn::web::configure)
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is normal outside development.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
