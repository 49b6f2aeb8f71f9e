//! Upgrades databases created before custom roles existed.
//!
//! Every user without a role id is pointed at the built-in role matching
//! their legacy role. Pass a username to also promote that user to
//! super_admin.
//!
//! ```text
//! cairn-migrate-roles [username]
//! ```

use anyhow::Context;
use cairn::app_config::AppConfig;
use cairn::auth::{backfill_role_ids, promote_to_super_admin};
use cairn::db::{Database, DbConfig};
use env_logger::Env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let store = Database::new()
        .initialize(&DbConfig::from_settings(&config.database)?)
        .await
        .context("Failed to initialize database")?;

    let updated = backfill_role_ids(store.as_ref()).await?;
    log::info!("Assigned role ids to {} users", updated);

    if let Some(username) = std::env::args().nth(1) {
        let user = promote_to_super_admin(store.as_ref(), Some(&username)).await?;
        log::info!("Promoted {} to super_admin", user.username);
    }

    Ok(())
}
