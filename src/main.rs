use dotenvy::dotenv;
use print_tracker::{
    bot::{self, BotData},
    config::{catalog, database, users},
    core::{pricing, production_type, user},
    errors::{Error, Result},
};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load config.toml
    let config = catalog::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {e}"))?;
    info!(
        production_types = config.production_types.len(),
        pricing = config.pricing.len(),
        "Configuration loaded"
    );

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Seed missing production types and prices
    production_type::seed_production_types(&db, &config.production_types).await?;
    pricing::seed_pricing(&db, &config.pricing).await?;

    // 6. Make sure somebody can grant permissions
    match users::supervisor_settings() {
        Some(settings) => {
            user::ensure_supervisor(&db, &settings).await?;
        }
        None => warn!("SUPERVISOR_USERNAME/SUPERVISOR_PASSWORD not set, no supervisor bootstrapped"),
    }

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(db, config.orders.code_prefix)).await
}
