use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;

use joycycles_fertility::config::AppConfig;
use joycycles_fertility::logging;
use joycycles_fertility::routes;
use joycycles_fertility::store::{InMemoryHistoryStore, PgHistoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logging::init();

    let config = AppConfig::from_env()?;

    let app: Router = match &config.database_url {
        Some(url) => {
            let store = PgHistoryStore::connect(url, config.max_connections).await?;
            routes::app(store)
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL not set, history is kept in memory only");
            routes::app(InMemoryHistoryStore::new())
        }
    };

    tracing::info!("🧠 Server running at {}", config.bind_addr);

    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
