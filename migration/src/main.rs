use quire_common::database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::migration::Migration;
use crate::domain::quire_tables;
use crate::infrastructure::{persistence::PersistenceAdapter, settings::Settings};

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let database = database::connect(&settings.database).await?;
    tracing::info!("connected to database");
    let persistence = PersistenceAdapter::new(database);

    let migration = Migration::new(quire_tables(), persistence);
    let created = migration.migrate().await?;
    tracing::info!(?created, "schema migrated");

    Ok(())
}
