use quire_common::database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::drafts::DraftStoreAdapter;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::sessions::SessionRegistry;
use crate::infrastructure::settings::Settings;
use crate::infrastructure::{AppStateImpl, ServiceBackend};

mod domain;
mod infrastructure;
#[cfg(test)]
mod test_utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = database::connect(&settings.database).await?;
    tracing::info!("connected to database");

    let drafts = DraftStoreAdapter::from_dir(settings.drafts_dir.as_deref())?;
    let backend = ServiceBackend::new(database, drafts, settings.links.clone());
    let sessions = SessionRegistry::new(settings.session_idle_timeout());
    let state = AppStateImpl::new(backend, sessions);

    let server_config = HttpServerConfig {
        port: &settings.server_port,
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
