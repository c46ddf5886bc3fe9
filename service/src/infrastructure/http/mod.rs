use anyhow::Context;
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use serde_querystring::ParseMode;
use tokio::net;

use crate::infrastructure::AppState;
use crate::infrastructure::http::api::ApiError;
use crate::infrastructure::http::querystring::QueryStringConfig;
use handlers::health_check;
use handlers::sessions::{
    close_session, delete_session, discard_local_changes, get_session, open_session, publish,
    tag_suggestions, update_field,
};
use handlers::sites::{content_detail, list_drafts};

mod api;
mod handlers;
mod querystring;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
}

/// The dashboard's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl AppState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("http_request", method = ?request.method(), uri)
            },
        );
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = Router::new()
            .route("/health", get(health_check))
            .nest("/api", api_routes())
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(Extension(query_config()))
            .layer(trace_layer)
            .layer(prometheus_layer)
            .with_state(state);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self
            .listener
            .local_addr()
            .context("listener has no local address")?;
        tracing::debug!("listening on {}", address);
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

fn query_config() -> QueryStringConfig {
    QueryStringConfig::new(ParseMode::UrlEncoded)
        .ehandler(|e| ApiError::UnprocessableEntity(format!("Invalid editor location: {e}")))
}

fn api_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route("/sites/{handle}/editor", post(open_session::<S>))
        .route("/sites/{handle}/drafts", get(list_drafts::<S>))
        .route("/sites/{handle}/content/{id}", get(content_detail::<S>))
        .route(
            "/sessions/{key}",
            get(get_session::<S>).delete(delete_session::<S>),
        )
        .route("/sessions/{key}/fields", patch(update_field::<S>))
        .route("/sessions/{key}/tags", get(tag_suggestions::<S>))
        .route("/sessions/{key}/publish", post(publish::<S>))
        .route("/sessions/{key}/discard", post(discard_local_changes::<S>))
        .route("/sessions/{key}/close", post(close_session::<S>))
}
