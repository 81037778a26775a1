//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config)?;

    // Primeira leitura em segundo plano: o servidor já responde com `loading: true`
    let lead_service = app_state.lead_service.clone();
    tokio::spawn(async move {
        if let Err(e) = lead_service.refetch().await {
            tracing::warn!("Leitura inicial dos leads falhou: {}", e);
        }
    });

    let lead_routes = Router::new()
        .route("/", get(handlers::leads::list_leads))
        .route("/refetch", post(handlers::leads::refetch_leads))
        .route("/{id}", get(handlers::leads::get_lead))
        .route("/{id}/nearby", get(handlers::leads::get_nearby_leads));

    let dashboard_routes = Router::new()
        .route("/metrics", get(handlers::dashboard::get_metrics));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/leads", lead_routes)
        .nest("/api/dashboard", dashboard_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
