use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod db;
mod model;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let db_pool = web::Data::new(state.db_pool.clone());
    let analysis_service = web::Data::from(state.analysis_service.clone());
    let case_service = web::Data::from(state.case_service.clone());
    let chat_service = web::Data::from(state.chat_service.clone());
    let settings_service = web::Data::from(state.settings_service.clone());

    tracing::info!(
        workers = state.workers.len(),
        "Starting case intel server on {}",
        bind_addr
    );

    HttpServer::new(move || {
        App::new()
            .app_data(db_pool.clone())
            .app_data(analysis_service.clone())
            .app_data(case_service.clone())
            .app_data(chat_service.clone())
            .app_data(settings_service.clone())
            .app_data(web::JsonConfig::default().limit(32 * 1024 * 1024))
            .configure(api::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
