//! services/api/src/bin/api.rs
//!
//! Wires the OpenAI, Commons and Postgres adapters into the flows and serves `/api`.

use api_lib::{
    adapters::{
        tts::parse_voice, CommonsImageSearchAdapter, DbAdapter, OpenAiCompletionAdapter,
        OpenAiImageAdapter, OpenAiTtsAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, ApiDoc, AppState},
};
use async_openai::{config::OpenAIConfig, types::audio::SpeechModel, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::Router;
use medha_core::FlowContext;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- Config and tracing ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(model = %config.content_model, "Medha API configured");

    // --- Record store ---
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    db_adapter.run_migrations().await?;
    info!("Database ready, migrations applied.");

    // --- Model, media and speech adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());
    if let Some(base_url) = &config.openai_base_url {
        openai_config = openai_config.with_api_base(base_url.clone());
    }
    let openai_client = Client::with_config(openai_config);

    let tts_voice = parse_voice(&config.tts_voice).ok_or_else(|| {
        ApiError::Internal(format!(
            "Unknown TTS_VOICE '{}'",
            config.tts_voice
        ))
    })?;

    let completion_adapter = Arc::new(OpenAiCompletionAdapter::new(
        openai_client.clone(),
        config.content_model.clone(),
    ));
    let image_adapter = Arc::new(OpenAiImageAdapter::new(
        openai_client.clone(),
        &config.image_model,
    ));
    let image_search_adapter = Arc::new(CommonsImageSearchAdapter::new(config.timeouts.auxiliary)?);
    let tts_adapter = Arc::new(OpenAiTtsAdapter::new(
        openai_client,
        SpeechModel::Tts1,
        tts_voice,
        config.tts_sample_rate,
    ));

    // --- Flows ---
    let app_state = Arc::new(AppState::new(FlowContext {
        completion: completion_adapter,
        images: image_adapter,
        image_search: image_search_adapter,
        speech: tts_adapter,
        db: db_adapter,
        timeouts: config.timeouts,
    }));

    // --- Router ---
    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-user-id")]);

    let app = Router::new()
        .merge(build_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- Serve ---
    info!("Listening on {} (docs at /swagger-ui)", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
