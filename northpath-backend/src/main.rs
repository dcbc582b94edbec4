// northpath-backend/src/main.rs
use axum::middleware::from_fn;
use migration::{Migrator, MigratorTrait};
use northpath_backend::api::{app_router, AppState};
use northpath_backend::config::{stripe::StripeConfig, AppConfig};
use northpath_backend::db;
use northpath_backend::logging::{init_tracing, inject_request_context, logging_middleware};
use northpath_backend::middleware::auth::{cors_layer, security_headers_middleware};
use northpath_backend::utils::email::EmailService;
use northpath_backend::utils::jwt::JwtManager;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("northpath_backend=info,tower_http=info");

    tracing::info!("Starting NorthPath backend server...");

    let app_config = AppConfig::from_env()?;
    tracing::info!(
        environment = %app_config.environment,
        bind = %app_config.bind_address(),
        "Configuration loaded"
    );

    // スキーマ名を環境変数から取得（オプション）
    let schema_name = env::var("DB_SCHEMA").ok();
    let db_pool = db::connect(&app_config, schema_name.as_deref()).await?;
    tracing::info!("Database pool created successfully.");

    Migrator::up(&db_pool, None).await?;
    tracing::info!("Database migrations applied.");

    let jwt_manager = Arc::new(JwtManager::from_env()?);
    let email_service = Arc::new(EmailService::from_env(&app_config.frontend_url)?);
    let stripe_config = StripeConfig::from_env()?;

    let app_state = AppState::new(
        db_pool,
        app_config.clone(),
        jwt_manager,
        email_service,
        stripe_config,
    );

    // 後に追加したレイヤーほど外側で実行される
    let app = app_router(app_state)
        .layer(from_fn(logging_middleware))
        .layer(from_fn(inject_request_context))
        .layer(from_fn(security_headers_middleware))
        .layer(RequestBodyLimitLayer::new(app_config.server.body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            app_config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&app_config))
        .layer(TraceLayer::new_for_http());

    let bind_address = app_config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Router configured. Server listening on {}", bind_address);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
