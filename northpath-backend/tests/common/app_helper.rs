// tests/common/app_helper.rs

use axum::Router;
use northpath_backend::{
    api::{app_router, AppState},
    config::{stripe::StripeConfig, AppConfig},
    utils::{
        email::{EmailConfig, EmailService},
        jwt::{JwtConfig, JwtManager},
    },
};
use std::sync::Arc;

use crate::common;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: common::db::TestDatabase,
}

/// 全ルートを組み込んだアプリ (メールと決済は開発モード)
pub async fn setup_app() -> TestApp {
    common::init_test_env();
    let db = common::db::TestDatabase::new().await;

    let app_config = AppConfig::for_testing();
    let jwt_manager = Arc::new(
        JwtManager::new(JwtConfig::for_secret(&app_config.jwt_secret))
            .expect("Failed to create JWT manager"),
    );
    let email_service = Arc::new(
        EmailService::new(EmailConfig::default(), &app_config.frontend_url)
            .expect("Failed to create email service"),
    );

    let state = AppState::new(
        db.connection.clone(),
        app_config,
        jwt_manager,
        email_service,
        StripeConfig::development(),
    );

    TestApp {
        router: app_router(state.clone()),
        state,
        db,
    }
}
