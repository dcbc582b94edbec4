// northpath-backend/src/api/mod.rs
use crate::config::stripe::StripeConfig;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::middleware::auth::{jwt_auth_middleware, optional_auth_middleware, AuthMiddlewareConfig};
use crate::service::{
    analytics_service::AnalyticsService, assessment_service::AssessmentService,
    chart_service::ChartService, collaboration_service::CollaborationService,
    feature_flag_service::FeatureFlagService, payment_service::PaymentService,
    report_service::ReportService, scenario_service::ScenarioService,
    subscription_service::SubscriptionService, team_service::TeamService,
};
use crate::utils::email::EmailService;
use crate::utils::jwt::JwtManager;
use axum::{middleware::from_fn_with_state, Router};
use handlers::{
    admin_handler, analysis_handler, analytics_handler, assessment_handler, chart_handler,
    collaboration_handler, feature_handler, payment_handler, report_handler, scenario_handler,
    subscription_handler, system_handler, team_handler, tier_handler,
};
use std::sync::Arc;

pub mod dto;
pub mod handlers;

/// アクセストークンを格納する Cookie 名
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub assessment_service: Arc<AssessmentService>,
    pub collaboration_service: Arc<CollaborationService>,
    pub team_service: Arc<TeamService>,
    pub chart_service: Arc<ChartService>,
    pub scenario_service: Arc<ScenarioService>,
    pub feature_flag_service: Arc<FeatureFlagService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub payment_service: Arc<PaymentService>,
    pub report_service: Arc<ReportService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub email_service: Arc<EmailService>,
    pub jwt_manager: Arc<JwtManager>,
    pub db: DbPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 接続プールと外部クライアントから全サービスを組み立てる
    pub fn new(
        db: DbPool,
        app_config: AppConfig,
        jwt_manager: Arc<JwtManager>,
        email_service: Arc<EmailService>,
        stripe_config: StripeConfig,
    ) -> Self {
        let feature_flag_service =
            Arc::new(FeatureFlagService::for_environment(&app_config.environment));
        let subscription_service = Arc::new(SubscriptionService::new(db.clone()));
        let assessment_service = Arc::new(AssessmentService::new(
            db.clone(),
            subscription_service.clone(),
            email_service.clone(),
            &app_config.admin_email,
        ));
        let payment_service = Arc::new(PaymentService::new(
            db.clone(),
            subscription_service.clone(),
            email_service.clone(),
            stripe_config,
            &app_config.frontend_url,
        ));

        Self {
            collaboration_service: Arc::new(CollaborationService::new(
                db.clone(),
                email_service.clone(),
            )),
            team_service: Arc::new(TeamService::new(db.clone(), email_service.clone())),
            chart_service: Arc::new(ChartService::new(
                db.clone(),
                assessment_service.clone(),
            )),
            scenario_service: Arc::new(ScenarioService::new(
                db.clone(),
                feature_flag_service.clone(),
            )),
            report_service: Arc::new(ReportService::new(assessment_service.clone())),
            analytics_service: Arc::new(AnalyticsService::new(db.clone())),
            assessment_service,
            feature_flag_service,
            subscription_service,
            payment_service,
            email_service,
            jwt_manager,
            db,
            config: Arc::new(app_config),
        }
    }
}

/// 全ルートを組み立てる (グローバルなレイヤーは main 側で付与)
pub fn app_router(app_state: AppState) -> Router {
    let auth_config =
        AuthMiddlewareConfig::new(app_state.jwt_manager.clone(), ACCESS_TOKEN_COOKIE);

    // トークンがあれば利用者を付与するだけのルート
    let public = Router::new()
        .merge(tier_handler::tier_public_router(app_state.clone()))
        .merge(assessment_handler::assessment_public_router(app_state.clone()))
        .merge(payment_handler::payment_public_router(app_state.clone()))
        .merge(team_handler::team_public_router(app_state.clone()))
        .route_layer(from_fn_with_state(
            auth_config.clone(),
            optional_auth_middleware,
        ));

    let protected = Router::new()
        .merge(assessment_handler::assessment_router(app_state.clone()))
        .merge(collaboration_handler::collaboration_router(app_state.clone()))
        .merge(analysis_handler::analysis_router(app_state.clone()))
        .merge(chart_handler::chart_router(app_state.clone()))
        .merge(scenario_handler::scenario_router(app_state.clone()))
        .merge(tier_handler::tier_router(app_state.clone()))
        .merge(feature_handler::feature_router(app_state.clone()))
        .merge(subscription_handler::subscription_router(app_state.clone()))
        .merge(payment_handler::payment_router(app_state.clone()))
        .merge(team_handler::team_router(app_state.clone()))
        .merge(report_handler::report_router(app_state.clone()))
        .merge(analytics_handler::analytics_router(app_state.clone()))
        .merge(admin_handler::admin_router(app_state))
        .route_layer(from_fn_with_state(auth_config, jwt_auth_middleware));

    Router::new()
        .merge(system_handler::system_router())
        .merge(public)
        .merge(protected)
}
