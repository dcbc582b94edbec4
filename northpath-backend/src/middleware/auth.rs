// northpath-backend/src/middleware/auth.rs

use crate::config::AppConfig;
use crate::domain::feature_flag::FeatureContext;
use crate::error::AppError;
use crate::logging::RequestContext;
use crate::service::collaboration_service::Actor;
use crate::utils::jwt::{JwtManager, UserClaims};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};
use uuid::Uuid;

/// JWT認証ミドルウェアの設定
#[derive(Clone)]
pub struct AuthMiddlewareConfig {
    pub jwt_manager: Arc<JwtManager>,
    pub access_token_cookie_name: String,
    pub skip_auth_paths: Vec<String>,
    pub admin_only_paths: Vec<String>,
}

impl AuthMiddlewareConfig {
    pub fn new(jwt_manager: Arc<JwtManager>, access_token_cookie_name: &str) -> Self {
        Self {
            jwt_manager,
            access_token_cookie_name: access_token_cookie_name.to_string(),
            skip_auth_paths: vec![],
            admin_only_paths: vec!["/api/admin".to_string()],
        }
    }
}

/// 認証済みユーザー情報を格納するエクステンション
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: UserClaims,
    pub access_token: String,
}

impl AuthenticatedUser {
    pub fn new(claims: UserClaims, access_token: String) -> Self {
        Self {
            claims,
            access_token,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.claims.user_id
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    /// 表示名 (未設定ならメールアドレス)
    pub fn display_name(&self) -> &str {
        self.claims.name.as_deref().unwrap_or(&self.claims.email)
    }

    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    /// 機能フラグ評価用のコンテキスト
    pub fn feature_context(&self, tier: Option<&str>) -> FeatureContext {
        FeatureContext {
            user_id: Some(self.user_id().to_string()),
            tier: tier.map(str::to_string),
            groups: self.claims.groups.clone(),
        }
    }

    /// サービス層に渡す操作者
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id(),
            email: self.email().to_string(),
            display_name: self.display_name().to_string(),
            is_admin: self.is_admin(),
        }
    }

    /// 管理者以外は拒否
    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// JWT認証ミドルウェア
pub async fn jwt_auth_middleware(
    State(config): State<AuthMiddlewareConfig>,
    headers: HeaderMap,
    cookie_jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    // 認証をスキップするパスかチェック
    if should_skip_auth(&path, &config.skip_auth_paths) {
        debug!("Skipping auth for path: {}", path);
        return Ok(next.run(request).await);
    }

    // トークンを抽出
    let token = extract_token(&headers, &cookie_jar, &config.access_token_cookie_name).ok_or_else(
        || {
            warn!(path = %path, "Missing authentication token");
            AppError::Unauthorized("Authentication required".to_string())
        },
    )?;

    // JWTを検証
    let access_claims = config
        .jwt_manager
        .verify_access_token(&token)
        .map_err(|e| {
            warn!(path = %path, error = %e, "Invalid access token");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

    let user_claims = access_claims.user;

    // 管理者専用パス
    if should_require_admin(&path, &config.admin_only_paths) && !user_claims.is_admin() {
        warn!(
            user_id = %user_claims.user_id,
            role = %user_claims.role,
            path = %path,
            "Access denied: Admin permission required"
        );
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    if let Some(context) = request.extensions_mut().get_mut::<RequestContext>() {
        context.user_id = Some(user_claims.user_id);
    }

    debug!(
        user_id = %user_claims.user_id,
        role = %user_claims.role,
        path = %path,
        "Authenticated request"
    );

    request
        .extensions_mut()
        .insert(AuthenticatedUser::new(user_claims, token));

    Ok(next.run(request).await)
}

/// 公開ルート用: トークンがあれば検証して付与し、なくても通す
pub async fn optional_auth_middleware(
    State(config): State<AuthMiddlewareConfig>,
    headers: HeaderMap,
    cookie_jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&headers, &cookie_jar, &config.access_token_cookie_name) {
        match config.jwt_manager.verify_access_token(&token) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(AuthenticatedUser::new(claims.user, token));
            }
            Err(e) => {
                debug!(error = %e, "Ignoring invalid token on public route");
            }
        }
    }
    next.run(request).await
}

/// CORS ミドルウェア設定
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("stripe-signature"),
        ])
        .allow_credentials(true) // Cookie送信を許可
        .max_age(Duration::from_secs(3600)) // プリフライトリクエストのキャッシュ時間
}

const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none';",
    ),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=()",
    ),
];

/// セキュリティヘッダーミドルウェア
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}

// --- ヘルパー関数 ---

/// リクエストからトークンを抽出
fn extract_token(headers: &HeaderMap, cookie_jar: &CookieJar, cookie_name: &str) -> Option<String> {
    // Authorization ヘッダーからトークンを取得
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    // Cookieからトークンを取得（フォールバック）
    let cookie_token = cookie_jar
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string());

    auth_header.or(cookie_token)
}

/// 認証をスキップするパスかチェック
fn should_skip_auth(path: &str, skip_paths: &[String]) -> bool {
    skip_paths
        .iter()
        .any(|skip_path| path.starts_with(skip_path.as_str()))
}

/// 管理者権限が必要なパスかチェック
fn should_require_admin(path: &str, admin_paths: &[String]) -> bool {
    admin_paths
        .iter()
        .any(|admin_path| path.starts_with(admin_path.as_str()))
}

// --- Axum Extractors ---

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl<S> axum::extract::OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_should_skip_auth() {
        let skip_paths = vec!["/health".to_string(), "/api/tiers".to_string()];

        assert!(should_skip_auth("/health", &skip_paths));
        assert!(should_skip_auth("/api/tiers/one-time-diagnostic", &skip_paths));
        assert!(!should_skip_auth("/api/assessments", &skip_paths));
    }

    #[test]
    fn test_should_require_admin() {
        let admin_paths = vec!["/api/admin".to_string()];
        assert!(should_require_admin("/api/admin/analytics", &admin_paths));
        assert!(!should_require_admin("/api/analytics/team-collaboration", &admin_paths));
    }

    #[test]
    fn test_extract_token_prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        let jar = CookieJar::new().add(Cookie::new("access_token", "cookie-token"));

        assert_eq!(
            extract_token(&headers, &jar, "access_token"),
            Some("header-token".to_string())
        );
        assert_eq!(
            extract_token(&HeaderMap::new(), &jar, "access_token"),
            Some("cookie-token".to_string())
        );
        assert_eq!(
            extract_token(&HeaderMap::new(), &CookieJar::new(), "access_token"),
            None
        );
    }

    #[test]
    fn test_extract_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers, &CookieJar::new(), "access_token"), None);
    }
}
