// tests/common/auth_helper.rs

use northpath_backend::api::AppState;
use northpath_backend::utils::jwt::UserClaims;
use uuid::Uuid;

/// テスト用のユーザー情報 (トークンは認証基盤の代わりにここで発行する)
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
}

fn issue(state: &AppState, email: &str, role: &str, groups: Vec<String>) -> TestUser {
    let id = Uuid::new_v4();
    let access_token = state
        .jwt_manager
        .generate_access_token(UserClaims {
            user_id: id,
            email: email.to_string(),
            name: Some(format!("Test {}", role)),
            role: role.to_string(),
            groups,
        })
        .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        access_token,
    }
}

pub fn create_user(state: &AppState) -> TestUser {
    let email = format!("user{}@example.edu", &Uuid::new_v4().simple().to_string()[..8]);
    issue(state, &email, "user", vec![])
}

pub fn create_user_with_email(state: &AppState, email: &str) -> TestUser {
    issue(state, email, "user", vec![])
}

pub fn create_admin(state: &AppState) -> TestUser {
    issue(state, "admin@northpath.test", "admin", vec![])
}
