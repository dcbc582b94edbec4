// northpath-backend/src/api/dto/team_dto.rs

use crate::domain::team_member_model::TeamRole;
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use validator::Validate;

/// チーム作成リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "Team name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

/// チームメンバー招待リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: Option<String>,
}

impl InviteMemberRequest {
    /// 未指定なら member
    pub fn role(&self) -> AppResult<TeamRole> {
        match self.role.as_deref() {
            None => Ok(TeamRole::Member),
            Some(raw) => raw.parse().map_err(AppError::BadRequest),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationTokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1, message = "Token required"))]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_role_parsing() {
        let request = InviteMemberRequest {
            email: "member@example.edu".to_string(),
            role: None,
        };
        assert_eq!(request.role().unwrap(), TeamRole::Member);

        let request = InviteMemberRequest {
            email: "member@example.edu".to_string(),
            role: Some("Viewer".to_string()),
        };
        assert_eq!(request.role().unwrap(), TeamRole::Viewer);

        let request = InviteMemberRequest {
            email: "member@example.edu".to_string(),
            role: Some("owner".to_string()),
        };
        assert!(request.role().is_err());
    }

    #[test]
    fn test_team_name_length() {
        let request = CreateTeamRequest {
            name: String::new(),
            description: None,
        };
        assert!(request.validate().is_err());
    }
}
