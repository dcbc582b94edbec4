// northpath-backend/src/service/team_service.rs

use crate::db::DbPool;
use crate::domain::team_invitation_model::Model as TeamInvitation;
use crate::domain::team_member_model::{Model as TeamMember, TeamRole};
use crate::domain::team_model::Model as Team;
use crate::error::{AppError, AppResult};
use crate::repository::team_invitation_repository::TeamInvitationRepository;
use crate::repository::team_repository::TeamRepository;
use crate::service::collaboration_service::Actor;
use crate::utils::email::EmailService;
use crate::utils::validation::mask_email;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(flatten)]
    pub team: Team,
    pub role: String,
    pub member_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub pending_invitations: Vec<TeamInvitation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
    pub team_id: Uuid,
    pub team_name: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResult {
    pub message: String,
    pub team_id: Uuid,
}

/// 招待トークン (32バイトの乱数を16進で)
pub fn generate_invitation_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub struct TeamService {
    team_repo: TeamRepository,
    invitation_repo: TeamInvitationRepository,
    email_service: Arc<EmailService>,
}

impl TeamService {
    pub fn new(db: DbPool, email_service: Arc<EmailService>) -> Self {
        Self {
            team_repo: TeamRepository::new(db.clone()),
            invitation_repo: TeamInvitationRepository::new(db),
            email_service,
        }
    }

    async fn find_team(&self, team_id: Uuid) -> AppResult<Team> {
        self.team_repo
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))
    }

    /// 作成者は admin として登録される
    pub async fn create_team(
        &self,
        actor: &Actor,
        name: &str,
        description: Option<String>,
    ) -> AppResult<TeamSummary> {
        let (team, member) = self
            .team_repo
            .create_team_with_owner(name.trim(), description, actor.user_id, &actor.email)
            .await?;

        info!(team_id = %team.id, owner_id = %actor.user_id, "Team created");

        Ok(TeamSummary {
            team,
            role: member.role,
            member_count: 1,
        })
    }

    pub async fn list_teams(&self, actor: &Actor) -> AppResult<Vec<TeamSummary>> {
        let memberships = self.team_repo.find_by_member(actor.user_id).await?;
        let mut teams = Vec::with_capacity(memberships.len());
        for (team, member) in memberships {
            let member_count = self.team_repo.count_members(team.id).await?;
            teams.push(TeamSummary {
                team,
                role: member.role,
                member_count,
            });
        }
        Ok(teams)
    }

    /// メンバーのみ参照できる
    pub async fn roster(&self, team_id: Uuid, actor: &Actor) -> AppResult<TeamRoster> {
        let team = self.find_team(team_id).await?;
        if self
            .team_repo
            .find_member(team_id, actor.user_id)
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let members = self.team_repo.find_members(team_id).await?;
        let pending_invitations = self
            .invitation_repo
            .find_by_team_id(team_id)
            .await?
            .into_iter()
            .filter(TeamInvitation::can_accept)
            .collect();

        Ok(TeamRoster {
            team,
            members,
            pending_invitations,
        })
    }

    /// admin メンバーだけが招待できる
    pub async fn invite_member(
        &self,
        team_id: Uuid,
        actor: &Actor,
        email: &str,
        role: TeamRole,
    ) -> AppResult<TeamInvitation> {
        let team = self.find_team(team_id).await?;
        let inviter = self.team_repo.find_member(team_id, actor.user_id).await?;
        if !inviter.is_some_and(|m| m.team_role().can_invite()) {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        let email = email.trim().to_lowercase();
        let invitation = TeamInvitation::new(
            team_id,
            email.clone(),
            role.to_string(),
            generate_invitation_token(),
            actor.user_id,
        );
        let invitation = self.invitation_repo.create_invitation(&invitation).await?;

        info!(
            team_id = %team_id,
            invitee = %mask_email(&email),
            role = %role,
            "Team invitation created"
        );

        if let Err(e) = self
            .email_service
            .send_team_invitation(
                &email,
                &team.name,
                &actor.display_name,
                &role.to_string(),
                &invitation.token,
            )
            .await
        {
            warn!(
                to_email = %mask_email(&email),
                error = %e,
                "Failed to send team invitation"
            );
        }

        Ok(invitation)
    }

    /// 招待内容の確認 (未ログインでも可)
    pub async fn preview_invitation(&self, token: &str) -> AppResult<InvitationPreview> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::BadRequest("Token required".to_string()));
        }

        let invitation = self
            .invitation_repo
            .find_pending_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired invitation".to_string()))?;
        if invitation.is_expired() {
            return Err(AppError::Gone("Invitation has expired".to_string()));
        }

        let team = self.find_team(invitation.team_id).await?;
        Ok(InvitationPreview {
            team_id: team.id,
            team_name: team.name,
            email: invitation.email,
            role: invitation.role,
            expires_at: invitation.expires_at,
        })
    }

    /// 招待を承諾してメンバーに加わる
    pub async fn accept_invitation(&self, token: &str, actor: &Actor) -> AppResult<JoinResult> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::BadRequest("Token required".to_string()));
        }

        let invitation = self
            .invitation_repo
            .find_pending_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid invitation".to_string()))?;
        if invitation.is_expired() {
            return Err(AppError::Gone("Invitation has expired".to_string()));
        }
        if !invitation.email.eq_ignore_ascii_case(&actor.email) {
            warn!(
                team_id = %invitation.team_id,
                user_id = %actor.user_id,
                "Invitation email mismatch"
            );
            return Err(AppError::Forbidden(
                "This invitation was sent to a different email address".to_string(),
            ));
        }
        if self
            .team_repo
            .find_member(invitation.team_id, actor.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You are already a member of this team".to_string(),
            ));
        }

        let role = invitation.role.parse().unwrap_or(TeamRole::Member);
        let team_id = invitation.team_id;
        self.team_repo
            .accept_invitation(&invitation, actor.user_id, role)
            .await?;

        info!(team_id = %team_id, user_id = %actor.user_id, "Joined team");

        Ok(JoinResult {
            message: "Successfully joined team".to_string(),
            team_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_token_is_random_hex() {
        let first = generate_invitation_token();
        let second = generate_invitation_token();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
