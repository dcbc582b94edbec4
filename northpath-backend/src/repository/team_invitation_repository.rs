// northpath-backend/src/repository/team_invitation_repository.rs

use crate::domain::team_invitation_model::{
    ActiveModel as TeamInvitationActiveModel, Column as TeamInvitationColumn,
    Entity as TeamInvitationEntity, Model as TeamInvitation,
};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct TeamInvitationRepository {
    db: DatabaseConnection,
}

impl TeamInvitationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_invitation(&self, invitation: &TeamInvitation) -> AppResult<TeamInvitation> {
        let active_model = TeamInvitationActiveModel {
            id: Set(invitation.id),
            team_id: Set(invitation.team_id),
            email: Set(invitation.email.clone()),
            role: Set(invitation.role.clone()),
            token: Set(invitation.token.clone()),
            invited_by: Set(invitation.invited_by),
            expires_at: Set(invitation.expires_at),
            accepted_at: Set(invitation.accepted_at),
            created_at: Set(invitation.created_at),
            updated_at: Set(invitation.updated_at),
        };

        active_model.insert(&self.db).await.map_err(map_db_error)
    }

    /// 未承諾の招待をトークンで取得
    pub async fn find_pending_by_token(&self, token: &str) -> AppResult<Option<TeamInvitation>> {
        TeamInvitationEntity::find()
            .filter(TeamInvitationColumn::Token.eq(token))
            .filter(TeamInvitationColumn::AcceptedAt.is_null())
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_team_id(&self, team_id: Uuid) -> AppResult<Vec<TeamInvitation>> {
        TeamInvitationEntity::find()
            .filter(TeamInvitationColumn::TeamId.eq(team_id))
            .order_by_desc(TeamInvitationColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// 期限内で未承諾の招待数
    pub async fn count_pending_by_team(&self, team_id: Uuid) -> AppResult<u64> {
        TeamInvitationEntity::find()
            .filter(TeamInvitationColumn::TeamId.eq(team_id))
            .filter(TeamInvitationColumn::AcceptedAt.is_null())
            .filter(TeamInvitationColumn::ExpiresAt.gt(Utc::now()))
            .count(&self.db)
            .await
            .map_err(map_db_error)
    }
}
