// northpath-backend/src/repository/team_repository.rs

use crate::domain::team_member_model::{
    ActiveModel as TeamMemberActiveModel, Column as TeamMemberColumn, Entity as TeamMemberEntity,
    Model as TeamMember, TeamRole,
};
use crate::domain::team_invitation_model::{
    Column as TeamInvitationColumn, Entity as TeamInvitationEntity, Model as TeamInvitation,
};
use crate::domain::team_model::{
    ActiveModel as TeamActiveModel, Column as TeamColumn, Entity as TeamEntity, Model as Team,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

// Helper function to convert SeaORM errors to AppError
fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct TeamRepository {
    db: DatabaseConnection,
}

impl TeamRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// チームを作成し、作成者を admin として登録
    pub async fn create_team_with_owner(
        &self,
        name: &str,
        description: Option<String>,
        owner_id: Uuid,
        owner_email: &str,
    ) -> AppResult<(Team, TeamMember)> {
        let txn = self.db.begin().await.map_err(map_db_error)?;

        let team = TeamActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            owner_id: Set(owner_id),
            ..<TeamActiveModel as sea_orm::ActiveModelBehavior>::new()
        }
        .insert(&txn)
        .await
        .map_err(map_db_error)?;

        let now = Utc::now();
        let member = TeamMemberActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(team.id),
            user_id: Set(owner_id),
            email: Set(owner_email.to_lowercase()),
            role: Set(TeamRole::Admin.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(map_db_error)?;

        txn.commit().await.map_err(map_db_error)?;
        Ok((team, member))
    }

    /// 招待を受諾済みにしてメンバーを追加する。未受諾の招待でなければ何も変更しない
    pub async fn accept_invitation(
        &self,
        invitation: &TeamInvitation,
        user_id: Uuid,
        role: TeamRole,
    ) -> AppResult<TeamMember> {
        let txn = self.db.begin().await.map_err(map_db_error)?;
        let now = Utc::now();

        let claimed = TeamInvitationEntity::update_many()
            .col_expr(TeamInvitationColumn::AcceptedAt, Expr::value(Some(now)))
            .col_expr(TeamInvitationColumn::UpdatedAt, Expr::value(now))
            .filter(TeamInvitationColumn::Id.eq(invitation.id))
            .filter(TeamInvitationColumn::AcceptedAt.is_null())
            .exec(&txn)
            .await
            .map_err(map_db_error)?;
        if claimed.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_error)?;
            return Err(AppError::NotFound("Invalid invitation".to_string()));
        }

        let member = TeamMemberActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(invitation.team_id),
            user_id: Set(user_id),
            email: Set(invitation.email.to_lowercase()),
            role: Set(role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(map_db_error)?;

        txn.commit().await.map_err(map_db_error)?;
        Ok(member)
    }

    /// チームをIDで取得
    pub async fn find_by_id(&self, team_id: Uuid) -> AppResult<Option<Team>> {
        TeamEntity::find_by_id(team_id)
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// ユーザーが所属するチーム一覧
    pub async fn find_by_member(&self, user_id: Uuid) -> AppResult<Vec<(Team, TeamMember)>> {
        let memberships = TeamMemberEntity::find()
            .filter(TeamMemberColumn::UserId.eq(user_id))
            .find_also_related(TeamEntity)
            .order_by_asc(TeamMemberColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)?;

        Ok(memberships
            .into_iter()
            .filter_map(|(member, team)| team.map(|team| (team, member)))
            .collect())
    }

    pub async fn find_member(&self, team_id: Uuid, user_id: Uuid) -> AppResult<Option<TeamMember>> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(team_id))
            .filter(TeamMemberColumn::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_members(&self, team_id: Uuid) -> AppResult<Vec<TeamMember>> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(team_id))
            .order_by_asc(TeamMemberColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn count_members(&self, team_id: Uuid) -> AppResult<u64> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(team_id))
            .count(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_owned_by(&self, owner_id: Uuid) -> AppResult<Vec<Team>> {
        TeamEntity::find()
            .filter(TeamColumn::OwnerId.eq(owner_id))
            .order_by_asc(TeamColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }
}
