// northpath-backend/src/domain/team_invitation_model.rs

use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 招待の有効期間 (日)
pub const INVITATION_VALID_DAYS: i64 = 7;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "team_invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub role: String,
    #[sea_orm(unique)]
    pub token: String,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team_model::Entity",
        from = "Column::TeamId",
        to = "super::team_model::Column::Id",
        on_delete = "Cascade"
    )]
    Team,
}

impl Related<super::team_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(team_id: Uuid, email: String, role: String, token: String, invited_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            email,
            role,
            token,
            invited_by,
            expires_at: now + Duration::days(INVITATION_VALID_DAYS),
            accepted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_accept(&self) -> bool {
        !self.is_accepted() && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Model {
        Model::new(
            Uuid::new_v4(),
            "member@example.com".to_string(),
            "member".to_string(),
            "token".to_string(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_new_invitation_expires_in_seven_days() {
        let invitation = invitation();
        let days = (invitation.expires_at - invitation.created_at).num_days();
        assert_eq!(days, INVITATION_VALID_DAYS);
        assert!(invitation.can_accept());
    }

    #[test]
    fn test_expired_and_accepted_invitations() {
        let mut invitation = invitation();
        assert!(invitation.is_expired_at(Utc::now() + Duration::days(8)));

        invitation.accepted_at = Some(Utc::now());
        assert!(!invitation.can_accept());

        let mut stale = self::invitation();
        stale.expires_at = Utc::now() - Duration::hours(1);
        assert!(stale.is_expired());
        assert!(!stale.can_accept());
    }
}
