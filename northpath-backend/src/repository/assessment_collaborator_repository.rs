// northpath-backend/src/repository/assessment_collaborator_repository.rs

use crate::domain::assessment_collaborator_model::{
    ActiveModel as CollaboratorActiveModel, Column as CollaboratorColumn,
    Entity as CollaboratorEntity, Model as Collaborator,
};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct AssessmentCollaboratorRepository {
    db: DatabaseConnection,
}

impl AssessmentCollaboratorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_assessment(&self, assessment_id: Uuid) -> AppResult<Vec<Collaborator>> {
        CollaboratorEntity::find()
            .filter(CollaboratorColumn::AssessmentId.eq(assessment_id))
            .order_by_asc(CollaboratorColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_email(
        &self,
        assessment_id: Uuid,
        email: &str,
    ) -> AppResult<Option<Collaborator>> {
        CollaboratorEntity::find()
            .filter(CollaboratorColumn::AssessmentId.eq(assessment_id))
            .filter(CollaboratorColumn::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(map_db_error)
    }

    /// (assessment_id, email) が既にあれば役割を更新する
    pub async fn upsert(
        &self,
        assessment_id: Uuid,
        email: &str,
        role: &str,
        invited_by: Uuid,
    ) -> AppResult<Collaborator> {
        let now = Utc::now();
        let active_model = CollaboratorActiveModel {
            id: Set(Uuid::new_v4()),
            assessment_id: Set(assessment_id),
            email: Set(email.to_lowercase()),
            user_id: Set(None),
            role: Set(role.to_string()),
            invited_by: Set(invited_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        CollaboratorEntity::insert(active_model)
            .on_conflict(
                OnConflict::columns([CollaboratorColumn::AssessmentId, CollaboratorColumn::Email])
                    .update_columns([CollaboratorColumn::Role, CollaboratorColumn::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;

        self.find_by_email(assessment_id, email)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Collaborator upsert failed".to_string()))
    }

    /// 招待されたユーザーが初めてアクセスしたときに user_id を紐付ける
    pub async fn link_user(&self, collaborator: Collaborator, user_id: Uuid) -> AppResult<Collaborator> {
        let mut active_model: CollaboratorActiveModel = collaborator.into();
        active_model.user_id = Set(Some(user_id));
        active_model.updated_at = Set(Utc::now());
        active_model.update(&self.db).await.map_err(map_db_error)
    }

    pub async fn delete_by_email(&self, assessment_id: Uuid, email: &str) -> AppResult<u64> {
        let result = CollaboratorEntity::delete_many()
            .filter(CollaboratorColumn::AssessmentId.eq(assessment_id))
            .filter(CollaboratorColumn::Email.eq(email.to_lowercase()))
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected)
    }
}
