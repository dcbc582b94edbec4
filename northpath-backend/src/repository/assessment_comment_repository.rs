// northpath-backend/src/repository/assessment_comment_repository.rs

use crate::domain::assessment_comment_model::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as CommentEntity,
    Model as Comment,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

fn map_db_error(err: DbErr) -> AppError {
    AppError::InternalServerError(err.to_string())
}

pub struct AssessmentCommentRepository {
    db: DatabaseConnection,
}

impl AssessmentCommentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        assessment_id: Uuid,
        user_id: Uuid,
        user_email: &str,
        content: &str,
        section: Option<String>,
    ) -> AppResult<Comment> {
        let now = Utc::now();
        let active_model = CommentActiveModel {
            id: Set(Uuid::new_v4()),
            assessment_id: Set(assessment_id),
            user_id: Set(user_id),
            user_email: Set(user_email.to_string()),
            content: Set(content.to_string()),
            section: Set(section),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(&self.db).await.map_err(map_db_error)
    }

    /// 作成日時の昇順
    pub async fn find_by_assessment(&self, assessment_id: Uuid) -> AppResult<Vec<Comment>> {
        CommentEntity::find()
            .filter(CommentColumn::AssessmentId.eq(assessment_id))
            .order_by_asc(CommentColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_users_since(
        &self,
        user_ids: Vec<Uuid>,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Comment>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        CommentEntity::find()
            .filter(CommentColumn::UserId.is_in(user_ids))
            .filter(CommentColumn::CreatedAt.gte(since))
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }
}
