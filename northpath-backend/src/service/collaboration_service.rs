// northpath-backend/src/service/collaboration_service.rs

//! 診断の共同編集者とコメント

use crate::db::DbPool;
use crate::domain::assessment_collaborator_model::{CollaboratorRole, Model as Collaborator};
use crate::domain::assessment_comment_model::Model as Comment;
use crate::domain::assessment_model::Model as Assessment;
use crate::error::{AppError, AppResult};
use crate::repository::assessment_collaborator_repository::AssessmentCollaboratorRepository;
use crate::repository::assessment_comment_repository::AssessmentCommentRepository;
use crate::repository::assessment_repository::AssessmentRepository;
use crate::utils::email::EmailService;
use crate::utils::validation::mask_email;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_COMMENT_LENGTH: usize = 2000;

/// 操作者
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

/// 診断に対する操作者の立場
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentAccess {
    Owner,
    SystemAdmin,
    Collaborator(CollaboratorRole),
    None,
}

impl AssessmentAccess {
    pub fn can_view(&self) -> bool {
        !matches!(self, AssessmentAccess::None)
    }

    pub fn can_manage(&self) -> bool {
        match self {
            AssessmentAccess::Owner | AssessmentAccess::SystemAdmin => true,
            AssessmentAccess::Collaborator(role) => role.can_manage(),
            AssessmentAccess::None => false,
        }
    }

    pub fn can_comment(&self) -> bool {
        match self {
            AssessmentAccess::Owner | AssessmentAccess::SystemAdmin => true,
            AssessmentAccess::Collaborator(role) => role.can_comment(),
            AssessmentAccess::None => false,
        }
    }
}

pub fn resolve_access(
    assessment: &Assessment,
    actor: &Actor,
    membership: Option<&Collaborator>,
) -> AssessmentAccess {
    if assessment.is_owned_by(actor.user_id, &actor.email) {
        AssessmentAccess::Owner
    } else if let Some(collaborator) = membership {
        AssessmentAccess::Collaborator(collaborator.collaborator_role())
    } else if actor.is_admin {
        AssessmentAccess::SystemAdmin
    } else {
        AssessmentAccess::None
    }
}

/// コメント本文の検証 (前後の空白を除いて 1..=2000 文字)
pub fn validate_comment(content: &str) -> AppResult<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "Comment content is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(trimmed)
}

pub struct CollaborationService {
    assessment_repo: AssessmentRepository,
    collaborator_repo: AssessmentCollaboratorRepository,
    comment_repo: AssessmentCommentRepository,
    email_service: Arc<EmailService>,
}

impl CollaborationService {
    pub fn new(db: DbPool, email_service: Arc<EmailService>) -> Self {
        Self {
            assessment_repo: AssessmentRepository::new(db.clone()),
            collaborator_repo: AssessmentCollaboratorRepository::new(db.clone()),
            comment_repo: AssessmentCommentRepository::new(db),
            email_service,
        }
    }

    async fn load(&self, assessment_id: Uuid, actor: &Actor) -> AppResult<(Assessment, AssessmentAccess)> {
        let assessment = self
            .assessment_repo
            .find_by_id(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

        let mut membership = self
            .collaborator_repo
            .find_by_email(assessment_id, &actor.email)
            .await?;

        // 招待時はメールのみなので初回アクセスで利用者IDを紐付ける
        if let Some(collaborator) = membership.take() {
            membership = Some(if collaborator.user_id.is_none() {
                self.collaborator_repo
                    .link_user(collaborator, actor.user_id)
                    .await?
            } else {
                collaborator
            });
        }

        let access = resolve_access(&assessment, actor, membership.as_ref());
        Ok((assessment, access))
    }

    pub async fn list_collaborators(
        &self,
        assessment_id: Uuid,
        actor: &Actor,
    ) -> AppResult<Vec<Collaborator>> {
        let (_, access) = self.load(assessment_id, actor).await?;
        if !access.can_view() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        self.collaborator_repo.find_by_assessment(assessment_id).await
    }

    pub async fn add_collaborator(
        &self,
        assessment_id: Uuid,
        actor: &Actor,
        email: &str,
        role: CollaboratorRole,
    ) -> AppResult<Collaborator> {
        let (assessment, access) = self.load(assessment_id, actor).await?;
        if !access.can_manage() {
            return Err(AppError::Forbidden(
                "Only assessment owners and admins can add collaborators".to_string(),
            ));
        }

        let email = email.trim().to_lowercase();
        let collaborator = self
            .collaborator_repo
            .upsert(assessment.id, &email, &role.to_string(), actor.user_id)
            .await?;

        info!(
            assessment_id = %assessment.id,
            collaborator = %mask_email(&email),
            role = %role,
            "Collaborator added"
        );

        if let Err(e) = self
            .email_service
            .send_collaborator_invitation(
                &email,
                &actor.display_name,
                &role.to_string(),
                &assessment.id.to_string(),
            )
            .await
        {
            warn!(
                to_email = %mask_email(&email),
                error = %e,
                "Failed to send collaborator invitation"
            );
        }

        Ok(collaborator)
    }

    /// 所有者・管理権限者、または本人のみ削除できる
    pub async fn remove_collaborator(
        &self,
        assessment_id: Uuid,
        actor: &Actor,
        email: &str,
    ) -> AppResult<()> {
        let (_, access) = self.load(assessment_id, actor).await?;
        let email = email.trim().to_lowercase();
        let is_self = email.eq_ignore_ascii_case(&actor.email);
        if !access.can_manage() && !is_self {
            return Err(AppError::Forbidden(
                "Unauthorized to remove this collaborator".to_string(),
            ));
        }

        let removed = self
            .collaborator_repo
            .delete_by_email(assessment_id, &email)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound("Collaborator not found".to_string()));
        }

        info!(
            assessment_id = %assessment_id,
            collaborator = %mask_email(&email),
            "Collaborator removed"
        );
        Ok(())
    }

    pub async fn list_comments(&self, assessment_id: Uuid, actor: &Actor) -> AppResult<Vec<Comment>> {
        let (_, access) = self.load(assessment_id, actor).await?;
        if !access.can_view() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        self.comment_repo.find_by_assessment(assessment_id).await
    }

    pub async fn add_comment(
        &self,
        assessment_id: Uuid,
        actor: &Actor,
        content: &str,
        section: Option<String>,
    ) -> AppResult<Comment> {
        let content = validate_comment(content)?;
        let (_, access) = self.load(assessment_id, actor).await?;
        if !access.can_comment() {
            return Err(AppError::Forbidden(
                "You do not have permission to comment on this assessment".to_string(),
            ));
        }

        self.comment_repo
            .create(assessment_id, actor.user_id, &actor.email, content, section)
            .await
    }
}
