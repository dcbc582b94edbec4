use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssessmentCollaborators::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssessmentCollaborators::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssessmentCollaborators::AssessmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssessmentCollaborators::Email)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssessmentCollaborators::UserId).uuid())
                    .col(
                        ColumnDef::new(AssessmentCollaborators::Role)
                            .string()
                            .not_null()
                            .default("COLLABORATOR"),
                    )
                    .col(
                        ColumnDef::new(AssessmentCollaborators::InvitedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssessmentCollaborators::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssessmentCollaborators::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_assessment_collaborators_assessment_id")
                    .from(
                        AssessmentCollaborators::Table,
                        AssessmentCollaborators::AssessmentId,
                    )
                    .to(Assessments::Table, Assessments::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        // 追加は (assessment_id, email) の upsert
        manager
            .create_index(
                Index::create()
                    .name("idx_assessment_collaborators_unique")
                    .table(AssessmentCollaborators::Table)
                    .col(AssessmentCollaborators::AssessmentId)
                    .col(AssessmentCollaborators::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assessment_collaborators_email")
                    .table(AssessmentCollaborators::Table)
                    .col(AssessmentCollaborators::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(AssessmentCollaborators::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum AssessmentCollaborators {
    Table,
    Id,
    AssessmentId,
    Email,
    UserId,
    Role,
    InvitedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
}
