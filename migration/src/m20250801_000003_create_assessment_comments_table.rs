use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssessmentComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssessmentComments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssessmentComments::AssessmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssessmentComments::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AssessmentComments::UserEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssessmentComments::Content).text().not_null())
                    .col(ColumnDef::new(AssessmentComments::Section).string())
                    .col(
                        ColumnDef::new(AssessmentComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssessmentComments::UpdatedAt)
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
                    .name("fk_assessment_comments_assessment_id")
                    .from(AssessmentComments::Table, AssessmentComments::AssessmentId)
                    .to(Assessments::Table, Assessments::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assessment_comments_assessment_created")
                    .table(AssessmentComments::Table)
                    .col(AssessmentComments::AssessmentId)
                    .col(AssessmentComments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssessmentComments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssessmentComments {
    Table,
    Id,
    AssessmentId,
    UserId,
    UserEmail,
    Content,
    Section,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
}
