use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assessments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assessments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // 未ログインの提出は NULL
                    .col(ColumnDef::new(Assessments::UserId).uuid())
                    .col(ColumnDef::new(Assessments::Tier).string().not_null())
                    .col(
                        ColumnDef::new(Assessments::AssessmentType)
                            .string()
                            .not_null()
                            .default("organizational"),
                    )
                    .col(
                        ColumnDef::new(Assessments::OrganizationType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assessments::InstitutionName).string())
                    .col(ColumnDef::new(Assessments::ContactEmail).string())
                    .col(ColumnDef::new(Assessments::ContactName).string())
                    .col(ColumnDef::new(Assessments::Responses).json_binary().not_null())
                    .col(
                        ColumnDef::new(Assessments::UploadedFiles)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Assessments::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Assessments::AnalysisResults).json_binary())
                    .col(ColumnDef::new(Assessments::AiReadinessScore).double())
                    .col(ColumnDef::new(Assessments::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Assessments::SubscriptionStatus).string())
                    .col(
                        ColumnDef::new(Assessments::SubscriptionExpiresAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(Assessments::LastPaymentDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Assessments::StripeSessionId).string())
                    .col(
                        ColumnDef::new(Assessments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Assessments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assessments_user_id")
                    .table(Assessments::Table)
                    .col(Assessments::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assessments_contact_email")
                    .table(Assessments::Table)
                    .col(Assessments::ContactEmail)
                    .to_owned(),
            )
            .await?;

        // 期限切れ間近の契約検索用
        manager
            .create_index(
                Index::create()
                    .name("idx_assessments_subscription")
                    .table(Assessments::Table)
                    .col(Assessments::SubscriptionStatus)
                    .col(Assessments::SubscriptionExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assessments_created_at")
                    .table(Assessments::Table)
                    .col(Assessments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assessments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
    UserId,
    Tier,
    AssessmentType,
    OrganizationType,
    InstitutionName,
    ContactEmail,
    ContactName,
    Responses,
    UploadedFiles,
    Status,
    AnalysisResults,
    AiReadinessScore,
    SubmittedAt,
    SubscriptionStatus,
    SubscriptionExpiresAt,
    LastPaymentDate,
    StripeSessionId,
    CreatedAt,
    UpdatedAt,
}
