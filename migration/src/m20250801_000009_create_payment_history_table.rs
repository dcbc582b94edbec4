use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentHistory::UserId).uuid().not_null())
                    .col(ColumnDef::new(PaymentHistory::AssessmentId).uuid())
                    .col(ColumnDef::new(PaymentHistory::Tier).string().not_null())
                    .col(ColumnDef::new(PaymentHistory::StripeSessionId).string())
                    // Webhook の再送で二重登録しないよう一意にする
                    .col(
                        ColumnDef::new(PaymentHistory::StripePaymentIntentId)
                            .string()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentHistory::StripeInvoiceId)
                            .string()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaymentHistory::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(PaymentHistory::Currency)
                            .string()
                            .not_null()
                            .default("usd"),
                    )
                    .col(ColumnDef::new(PaymentHistory::Status).string().not_null())
                    .col(ColumnDef::new(PaymentHistory::Description).string())
                    .col(ColumnDef::new(PaymentHistory::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PaymentHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PaymentHistory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 支払いは診断が削除されても残す
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_payment_history_assessment_id")
                    .from(PaymentHistory::Table, PaymentHistory::AssessmentId)
                    .to(Assessments::Table, Assessments::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_history_user_created")
                    .table(PaymentHistory::Table)
                    .col(PaymentHistory::UserId)
                    .col(PaymentHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentHistory {
    Table,
    Id,
    UserId,
    AssessmentId,
    Tier,
    StripeSessionId,
    StripePaymentIntentId,
    StripeInvoiceId,
    Amount,
    Currency,
    Status,
    Description,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
}
