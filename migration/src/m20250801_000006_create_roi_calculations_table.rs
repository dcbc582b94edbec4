use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoiCalculations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoiCalculations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoiCalculations::ScenarioId).uuid().not_null())
                    .col(
                        ColumnDef::new(RoiCalculations::CalculationType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoiCalculations::Assumptions)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoiCalculations::Results).json_binary().not_null())
                    .col(
                        ColumnDef::new(RoiCalculations::RoiPercentage)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoiCalculations::PaybackMonths)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoiCalculations::Npv).double().not_null())
                    .col(
                        ColumnDef::new(RoiCalculations::CalculatedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoiCalculations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RoiCalculations::UpdatedAt)
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
                    .name("fk_roi_calculations_scenario_id")
                    .from(RoiCalculations::Table, RoiCalculations::ScenarioId)
                    .to(Scenarios::Table, Scenarios::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roi_calculations_scenario_created")
                    .table(RoiCalculations::Table)
                    .col(RoiCalculations::ScenarioId)
                    .col(RoiCalculations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoiCalculations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RoiCalculations {
    Table,
    Id,
    ScenarioId,
    CalculationType,
    Assumptions,
    Results,
    RoiPercentage,
    PaybackMonths,
    Npv,
    CalculatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Scenarios {
    Table,
    Id,
}
