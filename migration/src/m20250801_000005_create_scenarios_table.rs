use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scenarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Scenarios::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Scenarios::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Scenarios::Title).string().not_null())
                    .col(ColumnDef::new(Scenarios::Description).text())
                    .col(
                        ColumnDef::new(Scenarios::Status)
                            .string()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Scenarios::BaselineData).json_binary().not_null())
                    .col(ColumnDef::new(Scenarios::VariantData).json_binary().not_null())
                    .col(ColumnDef::new(Scenarios::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Scenarios::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Scenarios::UpdatedAt)
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
                    .name("idx_scenarios_created_by")
                    .table(Scenarios::Table)
                    .col(Scenarios::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scenarios_organization_status")
                    .table(Scenarios::Table)
                    .col(Scenarios::OrganizationId)
                    .col(Scenarios::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scenarios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Scenarios {
    Table,
    Id,
    OrganizationId,
    Title,
    Description,
    Status,
    BaselineData,
    VariantData,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
