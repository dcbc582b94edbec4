use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgCharts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrgCharts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrgCharts::AssessmentId).uuid().not_null())
                    .col(ColumnDef::new(OrgCharts::Name).string().not_null())
                    .col(ColumnDef::new(OrgCharts::SvgContent).text())
                    .col(ColumnDef::new(OrgCharts::Roles).json_binary().not_null())
                    .col(
                        ColumnDef::new(OrgCharts::Scenarios)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(OrgCharts::Issues)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(OrgCharts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OrgCharts::UpdatedAt)
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
                    .name("fk_org_charts_assessment_id")
                    .from(OrgCharts::Table, OrgCharts::AssessmentId)
                    .to(Assessments::Table, Assessments::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_org_charts_assessment_created")
                    .table(OrgCharts::Table)
                    .col(OrgCharts::AssessmentId)
                    .col(OrgCharts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrgCharts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OrgCharts {
    Table,
    Id,
    AssessmentId,
    Name,
    SvgContent,
    Roles,
    Scenarios,
    Issues,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
}
