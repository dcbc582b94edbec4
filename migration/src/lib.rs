// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// 診断関連マイグレーション
mod m20250801_000001_create_assessments_table;
mod m20250801_000002_create_assessment_collaborators_table;
mod m20250801_000003_create_assessment_comments_table;
mod m20250801_000004_create_org_charts_table;

// シナリオ・ROI
mod m20250801_000005_create_scenarios_table;
mod m20250801_000006_create_roi_calculations_table;

// チーム関連マイグレーション
mod m20250801_000007_create_teams_tables;
mod m20250801_000008_create_team_invitations_table;

// 決済
mod m20250801_000009_create_payment_history_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. 診断テーブル (他テーブルの参照先)
            Box::new(m20250801_000001_create_assessments_table::Migration),
            // 2. 診断に従属するテーブル
            Box::new(m20250801_000002_create_assessment_collaborators_table::Migration),
            Box::new(m20250801_000003_create_assessment_comments_table::Migration),
            Box::new(m20250801_000004_create_org_charts_table::Migration),
            // 3. シナリオと ROI 履歴
            Box::new(m20250801_000005_create_scenarios_table::Migration),
            Box::new(m20250801_000006_create_roi_calculations_table::Migration),
            // 4. チーム
            Box::new(m20250801_000007_create_teams_tables::Migration),
            Box::new(m20250801_000008_create_team_invitations_table::Migration),
            // 5. 支払い履歴
            Box::new(m20250801_000009_create_payment_history_table::Migration),
        ]
    }
}
