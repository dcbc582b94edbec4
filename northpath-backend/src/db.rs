// northpath-backend/src/db.rs
use crate::config::AppConfig;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

fn connect_options(config: &AppConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8 * 60))
        .sqlx_logging(config.is_development());
    opt
}

pub async fn create_db_pool(config: &AppConfig) -> Result<DbPool, DbErr> {
    Database::connect(connect_options(config)).await
}

// スキーマを指定して接続
pub async fn create_db_pool_with_schema(config: &AppConfig, schema: &str) -> Result<DbPool, DbErr> {
    let mut opt = connect_options(config);
    opt.set_schema_search_path(schema.to_string());
    Database::connect(opt).await
}

// スキーマが存在するか確認
pub async fn schema_exists(conn: &DbPool, schema: &str) -> Result<bool, DbErr> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1) AS exists",
            [schema.into()],
        ))
        .await?;

    match result {
        Some(row) => row.try_get("", "exists"),
        None => Ok(false),
    }
}

// スキーマを作成
pub async fn create_schema(conn: &DbPool, schema: &str) -> Result<(), DbErr> {
    if !schema
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DbErr::Custom(format!("Invalid schema name: {}", schema)));
    }
    conn.execute(Statement::from_string(
        DatabaseBackend::Postgres,
        format!("CREATE SCHEMA IF NOT EXISTS \"{}\";", schema),
    ))
    .await?;
    Ok(())
}

/// 起動時の接続確立 (DB_SCHEMA があればスキーマを作成して search_path を設定)
pub async fn connect(config: &AppConfig, schema: Option<&str>) -> Result<DbPool, DbErr> {
    let Some(schema) = schema else {
        return create_db_pool(config).await;
    };

    tracing::info!(schema = %schema, "Using database schema");
    let base_pool = create_db_pool(config).await?;
    if !schema_exists(&base_pool, schema).await? {
        tracing::info!(schema = %schema, "Schema does not exist, creating it");
        create_schema(&base_pool, schema).await?;
    }
    base_pool.close().await?;

    create_db_pool_with_schema(config, schema).await
}
