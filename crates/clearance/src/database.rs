use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clearance_migration::{MigrationStatus, Migrator, MigratorTrait};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SchemaError;

/// 迁移在账本中的状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationState {
    pub name: String,
    pub applied: bool,
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// 创建 SQLite 连接选项，文件数据库启用 WAL
fn create_sqlite_options(url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("无法解析数据库地址: {}", url))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(90));

    if is_memory_url(url) {
        return Ok(options);
    }
    Ok(options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal))
}

/// 连接数据库。内存数据库只保留一个永不回收的连接，否则数据会随连接关闭丢失
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    let pool_options = if is_memory_url(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(90))
            .idle_timeout(Duration::from_secs(600))
    };

    let pool = pool_options
        .connect_with(create_sqlite_options(url)?)
        .await
        .with_context(|| format!("连接数据库失败: {}", url))?;
    debug!("数据库连接池已创建: {}", url);

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 应用未执行的迁移，`steps` 为空时应用全部
pub async fn migrate(connection: &DatabaseConnection, steps: Option<u32>) -> Result<(), SchemaError> {
    Migrator::up(connection, steps).await?;
    debug!("迁移已应用到最新");
    Ok(())
}

/// 按执行顺序倒序回滚迁移，返回实际回滚的数量
pub async fn rollback(connection: &DatabaseConnection, steps: Option<u32>) -> Result<usize, SchemaError> {
    let applied_before = count_applied(connection).await?;
    Migrator::down(connection, steps).await?;
    let reverted = applied_before.saturating_sub(count_applied(connection).await?);

    if reverted == 0 {
        info!("没有已执行的迁移，无需回滚");
    } else {
        info!("已回滚 {} 个迁移", reverted);
    }
    Ok(reverted)
}

async fn count_applied(connection: &DatabaseConnection) -> Result<usize, SchemaError> {
    Ok(migration_status(connection)
        .await?
        .iter()
        .filter(|state| state.applied)
        .count())
}

pub async fn migration_status(connection: &DatabaseConnection) -> Result<Vec<MigrationState>, SchemaError> {
    let migrations = Migrator::get_migration_with_status(connection).await?;
    Ok(migrations
        .iter()
        .map(|migration| MigrationState {
            name: migration.name().to_owned(),
            applied: matches!(migration.status(), MigrationStatus::Applied),
        })
        .collect())
}

/// 使用单连接池执行迁移，保证账本与 DDL 串行执行
pub async fn migrate_database(url: &str, steps: Option<u32>) -> Result<()> {
    if is_memory_url(url) {
        // 内存数据库无法跨连接共享，迁移在同一个连接上完成
        let connection = connect(url).await?;
        return migrate(&connection, steps).await.context("数据库迁移失败");
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(create_sqlite_options(url)?)
        .await
        .with_context(|| format!("连接数据库失败: {}", url))?;
    let connection = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

    let result = migrate(&connection, steps).await;

    // 无论成功与否都关闭迁移连接池，释放数据库锁
    pool.close().await;
    debug!("迁移完成，已关闭迁移连接池");

    result.context("数据库迁移失败")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clearance_migration::m20160101_000001_create_clearance_users::{Migration, EMAIL_INDEX};
    use clearance_migration::{MigrationTrait, SchemaManager};
    use sea_orm::ConnectionTrait;

    use super::*;

    const MEMORY_URL: &str = "sqlite::memory:";

    #[tokio::test]
    async fn test_migrate_applies_migration_once() {
        let connection = connect(MEMORY_URL).await.unwrap();
        migrate(&connection, None).await.unwrap();

        let status = migration_status(&connection).await.unwrap();
        assert_eq!(
            status,
            vec![MigrationState {
                name: "m20160101_000001_create_clearance_users".to_owned(),
                applied: true,
            }]
        );

        // 账本中已有记录，再次执行不会重复建表
        migrate(&connection, None).await.unwrap();
        let manager = SchemaManager::new(&connection);
        assert!(manager.has_table("users").await.unwrap());
        assert!(manager.has_index("users", EMAIL_INDEX).await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_restores_empty_schema() {
        let connection = connect(MEMORY_URL).await.unwrap();
        migrate(&connection, None).await.unwrap();

        assert_eq!(rollback(&connection, Some(1)).await.unwrap(), 1);

        let manager = SchemaManager::new(&connection);
        assert!(!manager.has_table("users").await.unwrap());
        let status = migration_status(&connection).await.unwrap();
        assert!(status.iter().all(|state| !state.applied));

        migrate(&connection, None).await.unwrap();
        assert!(manager.has_table("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_with_nothing_applied_reverts_nothing() {
        let connection = connect(MEMORY_URL).await.unwrap();

        assert_eq!(rollback(&connection, Some(1)).await.unwrap(), 0);

        migrate(&connection, None).await.unwrap();
        assert_eq!(rollback(&connection, None).await.unwrap(), 1);
        assert_eq!(rollback(&connection, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_users_table_is_schema_conflict() {
        let connection = connect(MEMORY_URL).await.unwrap();
        connection
            .execute_unprepared("CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        assert_matches!(migrate(&connection, None).await, Err(SchemaError::SchemaConflict(_)));
        let status = migration_status(&connection).await.unwrap();
        assert!(!status[0].applied);
    }

    #[tokio::test]
    async fn test_applying_descriptor_twice_is_schema_conflict() {
        let connection = connect(MEMORY_URL).await.unwrap();
        let manager = SchemaManager::new(&connection);

        Migration.up(&manager).await.unwrap();
        let err = Migration.up(&manager).await.map_err(SchemaError::from);

        assert_matches!(err, Err(SchemaError::SchemaConflict(_)));
    }

    #[tokio::test]
    async fn test_down_without_up_is_dependency_order_violation() {
        let connection = connect(MEMORY_URL).await.unwrap();
        let manager = SchemaManager::new(&connection);

        let err = Migration.down(&manager).await.map_err(SchemaError::from);

        assert_matches!(err, Err(SchemaError::DependencyOrderViolation(_)));
    }

    #[test]
    fn test_default_database_url_is_a_file_database() {
        let url = crate::config::default_database_url();
        assert!(!is_memory_url(&url));
        assert!(create_sqlite_options(&url).is_ok());
    }

    #[test]
    fn test_memory_url_detection() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file.db?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite:///tmp/data.sqlite"));
    }
}
