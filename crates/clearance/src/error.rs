use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// 迁移与写入过程中的错误分类，均视为不可恢复，不做重试
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema object already exists: {0}")]
    SchemaConflict(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("not null violation: {0}")]
    NotNullViolation(String),
    #[error("schema object referenced before it exists: {0}")]
    DependencyOrderViolation(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for SchemaError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
            return Self::ConstraintViolation(message);
        }

        // 其余情况只能依赖 SQLite 的错误信息
        let message = err.to_string();
        if message.contains("UNIQUE constraint failed") {
            Self::ConstraintViolation(message)
        } else if message.contains("NOT NULL constraint failed") {
            Self::NotNullViolation(message)
        } else if message.contains("already exists") {
            Self::SchemaConflict(message)
        } else if message.contains("no such table") || message.contains("no such index") {
            Self::DependencyOrderViolation(message)
        } else {
            Self::Database(err)
        }
    }
}
