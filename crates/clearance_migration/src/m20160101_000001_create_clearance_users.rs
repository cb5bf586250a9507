use sea_orm_migration::prelude::*;

/// `users` 表上 email 唯一索引的名称
pub const EMAIL_INDEX: &str = "index_users_on_email";

/// 创建 clearance 的 users 表，并在 email 上建立唯一索引。
///
/// 建表与建索引都不带 `IF NOT EXISTS`：表或索引已存在时直接失败，
/// 由迁移执行器负责中止整批迁移。
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 索引依赖表，顺序不可调换
        create_users_table(manager).await?;
        create_email_index(manager).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(EMAIL_INDEX).table(Users::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

async fn create_users_table(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Users::Table)
                .col(
                    ColumnDef::new(Users::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Users::Email).string().not_null())
                .col(ColumnDef::new(Users::Name).string().not_null().default(""))
                .col(ColumnDef::new(Users::Age).integer().not_null().default(1))
                // 时间戳没有默认值，由模型层在写入时填充
                .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                .to_owned(),
        )
        .await
}

async fn create_email_index(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .name(EMAIL_INDEX)
                .table(Users::Table)
                .col(Users::Email)
                .unique()
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    Age,
    CreatedAt,
    UpdatedAt,
}
