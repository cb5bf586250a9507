use clearance_entity::entities::prelude::Users;
use clearance_entity::entities::users;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use tracing::debug;

use crate::error::SchemaError;

/// 待插入的用户，`None` 的字段不写入，由表默认值或约束处理
#[derive(Debug, Default, Clone)]
pub struct NewUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub age: Option<i32>,
}

fn set_or_skip<T>(value: Option<T>) -> ActiveValue<T>
where
    T: Into<sea_orm::Value>,
{
    value.map_or(ActiveValue::NotSet, Set)
}

pub async fn create_user<C>(db: &C, new_user: NewUser) -> Result<users::Model, SchemaError>
where
    C: ConnectionTrait,
{
    let user = users::ActiveModel {
        email: set_or_skip(new_user.email),
        name: set_or_skip(new_user.name),
        age: set_or_skip(new_user.age),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!("已创建用户 {} ({})", user.id, user.email);
    Ok(user)
}

pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<users::Model>, SchemaError>
where
    C: ConnectionTrait,
{
    Ok(Users::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn update_email<C>(db: &C, id: i32, email: &str) -> Result<users::Model, SchemaError>
where
    C: ConnectionTrait,
{
    let user = Users::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("users.id = {}", id)))?;

    let mut user: users::ActiveModel = user.into();
    user.email = Set(email.to_owned());
    Ok(user.update(db).await?)
}
