pub use sea_orm_migration::prelude::*;
pub use sea_orm_migration::MigrationStatus;

pub mod m20160101_000001_create_clearance_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20160101_000001_create_clearance_users::Migration)]
    }
}
