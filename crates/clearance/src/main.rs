mod config;
mod database;
mod error;
mod users;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::config::{Args, Command};
use crate::users::NewUser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logger(&args.log_level)?;

    let database_url = args.resolve_database_url()?;
    debug!("使用数据库: {}", database_url);

    match args.command {
        Command::Up { steps } => {
            database::migrate_database(&database_url, steps).await?;
            info!("迁移执行完成");
        }
        Command::Down { steps } => {
            let connection = database::connect(&database_url).await?;
            database::rollback(&connection, Some(steps))
                .await
                .context("回滚迁移失败")?;
        }
        Command::Status { json } => {
            let connection = database::connect(&database_url).await?;
            let status = database::migration_status(&connection)
                .await
                .context("读取迁移状态失败")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                for state in status {
                    let label = if state.applied { "Applied" } else { "Pending" };
                    println!("{:<8} {}", label, state.name);
                }
            }
        }
        Command::CreateUser { email, name, age } => {
            let connection = database::connect(&database_url).await?;
            let user = users::create_user(&connection, NewUser { email, name, age })
                .await
                .context("创建用户失败")?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::FindUser { email } => {
            let connection = database::connect(&database_url).await?;
            match users::find_by_email(&connection, &email).await? {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => warn!("未找到 email 为 {} 的用户", email),
            }
        }
        Command::SetEmail { id, email } => {
            let connection = database::connect(&database_url).await?;
            let user = users::update_email(&connection, id, &email)
                .await
                .context("修改 email 失败")?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
    }

    Ok(())
}

