use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;

/// 配置目录，默认数据库文件存放于此
pub static CONFIG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::config_dir()
        .map(|dir| dir.join("clearance"))
        .unwrap_or_else(|| PathBuf::from(".clearance"))
});

#[derive(Parser, Debug)]
#[command(name = "clearance", version, about = "Apply and inspect the clearance users schema")]
pub struct Args {
    /// SQLite 数据库地址，缺省时使用配置目录下的 data.sqlite
    #[arg(long, env = "CLEARANCE_DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "CLEARANCE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// 应用未执行的迁移
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// 回滚已执行的迁移
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// 列出迁移及其执行状态
    Status {
        #[arg(long)]
        json: bool,
    },
    /// 新建用户，未给出的字段使用表默认值
    CreateUser {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<i32>,
    },
    /// 按 email 查询用户
    FindUser {
        #[arg(long)]
        email: String,
    },
    /// 修改用户 email
    SetEmail {
        #[arg(long)]
        id: i32,
        #[arg(long)]
        email: String,
    },
}

impl Args {
    /// 解析出最终使用的数据库地址，使用默认地址时确保配置目录存在
    pub fn resolve_database_url(&self) -> Result<String> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }
        if !CONFIG_DIR.exists() {
            std::fs::create_dir_all(&*CONFIG_DIR)
                .with_context(|| format!("创建配置目录失败: {}", CONFIG_DIR.display()))?;
        }
        Ok(default_database_url())
    }
}

pub fn default_database_url() -> String {
    format!("sqlite://{}?mode=rwc", CONFIG_DIR.join("data.sqlite").display())
}
