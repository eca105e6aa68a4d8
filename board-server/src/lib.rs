//! Board Server - 实时看板排序与协同服务
//!
//! # 架构概述
//!
//! - **数据库** (`db`): 嵌入式 redb 存储，所有写入以单个原子批次提交
//! - **调和服务** (`services`): 服务端权威写入，失败从不广播
//! - **消息** (`message`): 按看板分区的广播路由和 WebSocket 订阅者
//! - **HTTP API** (`api`): RESTful 接口 + `/ws`
//!
//! ```text
//! board-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── db/            # redb 存储
//! ├── services/      # 调和服务
//! ├── message/       # 广播路由、订阅者
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod message;
pub mod services;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use db::{BoardStore, RedbBoardStore};
pub use message::{BroadcastRouter, Broadcaster, Subscriber};
pub use services::ReconciliationService;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> core::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    let logs_dir = config.logs_dir();
    init_logger_with_file(&config.log_level, Some(&logs_dir));

    tracing::debug!(work_dir = %config.work_dir, environment = %config.environment, "Environment ready");
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____                      __
   / __ )____  ____ _________/ /
  / __  / __ \/ __ `/ ___/ __  /
 / /_/ / /_/ / /_/ / /  / /_/ /
/_____/\____/\__,_/_/   \__,_/
    "#
    );
}
