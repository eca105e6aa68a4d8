use std::sync::Arc;

use crate::core::{Config, Result};
use crate::db::{BoardStore, RedbBoardStore};
use crate::message::BroadcastRouter;
use crate::services::ReconciliationService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求 clone 一次的成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Arc<dyn BoardStore> | 看板存储 (redb) |
/// | router | BroadcastRouter | 按看板分区的广播 |
/// | service | ReconciliationService | 权威写入 + 广播 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn BoardStore>,
    pub router: BroadcastRouter,
    pub service: ReconciliationService,
}

impl ServerState {
    /// 用已有存储构造状态
    ///
    /// 测试里配合 [`RedbBoardStore::open_in_memory`] 使用
    pub fn new(config: Config, store: Arc<dyn BoardStore>) -> Self {
        let router = BroadcastRouter::new(config.broadcast_capacity);
        let service = ReconciliationService::new(store.clone(), Arc::new(router.clone()));
        Self {
            config,
            store,
            router,
            service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构
    /// 2. 打开 work_dir/database/board.redb
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let store = RedbBoardStore::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Board database opened");

        Ok(Self::new(config.clone(), Arc::new(store)))
    }

    pub fn service(&self) -> &ReconciliationService {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        let state = ServerState::initialize(&config).unwrap();
        assert!(config.database_path().is_file());
        assert!(state.service().list_boards().unwrap().is_empty());
    }
}
