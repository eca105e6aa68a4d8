//! Optimistic client state
//!
//! 拖拽结束时先在本地视图上应用计划 (`Local`)，再异步发送到服务端；
//! 服务端广播的规范状态按 id 整体替换本地副本 (`Reconciled`)。
//! 发送失败只记录并上报，不回滚，等待下一次广播覆盖。

mod mutator;
mod state;
mod view;

pub use mutator::{
    DispatchFailure, DispatchHandle, DispatchOutcome, OptimisticMutator, ReorderDispatch,
    SharedView,
};
pub use state::EntityState;
pub use view::BoardView;
