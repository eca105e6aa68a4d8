//! Card API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /cards | POST | 在列尾追加卡片 |
//! | /cards/reorder | PATCH | 批量重排 / 跨列移动 |
//! | /cards/{id} | PATCH / DELETE | 修改文本 / 删除 |

mod handler;

use axum::{
    Router,
    routing::{patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/cards", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/reorder", patch(handler::reorder))
        .route("/{id}", patch(handler::update).delete(handler::delete))
}
