//! Board API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /boards | GET / POST | 列表 (新建在前) / 创建 |
//! | /boards/{id} | GET / PATCH / DELETE | 查询 / 重命名 / 删除 (级联卡片) |
//! | /boards/{id}/columns | POST | 追加列 |
//! | /boards/{id}/columns/{column_id} | PATCH / DELETE | 重命名 / 删除列 |
//! | /boards/{id}/reorder-columns | PATCH | 列重排 |
//! | /boards/{id}/cards | GET | 看板的卡片 (按 order) |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/boards", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/columns", post(handler::add_column))
        .route(
            "/{id}/columns/{column_id}",
            patch(handler::update_column).delete(handler::delete_column),
        )
        .route("/{id}/reorder-columns", patch(handler::reorder_columns))
        .route("/{id}/cards", get(handler::list_cards))
}
