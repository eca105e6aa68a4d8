//! Board API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::super::blocking;
use crate::core::ServerState;
use crate::utils::{AppResult, ValidJson};
use crate::utils::validation::parse_path_id;
use shared::models::{
    Board, BoardCreate, BoardDeleted, BoardUpdate, Card, Column, ColumnCreate, ColumnReorder,
    ColumnUpdate,
};

/// GET /boards - 获取所有看板 (新建在前)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Board>>> {
    let boards = blocking(&state, |svc| svc.list_boards()).await?;
    Ok(Json(boards))
}

/// GET /boards/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Board>> {
    let id = parse_path_id("board", &id)?;
    let board = blocking(&state, move |svc| svc.get_board(id)).await?;
    Ok(Json(board))
}

/// POST /boards - 创建看板
pub async fn create(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<BoardCreate>,
) -> AppResult<(StatusCode, Json<Board>)> {
    let board = blocking(&state, move |svc| svc.create_board(&payload.title)).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// PATCH /boards/{id} - 重命名
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<BoardUpdate>,
) -> AppResult<Json<Board>> {
    let id = parse_path_id("board", &id)?;
    let board = blocking(&state, move |svc| svc.rename_board(id, &payload.title)).await?;
    Ok(Json(board))
}

/// DELETE /boards/{id} - 删除看板及其卡片
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<BoardDeleted>> {
    let id = parse_path_id("board", &id)?;
    let marker = blocking(&state, move |svc| svc.delete_board(id)).await?;
    Ok(Json(marker))
}

/// POST /boards/{id}/columns - 追加列
pub async fn add_column(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ColumnCreate>,
) -> AppResult<(StatusCode, Json<Column>)> {
    let id = parse_path_id("board", &id)?;
    let column = blocking(&state, move |svc| svc.add_column(id, &payload.title)).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// PATCH /boards/{id}/columns/{column_id}
pub async fn update_column(
    State(state): State<ServerState>,
    Path((id, column_id)): Path<(String, String)>,
    ValidJson(payload): ValidJson<ColumnUpdate>,
) -> AppResult<Json<Board>> {
    let id = parse_path_id("board", &id)?;
    let column_id = parse_path_id("column", &column_id)?;
    let board = blocking(&state, move |svc| {
        svc.rename_column(id, column_id, &payload.title)
    })
    .await?;
    Ok(Json(board))
}

/// DELETE /boards/{id}/columns/{column_id} - 删除列及其卡片
pub async fn delete_column(
    State(state): State<ServerState>,
    Path((id, column_id)): Path<(String, String)>,
) -> AppResult<Json<Board>> {
    let id = parse_path_id("board", &id)?;
    let column_id = parse_path_id("column", &column_id)?;
    let board = blocking(&state, move |svc| svc.delete_column(id, column_id)).await?;
    Ok(Json(board))
}

/// PATCH /boards/{id}/reorder-columns
pub async fn reorder_columns(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ColumnReorder>,
) -> AppResult<Json<Vec<Column>>> {
    let id = parse_path_id("board", &id)?;
    let columns = blocking(&state, move |svc| svc.reorder_columns(id, &payload.columns)).await?;
    Ok(Json(columns))
}

/// GET /boards/{id}/cards
pub async fn list_cards(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Card>>> {
    let id = parse_path_id("board", &id)?;
    let cards = blocking(&state, move |svc| svc.list_cards(id)).await?;
    Ok(Json(cards))
}
