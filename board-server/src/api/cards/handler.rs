//! Card API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::super::blocking;
use crate::core::ServerState;
use crate::utils::{AppResult, ValidJson};
use crate::utils::validation::parse_path_id;
use shared::models::{Card, CardCreate, CardDeleted, CardReorder, CardUpdate, ReorderAck};

/// POST /cards - 创建卡片
pub async fn create(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<CardCreate>,
) -> AppResult<(StatusCode, Json<Card>)> {
    let card = blocking(&state, move |svc| svc.create_card(&payload)).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// PATCH /cards/reorder - 批量写入 (id, order, columnId, boardId)
pub async fn reorder(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<CardReorder>,
) -> AppResult<Json<ReorderAck>> {
    let ack = blocking(&state, move |svc| svc.reorder_cards(&payload.cards)).await?;
    Ok(Json(ack))
}

/// PATCH /cards/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CardUpdate>,
) -> AppResult<Json<Card>> {
    let id = parse_path_id("card", &id)?;
    let card = blocking(&state, move |svc| svc.rename_card(id, &payload.text)).await?;
    Ok(Json(card))
}

/// DELETE /cards/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CardDeleted>> {
    let id = parse_path_id("card", &id)?;
    let marker = blocking(&state, move |svc| svc.delete_card(id)).await?;
    Ok(Json(marker))
}
