//! HTTP client for the board API

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::optimistic::{BoardView, ReorderDispatch};
use crate::{ClientConfig, ClientError, ClientResult};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    Board, BoardDeleted, BoardId, Card, CardCreate, CardDeleted, CardId, CardPlacement, Column,
    ColumnId, ColumnPlacement, ReorderAck,
};

/// HTTP client for making requests to the board server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            // 尝试解析为统一错误响应
            if let Some(err) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(ApiResponse::into_error)
            {
                return Err(ClientError::Api(err));
            }
            let code = match status {
                StatusCode::NOT_FOUND => ErrorCode::NotFound,
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ErrorCode::InvalidRequest
                }
                _ => ErrorCode::InternalError,
            };
            return Err(ClientError::Api(AppError::with_message(code, text)));
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Boards ==========

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        self.get("health").await
    }

    pub async fn list_boards(&self) -> ClientResult<Vec<Board>> {
        self.get("boards").await
    }

    pub async fn get_board(&self, board_id: BoardId) -> ClientResult<Board> {
        self.get(&format!("boards/{board_id}")).await
    }

    pub async fn create_board(&self, title: &str) -> ClientResult<Board> {
        self.request(Method::POST, "boards", Some(&json!({ "title": title })))
            .await
    }

    pub async fn rename_board(&self, board_id: BoardId, title: &str) -> ClientResult<Board> {
        let path = format!("boards/{board_id}");
        self.request(Method::PATCH, &path, Some(&json!({ "title": title })))
            .await
    }

    pub async fn delete_board(&self, board_id: BoardId) -> ClientResult<BoardDeleted> {
        self.delete(&format!("boards/{board_id}")).await
    }

    // ========== Columns ==========

    pub async fn add_column(&self, board_id: BoardId, title: &str) -> ClientResult<Column> {
        let path = format!("boards/{board_id}/columns");
        self.request(Method::POST, &path, Some(&json!({ "title": title })))
            .await
    }

    pub async fn rename_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        title: &str,
    ) -> ClientResult<Board> {
        let path = format!("boards/{board_id}/columns/{column_id}");
        self.request(Method::PATCH, &path, Some(&json!({ "title": title })))
            .await
    }

    pub async fn delete_column(&self, board_id: BoardId, column_id: ColumnId) -> ClientResult<Board> {
        self.delete(&format!("boards/{board_id}/columns/{column_id}"))
            .await
    }

    pub async fn reorder_columns(
        &self,
        board_id: BoardId,
        columns: &[ColumnPlacement],
    ) -> ClientResult<Vec<Column>> {
        let path = format!("boards/{board_id}/reorder-columns");
        self.request(Method::PATCH, &path, Some(&json!({ "columns": columns })))
            .await
    }

    // ========== Cards ==========

    pub async fn list_cards(&self, board_id: BoardId) -> ClientResult<Vec<Card>> {
        self.get(&format!("boards/{board_id}/cards")).await
    }

    pub async fn create_card(&self, payload: &CardCreate) -> ClientResult<Card> {
        self.request(Method::POST, "cards", Some(payload)).await
    }

    pub async fn rename_card(&self, card_id: CardId, text: &str) -> ClientResult<Card> {
        let path = format!("cards/{card_id}");
        self.request(Method::PATCH, &path, Some(&json!({ "text": text })))
            .await
    }

    pub async fn delete_card(&self, card_id: CardId) -> ClientResult<CardDeleted> {
        self.delete(&format!("cards/{card_id}")).await
    }

    pub async fn reorder_cards(&self, cards: &[CardPlacement]) -> ClientResult<ReorderAck> {
        self.request(Method::PATCH, "cards/reorder", Some(&json!({ "cards": cards })))
            .await
    }

    /// Fetch a board and its cards as a fresh view
    pub async fn fetch_view(&self, board_id: BoardId) -> ClientResult<BoardView> {
        let board = self.get_board(board_id).await?;
        let cards = self.list_cards(board_id).await?;
        Ok(BoardView::load(board, cards))
    }
}

#[async_trait]
impl ReorderDispatch for HttpClient {
    async fn reorder_columns(
        &self,
        board_id: BoardId,
        columns: Vec<ColumnPlacement>,
    ) -> ClientResult<Vec<Column>> {
        HttpClient::reorder_columns(self, board_id, &columns).await
    }

    async fn reorder_cards(&self, cards: Vec<CardPlacement>) -> ClientResult<ReorderAck> {
        HttpClient::reorder_cards(self, &cards).await
    }
}
