//! 实时广播消息类型
//!
//! 服务端每次写入成功后发布一个 [`BoardEvent`]，由广播路由器按 [`Topic`]
//! 投递给订阅了该看板的所有客户端（包括发起者本身）。每条消息都携带完整的
//! 规范状态，客户端按 id 整体替换即可，重复投递是幂等的。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod topic;
pub use topic::{InvalidTopic, Topic};

use crate::models::{Board, BoardDeleted, BoardId, Card, CardDeleted, Column};

/// Canonical state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BoardEvent {
    /// 新建看板（全局）
    BoardCreated(Board),
    /// 删除看板（全局）
    BoardDeleted(BoardDeleted),
    /// 看板标题或列集合变化：重命名、增列、改列名、删列
    BoardUpdated(Board),
    /// 列重排后的规范列序列
    ColumnsReordered {
        #[serde(rename = "boardId")]
        board_id: BoardId,
        columns: Vec<Column>,
    },
    CardCreated(Card),
    /// 受影响卡片的规范状态
    CardsReordered {
        #[serde(rename = "boardId")]
        board_id: BoardId,
        cards: Vec<Card>,
    },
    CardUpdated(Card),
    CardDeleted(CardDeleted),
}

impl BoardEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::BoardCreated(_) => Topic::BoardCreate,
            Self::BoardDeleted(_) => Topic::BoardDelete,
            Self::BoardUpdated(board) => Topic::BoardUpdate(board.id),
            Self::ColumnsReordered { board_id, .. } => Topic::ColumnReorder(*board_id),
            Self::CardCreated(card) => Topic::CardCreate(card.board_id),
            Self::CardsReordered { board_id, .. } => Topic::CardReorder(*board_id),
            Self::CardUpdated(card) => Topic::CardUpdate(card.board_id),
            Self::CardDeleted(marker) => Topic::CardDelete(marker.board_id),
        }
    }

    /// Board the event concerns, global events included
    pub fn board_id(&self) -> BoardId {
        match self {
            Self::BoardCreated(board) | Self::BoardUpdated(board) => board.id,
            Self::BoardDeleted(marker) => marker.board_id,
            Self::ColumnsReordered { board_id, .. } | Self::CardsReordered { board_id, .. } => {
                *board_id
            }
            Self::CardCreated(card) | Self::CardUpdated(card) => card.board_id,
            Self::CardDeleted(marker) => marker.board_id,
        }
    }
}

/// What a subscriber receives: the event plus its topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub topic: Topic,
    pub event: BoardEvent,
    /// 用于日志追踪
    pub request_id: Uuid,
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(event: BoardEvent) -> Self {
        Self {
            topic: event.topic(),
            event,
            request_id: Uuid::new_v4(),
            timestamp: crate::util::now_millis(),
        }
    }
}

/// Client → server frame on the live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriptionCommand {
    Subscribe {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
    Unsubscribe {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
}

/// Server → client frame on the live connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Event(Envelope),
    /// 订阅已生效，之后该看板的事件都会送达
    Subscribed {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
    Unsubscribed {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card {
            id: 5,
            text: "t".into(),
            order: 0,
            column_id: 2,
            board_id: 9,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_event_topics() {
        assert_eq!(BoardEvent::CardCreated(card()).topic(), Topic::CardCreate(9));
        assert_eq!(
            BoardEvent::CardDeleted(CardDeleted {
                card_id: 5,
                board_id: 9
            })
            .topic(),
            Topic::CardDelete(9)
        );
        assert_eq!(
            BoardEvent::BoardDeleted(BoardDeleted { board_id: 9 }).topic(),
            Topic::BoardDelete
        );
        assert_eq!(
            BoardEvent::CardsReordered {
                board_id: 9,
                cards: vec![]
            }
            .board_id(),
            9
        );
    }

    #[test]
    fn test_command_wire_format() {
        let cmd: SubscriptionCommand =
            serde_json::from_str(r#"{"type":"subscribe","boardId":12}"#).unwrap();
        assert_eq!(cmd, SubscriptionCommand::Subscribe { board_id: 12 });

        let json = serde_json::to_string(&SubscriptionCommand::Unsubscribe { board_id: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"unsubscribe","boardId":3}"#);
    }

    #[test]
    fn test_event_frame_wire_format() {
        let frame = ServerFrame::Event(Envelope::new(BoardEvent::CardsReordered {
            board_id: 9,
            cards: vec![card()],
        }));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["topic"], "card:reorder:9");
        assert_eq!(json["event"]["type"], "cards_reordered");
        assert_eq!(json["event"]["payload"]["boardId"], 9);
        assert_eq!(json["event"]["payload"]["cards"][0]["columnId"], 2);

        let back: ServerFrame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }
}
