//! 广播主题
//!
//! 看板创建/删除是全局主题，其余主题都以 boardId 为作用域：
//! `board:create`, `board:delete`, `board:update:{id}`, `column:reorder:{id}`,
//! `card:create:{id}`, `card:reorder:{id}`, `card:update:{id}`, `card:delete:{id}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::BoardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Topic {
    BoardCreate,
    BoardDelete,
    BoardUpdate(BoardId),
    ColumnReorder(BoardId),
    CardCreate(BoardId),
    CardReorder(BoardId),
    CardUpdate(BoardId),
    CardDelete(BoardId),
}

impl Topic {
    /// The board this topic is scoped to; `None` for global topics
    pub fn board_id(&self) -> Option<BoardId> {
        match self {
            Self::BoardCreate | Self::BoardDelete => None,
            Self::BoardUpdate(id)
            | Self::ColumnReorder(id)
            | Self::CardCreate(id)
            | Self::CardReorder(id)
            | Self::CardUpdate(id)
            | Self::CardDelete(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        self.board_id().is_none()
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::BoardCreate => "board:create",
            Self::BoardDelete => "board:delete",
            Self::BoardUpdate(_) => "board:update",
            Self::ColumnReorder(_) => "column:reorder",
            Self::CardCreate(_) => "card:create",
            Self::CardReorder(_) => "card:reorder",
            Self::CardUpdate(_) => "card:update",
            Self::CardDelete(_) => "card:delete",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.board_id() {
            Some(id) => write!(f, "{}:{}", self.prefix(), id),
            None => f.write_str(self.prefix()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid topic: {0}")]
pub struct InvalidTopic(pub String);

impl FromStr for Topic {
    type Err = InvalidTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "board:create" => return Ok(Self::BoardCreate),
            "board:delete" => return Ok(Self::BoardDelete),
            _ => {}
        }

        let invalid = || InvalidTopic(s.to_string());
        let (prefix, id) = s.rsplit_once(':').ok_or_else(invalid)?;
        let id: BoardId = id.parse().map_err(|_| invalid())?;
        match prefix {
            "board:update" => Ok(Self::BoardUpdate(id)),
            "column:reorder" => Ok(Self::ColumnReorder(id)),
            "card:create" => Ok(Self::CardCreate(id)),
            "card:reorder" => Ok(Self::CardReorder(id)),
            "card:update" => Ok(Self::CardUpdate(id)),
            "card:delete" => Ok(Self::CardDelete(id)),
            _ => Err(invalid()),
        }
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.to_string()
    }
}

impl TryFrom<String> for Topic {
    type Error = InvalidTopic;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_strings() {
        assert_eq!(Topic::BoardCreate.to_string(), "board:create");
        assert_eq!(Topic::BoardDelete.to_string(), "board:delete");
        assert_eq!(Topic::ColumnReorder(42).to_string(), "column:reorder:42");
        assert_eq!(Topic::CardDelete(7).to_string(), "card:delete:7");
    }

    #[test]
    fn test_topic_parse() {
        for topic in [
            Topic::BoardCreate,
            Topic::BoardDelete,
            Topic::BoardUpdate(1),
            Topic::ColumnReorder(2),
            Topic::CardCreate(3),
            Topic::CardReorder(4),
            Topic::CardUpdate(5),
            Topic::CardDelete(6),
        ] {
            assert_eq!(topic.to_string().parse::<Topic>(), Ok(topic));
        }
        assert!("board:update".parse::<Topic>().is_err());
        assert!("card:move:3".parse::<Topic>().is_err());
        assert!("card:reorder:x".parse::<Topic>().is_err());
    }

    #[test]
    fn test_scope() {
        assert!(Topic::BoardCreate.is_global());
        assert_eq!(Topic::CardReorder(9).board_id(), Some(9));
        assert_eq!(
            serde_json::to_string(&Topic::CardUpdate(3)).unwrap(),
            "\"card:update:3\""
        );
    }
}
