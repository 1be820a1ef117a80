// src/chat/events.rs
use serde::{Deserialize, Serialize};

use crate::model::{CompositeResult, RankingEntry};

/// One frame of a chat turn. Serialized with a `type` tag, e.g.
/// `{"type":"status","message":"Thinking..."}` or `{"type":"done"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Status {
        message: String,
    },
    Intent {
        action: String,
        subjects: Vec<String>,
        response: String,
    },
    Text {
        content: String,
    },
    Score {
        politician: Box<CompositeResult>,
    },
    Rankings {
        data: Vec<RankingEntry>,
    },
    Done,
}

impl StreamEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn score(result: CompositeResult) -> Self {
        Self::Score {
            politician: Box::new(result),
        }
    }

    /// Short tag as serialized in `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Intent { .. } => "intent",
            Self::Text { .. } => "text",
            Self::Score { .. } => "score",
            Self::Rankings { .. } => "rankings",
            Self::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(StreamEvent::status("Thinking...")).unwrap();
        assert_eq!(v, json!({"type": "status", "message": "Thinking..."}));
        let v = serde_json::to_value(StreamEvent::Done).unwrap();
        assert_eq!(v, json!({"type": "done"}));
        let v = serde_json::to_value(StreamEvent::Rankings {
            data: vec![RankingEntry {
                rank: 1,
                name: "A".into(),
                score: 60.0,
            }],
        })
        .unwrap();
        assert_eq!(
            v,
            json!({"type": "rankings", "data": [{"rank": 1, "name": "A", "score": 60.0}]})
        );
    }
}
