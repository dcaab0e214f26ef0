//! Wire types exchanged with the Quest Builder Backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quest_core::QuestGraph;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        })
    }
}

/// One entry of a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// `POST /api/builder/chat` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    /// `null` on the first call of a session.
    pub session_id: Option<String>,
}

/// `POST /api/builder/chat` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub ai_response: String,
    pub session_id: String,
    pub stage: String,
    /// Raw graph payload, validated by the reconciler before use.
    #[serde(default)]
    pub graph: Option<Value>,
}

/// Difficulty of a library quest.
///
/// The backend stores this as free text; values other than the three known
/// ones are kept verbatim in [`Difficulty::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Other(value) => value,
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(value),
        }
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An entry of `GET /api/quests/existing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingQuest {
    pub id: String,
    pub title: String,
    pub location: String,
    pub difficulty: Difficulty,
    pub psychological_module: String,
    pub graph_structure: QuestGraph,
    pub rating: f64,
    pub plays_count: u64,
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_request_sends_null_session_id() {
        let req = ChatRequest {
            user_id: "u1".into(),
            message: "hi".into(),
            session_id: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "user_id": "u1", "message": "hi", "session_id": null })
        );
    }

    #[test]
    fn response_graph_is_optional() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "ai_response": "ok", "session_id": "s1", "stage": "clarifying"
        }))
        .unwrap();
        assert!(resp.graph.is_none());

        let resp: ChatResponse = serde_json::from_value(json!({
            "ai_response": "ok", "session_id": "s1", "stage": "clarifying", "graph": null
        }))
        .unwrap();
        assert!(resp.graph.is_none());
    }

    #[test]
    fn existing_quest_ignores_extra_fields() {
        let quest: ExistingQuest = serde_json::from_value(json!({
            "id": "q1",
            "title": "Forest of Friendship",
            "location": "forest",
            "difficulty": "easy",
            "psychological_module": "empathy",
            "graph_structure": { "nodes": [], "edges": [] },
            "is_public": true,
            "moderation_status": "approved",
            "rating": 4.5,
            "plays_count": 12
        }))
        .unwrap();
        assert_eq!(quest.difficulty, Difficulty::Easy);
        assert_eq!(quest.plays_count, 12);
    }

    #[test]
    fn unknown_difficulty_is_kept_verbatim() {
        let quests: Vec<ExistingQuest> = serde_json::from_value(json!([{
            "id": "q2",
            "title": "Night Sky",
            "location": "home",
            "difficulty": "сложный",
            "psychological_module": "courage",
            "graph_structure": { "nodes": [], "edges": [] },
            "rating": 0.0,
            "plays_count": 0
        }]))
        .unwrap();
        assert_eq!(quests[0].difficulty, Difficulty::Other("сложный".to_string()));
        assert_eq!(quests[0].difficulty.to_string(), "сложный");
        assert_eq!(
            serde_json::to_value(&quests[0].difficulty).unwrap(),
            json!("сложный")
        );
    }

    #[test]
    fn roles_are_lowercase() {
        let msg = ChatMessage::assistant("hello");
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "assistant");
    }
}
