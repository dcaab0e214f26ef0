//! Quest node types.
//!
//! A [`QuestNode`] is the backend's shape for one step of a quest: an id, a
//! [`NodeKind`] tag, a canvas [`Position`] and an open `data` map whose
//! recognized keys depend on the kind (see [`crate::presentation`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::id::NodeId;

/// The node type tag.
///
/// Serialized as the camelCase wire string. Tags this crate does not know are
/// kept verbatim in [`NodeKind::Unknown`] so that they survive a round trip
/// back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Start,
    QuestStep,
    Choice,
    RealityBridge,
    End,
    Unknown(String),
}

impl NodeKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Start => "start",
            NodeKind::QuestStep => "questStep",
            NodeKind::Choice => "choice",
            NodeKind::RealityBridge => "realityBridge",
            NodeKind::End => "end",
            NodeKind::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NodeKind::Unknown(_))
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "start" => NodeKind::Start,
            "questStep" => NodeKind::QuestStep,
            "choice" => NodeKind::Choice,
            "realityBridge" => NodeKind::RealityBridge,
            "end" => NodeKind::End,
            _ => NodeKind::Unknown(tag),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        NodeKind::from(tag.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One node of a quest graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    /// Kind-specific payload. Unrecognized keys are carried through untouched.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl QuestNode {
    /// Creates a node with an empty data map.
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        QuestNode {
            id: NodeId::new(id),
            kind,
            position,
            data: Map::new(),
        }
    }

    /// Builder-style setter for a data entry.
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Returns `data[key]` if it is a string.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Checks the structural shape: non-empty id and finite coordinates.
    pub fn check_shape(&self) -> Result<(), CoreError> {
        if self.id.as_str().is_empty() {
            return Err(CoreError::EmptyId { entity: "node" });
        }
        if !self.position.is_finite() {
            return Err(CoreError::InvalidPosition {
                id: self.id.clone(),
                x: self.position.x,
                y: self.position.y,
            });
        }
        Ok(())
    }
}
