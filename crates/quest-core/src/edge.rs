//! Quest edge type.
//!
//! Edges are directed `source -> target` links between quest nodes. Endpoints
//! are not required to exist: a graph emitted mid-conversation may reference
//! nodes the backend has not produced yet.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};

/// One directed edge of a quest graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Optional caption, typically the answer that leads along this edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl QuestEdge {
    /// Creates an unlabeled, non-animated edge.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        QuestEdge {
            id: EdgeId::new(id),
            source: NodeId::new(source),
            target: NodeId::new(target),
            label: None,
            animated: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns `true` if the edge should be drawn animated. Absent means no.
    pub fn is_animated(&self) -> bool {
        self.animated.unwrap_or(false)
    }

    /// Returns `true` if this edge connects `source` to `target`.
    pub fn connects(&self, source: &NodeId, target: &NodeId) -> bool {
        &self.source == source && &self.target == target
    }

    pub fn check_shape(&self) -> Result<(), CoreError> {
        if self.id.as_str().is_empty() {
            return Err(CoreError::EmptyId { entity: "edge" });
        }
        Ok(())
    }
}
