//! Core error types for quest-core.
//!
//! Uses `thiserror` for structured, matchable error variants. None of these
//! are fatal: callers degrade to "no update" or surface them to the editor.

use crate::id::{EdgeId, NodeId};
use crate::presentation::EditableField;
use thiserror::Error;

/// Errors produced by the quest graph model and its editors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: '{id}'")]
    NodeNotFound { id: NodeId },

    /// An edge with this id already exists.
    #[error("duplicate edge id: '{id}'")]
    DuplicateEdge { id: EdgeId },

    /// A node or edge was given an empty id.
    #[error("empty {entity} id")]
    EmptyId { entity: &'static str },

    /// A node position was not a pair of finite numbers.
    #[error("invalid position for node '{id}': ({x}, {y})")]
    InvalidPosition { id: NodeId, x: f64, y: f64 },

    /// The node's type does not expose this editable field.
    #[error("node '{id}' has no editable field '{field}'")]
    UnsupportedField { id: NodeId, field: EditableField },

    /// A graph payload did not have the quest graph shape.
    #[error("malformed graph: {reason}")]
    MalformedGraph { reason: String },
}
