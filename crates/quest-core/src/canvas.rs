//! Canvas adapter protocol.
//!
//! A visual editor renders a [`RenderableGraph`] through [`CanvasView`] and
//! reports user-initiated changes as [`CanvasEdit`] values. Edits are local
//! structural changes: they are written straight into the session's
//! [`GraphModel`](crate::graph::GraphModel) and never go through the backend.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};
use crate::node::Position;
use crate::presentation::EditableField;
use crate::reconcile::RenderableGraph;

/// A change made by the user on the canvas or in the node editor panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEdit {
    /// The user dragged a node.
    MoveNode { id: NodeId, position: Position },
    /// The user drew a connection between two nodes.
    Connect {
        source: NodeId,
        target: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// The user changed a field in the node editor.
    SetField {
        id: NodeId,
        field: EditableField,
        value: String,
    },
}

/// What an applied [`CanvasEdit`] did to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Moved,
    Connected(EdgeId),
    /// An edge between the same pair already existed; nothing was added.
    AlreadyConnected,
    FieldUpdated,
}

/// Base edge id for a user-drawn connection. The workspace appends a numeric
/// suffix when this id is already taken.
pub fn connection_edge_id(source: &NodeId, target: &NodeId) -> EdgeId {
    EdgeId(format!("edge-{}-{}", source, target))
}

/// Something that can draw a renderable graph.
pub trait CanvasView {
    fn render(&mut self, graph: &RenderableGraph);
}
