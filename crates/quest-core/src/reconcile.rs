//! Graph reconciliation: backend snapshots into renderable canvas state.
//!
//! [`reconcile`] converts a [`QuestGraph`] into the [`RenderableGraph`] a
//! canvas consumes, attaching the computed label to every node's display
//! payload. [`Reconciler`] decides how a new snapshot is merged into the
//! session's [`GraphModel`] before rendering, according to its
//! [`ReconcilePolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::graph::{GraphModel, QuestGraph};
use crate::id::{EdgeId, NodeId};
use crate::node::{NodeKind, Position};
use crate::presentation;

/// A node in canvas shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    /// `label` followed by the node's own data entries.
    pub data: Map<String, Value>,
}

impl RenderNode {
    /// The label shown on the canvas.
    pub fn label(&self) -> &str {
        self.data
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(presentation::FALLBACK_LABEL)
    }
}

/// An edge in canvas shape. `animated` is always explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub animated: bool,
}

/// The complete node and edge sets handed to the canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderableGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderableGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// Converts a quest graph into canvas shape.
///
/// Node order and edge order are preserved. Edges whose endpoints are
/// missing are emitted unchanged; the canvas decides how to draw them.
/// A `label` key inside a node's own data takes precedence over the
/// computed label.
pub fn reconcile(incoming: &QuestGraph) -> RenderableGraph {
    let nodes = incoming
        .nodes
        .iter()
        .map(|node| {
            let mut data = Map::with_capacity(node.data.len() + 1);
            data.insert("label".to_string(), Value::String(presentation::label(node)));
            for (key, value) in &node.data {
                data.insert(key.clone(), value.clone());
            }
            RenderNode {
                id: node.id.clone(),
                kind: node.kind.clone(),
                position: node.position,
                data,
            }
        })
        .collect();

    let edges = incoming
        .edges
        .iter()
        .map(|edge| RenderEdge {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
            animated: edge.is_animated(),
        })
        .collect();

    RenderableGraph { nodes, edges }
}

/// Parses an optional graph payload from a chat response.
///
/// `null`, a payload without `nodes` or `edges`, or one failing the
/// structural shape check all mean "no graph update".
pub fn parse_snapshot(payload: &Value) -> Option<QuestGraph> {
    if payload.is_null() {
        return None;
    }
    match QuestGraph::from_value(payload) {
        Ok(graph) => Some(graph),
        Err(err) => {
            tracing::warn!("discarding graph snapshot: {}", err);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Merge policy
// ---------------------------------------------------------------------------

/// How a new backend snapshot is merged with the graph already on canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// The snapshot replaces everything, positions included.
    #[default]
    Replace,
    /// Nodes whose id already exists keep their current position, so
    /// user drags survive the next AI turn. New nodes use the snapshot
    /// position.
    PreservePositions,
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilePolicy::Replace => f.write_str("replace"),
            ReconcilePolicy::PreservePositions => f.write_str("preserve"),
        }
    }
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(ReconcilePolicy::Replace),
            "preserve" | "preserve_positions" => Ok(ReconcilePolicy::PreservePositions),
            other => Err(format!(
                "invalid reconcile policy '{}', expected replace or preserve",
                other
            )),
        }
    }
}

/// Applies backend snapshots to a [`GraphModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: ReconcilePolicy,
}

impl Reconciler {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Reconciler { policy }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Merges `incoming` into `model` with a single `replace`, then renders
    /// the result.
    pub fn apply(
        &self,
        model: &mut GraphModel,
        mut incoming: QuestGraph,
    ) -> Result<RenderableGraph, CoreError> {
        if self.policy == ReconcilePolicy::PreservePositions {
            let mut kept = 0usize;
            for node in &mut incoming.nodes {
                if let Some(existing) = model.get_node(&node.id) {
                    node.position = existing.position;
                    kept += 1;
                }
            }
            tracing::debug!("kept {} existing node position(s)", kept);
        }
        model.replace(incoming)?;
        Ok(reconcile(model.graph()))
    }
}
