//! QuestGraph and the GraphModel that owns the canonical copy during a session.
//!
//! [`QuestGraph`] is the plain wire value (ordered nodes + ordered edges) that
//! the backend, the quest library and the canvas all exchange. [`GraphModel`]
//! wraps one graph with id lookups and a revision counter.
//!
//! The model only enforces structural shape (non-empty ids, finite
//! positions, unique edge ids on insert). Semantic problems such as dangling
//! edges or a missing start node are allowed while the quest is being built
//! and are reported on demand by [`GraphModel::diagnostics`].

use std::fmt;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edge::QuestEdge;
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};
use crate::node::{NodeKind, Position, QuestNode};
use crate::presentation::{self, EditableField};

/// A quest graph as exchanged with the backend.
///
/// Both `nodes` and `edges` are required on the wire; a payload missing
/// either is not a graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestGraph {
    pub nodes: Vec<QuestNode>,
    pub edges: Vec<QuestEdge>,
}

impl QuestGraph {
    pub fn new(nodes: Vec<QuestNode>, edges: Vec<QuestEdge>) -> Self {
        QuestGraph { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Parses a JSON payload into a graph and checks its structural shape.
    pub fn from_value(payload: &Value) -> Result<Self, CoreError> {
        let graph: QuestGraph =
            serde_json::from_value(payload.clone()).map_err(|err| CoreError::MalformedGraph {
                reason: err.to_string(),
            })?;
        graph.check_shape()?;
        Ok(graph)
    }

    /// Checks every node and edge for structural shape.
    pub fn check_shape(&self) -> Result<(), CoreError> {
        for node in &self.nodes {
            node.check_shape()?;
        }
        for edge in &self.edges {
            edge.check_shape()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A semantic problem found in a graph at render time.
///
/// None of these block editing; they are shown next to the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphDiagnostic {
    /// The graph has nodes but no `start` node.
    MissingStart,
    /// More than one `start` node.
    MultipleStarts { ids: Vec<NodeId> },
    /// Two or more nodes share an id.
    DuplicateNodeId { id: NodeId },
    /// An edge endpoint references a node that does not exist.
    DanglingEdge { edge: EdgeId, missing: NodeId },
    /// The node cannot be reached from the start node.
    Unreachable { id: NodeId },
}

impl fmt::Display for GraphDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphDiagnostic::MissingStart => write!(f, "graph has no start node"),
            GraphDiagnostic::MultipleStarts { ids } => {
                let ids: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
                write!(f, "graph has {} start nodes: {}", ids.len(), ids.join(", "))
            }
            GraphDiagnostic::DuplicateNodeId { id } => write!(f, "duplicate node id '{}'", id),
            GraphDiagnostic::DanglingEdge { edge, missing } => {
                write!(f, "edge '{}' references missing node '{}'", edge, missing)
            }
            GraphDiagnostic::Unreachable { id } => {
                write!(f, "node '{}' is unreachable from start", id)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GraphModel
// ---------------------------------------------------------------------------

/// Owns the canonical [`QuestGraph`] of one session.
///
/// Lookups go through id indexes rebuilt on every structural change. When a
/// graph contains duplicate node ids the index points at the first one.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    graph: QuestGraph,
    node_index: IndexMap<NodeId, usize>,
    edge_index: IndexMap<EdgeId, usize>,
    revision: u64,
}

impl GraphModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model holding `graph`, after a structural shape check.
    pub fn from_graph(graph: QuestGraph) -> Result<Self, CoreError> {
        let mut model = GraphModel::new();
        model.replace(graph)?;
        Ok(model)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &QuestGraph {
        &self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&QuestNode> {
        self.node_index.get(id).map(|&i| &self.graph.nodes[i])
    }

    pub fn get_edge(&self, id: &EdgeId) -> Option<&QuestEdge> {
        self.edge_index.get(id).map(|&i| &self.graph.edges[i])
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Substitutes the whole graph in one step.
    ///
    /// On a shape error the current graph is left untouched.
    pub fn replace(&mut self, graph: QuestGraph) -> Result<(), CoreError> {
        graph.check_shape()?;
        self.graph = graph;
        self.reindex();
        self.revision += 1;
        Ok(())
    }

    /// Appends an edge. Endpoints are not checked.
    pub fn add_edge(&mut self, edge: QuestEdge) -> Result<(), CoreError> {
        edge.check_shape()?;
        if self.edge_index.contains_key(&edge.id) {
            return Err(CoreError::DuplicateEdge { id: edge.id });
        }
        self.edge_index.insert(edge.id.clone(), self.graph.edges.len());
        self.graph.edges.push(edge);
        self.revision += 1;
        Ok(())
    }

    /// Moves a node to `position`.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<(), CoreError> {
        if !position.is_finite() {
            return Err(CoreError::InvalidPosition {
                id: id.clone(),
                x: position.x,
                y: position.y,
            });
        }
        let index = self.index_of(id)?;
        self.graph.nodes[index].position = position;
        self.revision += 1;
        Ok(())
    }

    /// Writes an editable field of a node (see [`presentation::set_field`]).
    pub fn set_node_field(
        &mut self,
        id: &NodeId,
        field: EditableField,
        value: String,
    ) -> Result<(), CoreError> {
        let index = self.index_of(id)?;
        presentation::set_field(&mut self.graph.nodes[index], field, value)?;
        self.revision += 1;
        Ok(())
    }

    fn index_of(&self, id: &NodeId) -> Result<usize, CoreError> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })
    }

    fn reindex(&mut self) {
        self.node_index.clear();
        for (i, node) in self.graph.nodes.iter().enumerate() {
            self.node_index.entry(node.id.clone()).or_insert(i);
        }
        self.edge_index.clear();
        for (i, edge) in self.graph.edges.iter().enumerate() {
            self.edge_index.entry(edge.id.clone()).or_insert(i);
        }
    }

    // -----------------------------------------------------------------------
    // Render-time validation
    // -----------------------------------------------------------------------

    /// Reports semantic problems in the current graph.
    ///
    /// Reachability is only checked when there is exactly one start node.
    pub fn diagnostics(&self) -> Vec<GraphDiagnostic> {
        let mut out = Vec::new();
        if self.graph.nodes.is_empty() {
            return out;
        }

        let mut seen: IndexMap<&NodeId, usize> = IndexMap::new();
        for node in &self.graph.nodes {
            *seen.entry(&node.id).or_insert(0) += 1;
        }
        for (id, count) in &seen {
            if *count > 1 {
                out.push(GraphDiagnostic::DuplicateNodeId { id: (*id).clone() });
            }
        }

        let starts: Vec<NodeId> = self
            .graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Start)
            .map(|n| n.id.clone())
            .collect();
        match starts.len() {
            0 => out.push(GraphDiagnostic::MissingStart),
            1 => {}
            _ => out.push(GraphDiagnostic::MultipleStarts {
                ids: starts.clone(),
            }),
        }

        for edge in &self.graph.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !self.node_index.contains_key(endpoint) {
                    out.push(GraphDiagnostic::DanglingEdge {
                        edge: edge.id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        if let [start] = starts.as_slice() {
            out.extend(
                self.unreachable_from(start)
                    .into_iter()
                    .map(|id| GraphDiagnostic::Unreachable { id }),
            );
        }

        out
    }

    /// Node ids (in graph order) not reachable from `start` along edges.
    fn unreachable_from(&self, start: &NodeId) -> Vec<NodeId> {
        let mut flow: DiGraph<(), ()> = DiGraph::new();
        let indices: IndexMap<&NodeId, NodeIndex> = self
            .node_index
            .keys()
            .map(|id| (id, flow.add_node(())))
            .collect();

        for edge in &self.graph.edges {
            if let (Some(&a), Some(&b)) = (indices.get(&edge.source), indices.get(&edge.target)) {
                flow.add_edge(a, b, ());
            }
        }

        let Some(&root) = indices.get(start) else {
            return Vec::new();
        };
        let mut reached = vec![false; flow.node_count()];
        let mut bfs = Bfs::new(&flow, root);
        while let Some(nx) = bfs.next(&flow) {
            reached[nx.index()] = true;
        }

        indices
            .iter()
            .filter(|(_, nx)| !reached[nx.index()])
            .map(|(id, _)| (*id).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_graph() -> QuestGraph {
        QuestGraph::new(
            vec![
                QuestNode::new("start", NodeKind::Start, Position::new(0.0, 0.0))
                    .with_data("title", "Sharing Quest"),
                QuestNode::new("step", NodeKind::QuestStep, Position::new(0.0, 100.0)),
                QuestNode::new("end", NodeKind::End, Position::new(0.0, 200.0)),
            ],
            vec![
                QuestEdge::new("e1", "start", "step"),
                QuestEdge::new("e2", "step", "end"),
            ],
        )
    }

    #[test]
    fn new_model_is_empty() {
        let model = GraphModel::new();
        assert!(model.is_empty());
        assert_eq!(model.revision(), 0);
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn replace_substitutes_everything() {
        let mut model = GraphModel::from_graph(sample_graph()).unwrap();
        let next = QuestGraph::new(
            vec![QuestNode::new("only", NodeKind::End, Position::default())],
            vec![],
        );
        model.replace(next.clone()).unwrap();

        assert_eq!(model.graph(), &next);
        assert!(model.get_node(&NodeId::from("start")).is_none());
        assert!(model.get_edge(&EdgeId::from("e1")).is_none());
        assert!(model.get_node(&NodeId::from("only")).is_some());
    }

    #[test]
    fn replace_with_bad_shape_keeps_current_graph() {
        let mut model = GraphModel::from_graph(sample_graph()).unwrap();
        let revision = model.revision();
        let bad = QuestGraph::new(
            vec![QuestNode::new("", NodeKind::Start, Position::default())],
            vec![],
        );

        assert!(model.replace(bad).is_err());
        assert_eq!(model.graph(), &sample_graph());
        assert_eq!(model.revision(), revision);
    }

    #[test]
    fn add_edge_appends_in_order() {
        let mut model = GraphModel::from_graph(sample_graph()).unwrap();
        model.add_edge(QuestEdge::new("e3", "start", "end")).unwrap();

        let ids: Vec<&str> = model.graph().edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
        assert_eq!(
            model.get_edge(&EdgeId::from("e3")).unwrap().target,
            NodeId::from("end")
        );
    }

    #[test]
    fn add_edge_rejects_duplicate_id() {
        let mut model = GraphModel::from_graph(sample_graph()).unwrap();
        let result = model.add_edge(QuestEdge::new("e1", "end", "start"));
        match result {
            Err(CoreError::DuplicateEdge { id }) => assert_eq!(id, EdgeId::from("e1")),
            other => panic!("expected DuplicateEdge, got {:?}", other),
        }
        assert_eq!(model.graph().edges.len(), 2);
    }

    #[test]
    fn add_edge_accepts_dangling_endpoints() {
        let mut model = GraphModel::new();
        model.add_edge(QuestEdge::new("e", "ghost", "void")).unwrap();
        assert_eq!(model.graph().edges.len(), 1);
    }

    #[test]
    fn move_node_updates_position_and_revision() {
        let mut model = GraphModel::from_graph(sample_graph()).unwrap();
        let before = model.revision();
        model
            .move_node(&NodeId::from("step"), Position::new(42.0, -7.5))
            .unwrap();

        assert_eq!(
            model.get_node(&NodeId::from("step")).unwrap().position,
            Position::new(42.0, -7.5)
        );
        assert_eq!(model.revision(), before + 1);
    }

    #[test]
    fn move_missing_node_errors() {
        let mut model = GraphModel::new();
        let result = model.move_node(&NodeId::from("nope"), Position::default());
        assert!(matches!(result, Err(CoreError::NodeNotFound { .. })));
    }

    #[test]
    fn from_value_requires_nodes_and_edges() {
        assert!(QuestGraph::from_value(&json!({ "nodes": [] })).is_err());
        assert!(QuestGraph::from_value(&json!({ "edges": [] })).is_err());
        assert!(QuestGraph::from_value(&json!(null)).is_err());
        let graph = QuestGraph::from_value(&json!({ "nodes": [], "edges": [] })).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn well_formed_graph_has_no_diagnostics() {
        let model = GraphModel::from_graph(sample_graph()).unwrap();
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn diagnostics_report_dangling_edges() {
        let mut graph = sample_graph();
        graph.edges.push(QuestEdge::new("e3", "end", "ghost"));
        let model = GraphModel::from_graph(graph).unwrap();

        assert_eq!(
            model.diagnostics(),
            vec![GraphDiagnostic::DanglingEdge {
                edge: EdgeId::from("e3"),
                missing: NodeId::from("ghost"),
            }]
        );
    }

    #[test]
    fn diagnostics_report_start_count() {
        let no_start = GraphModel::from_graph(QuestGraph::new(
            vec![QuestNode::new("end", NodeKind::End, Position::default())],
            vec![],
        ))
        .unwrap();
        assert_eq!(no_start.diagnostics(), vec![GraphDiagnostic::MissingStart]);

        let two_starts = GraphModel::from_graph(QuestGraph::new(
            vec![
                QuestNode::new("a", NodeKind::Start, Position::default()),
                QuestNode::new("b", NodeKind::Start, Position::default()),
            ],
            vec![],
        ))
        .unwrap();
        assert_eq!(
            two_starts.diagnostics(),
            vec![GraphDiagnostic::MultipleStarts {
                ids: vec![NodeId::from("a"), NodeId::from("b")],
            }]
        );
    }

    #[test]
    fn diagnostics_report_unreachable_nodes() {
        let mut graph = sample_graph();
        graph.nodes.push(QuestNode::new(
            "island",
            NodeKind::Choice,
            Position::default(),
        ));
        let model = GraphModel::from_graph(graph).unwrap();

        assert_eq!(
            model.diagnostics(),
            vec![GraphDiagnostic::Unreachable {
                id: NodeId::from("island"),
            }]
        );
    }

    #[test]
    fn duplicate_node_ids_resolve_to_first() {
        let graph = QuestGraph::new(
            vec![
                QuestNode::new("a", NodeKind::Start, Position::new(1.0, 1.0)),
                QuestNode::new("a", NodeKind::End, Position::new(2.0, 2.0)),
            ],
            vec![],
        );
        let model = GraphModel::from_graph(graph).unwrap();

        assert_eq!(
            model.get_node(&NodeId::from("a")).unwrap().kind,
            NodeKind::Start
        );
        assert!(model
            .diagnostics()
            .contains(&GraphDiagnostic::DuplicateNodeId {
                id: NodeId::from("a")
            }));
    }

    #[test]
    fn diagnostic_display() {
        let diag = GraphDiagnostic::DanglingEdge {
            edge: EdgeId::from("e9"),
            missing: NodeId::from("x"),
        };
        assert_eq!(diag.to_string(), "edge 'e9' references missing node 'x'");
    }
}
