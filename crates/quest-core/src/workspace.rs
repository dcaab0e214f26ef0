//! QuestWorkspace: the graph model plus its rendered canvas state.
//!
//! Every write path (backend snapshot, library load, canvas edit) goes
//! through one `&mut self` method that updates the model and then replaces
//! the rendered graph in a single assignment, so a reader never sees nodes
//! from one revision next to edges from another.

use crate::canvas::{connection_edge_id, CanvasEdit, CanvasView, EditOutcome};
use crate::edge::QuestEdge;
use crate::error::CoreError;
use crate::graph::{GraphDiagnostic, GraphModel, QuestGraph};
use crate::id::{EdgeId, NodeId};
use crate::reconcile::{reconcile, ReconcilePolicy, Reconciler, RenderableGraph};

#[derive(Debug, Clone, Default)]
pub struct QuestWorkspace {
    model: GraphModel,
    reconciler: Reconciler,
    rendered: RenderableGraph,
}

impl QuestWorkspace {
    pub fn new(policy: ReconcilePolicy) -> Self {
        QuestWorkspace {
            model: GraphModel::new(),
            reconciler: Reconciler::new(policy),
            rendered: RenderableGraph::default(),
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn rendered(&self) -> &RenderableGraph {
        &self.rendered
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.reconciler.policy()
    }

    pub fn diagnostics(&self) -> Vec<GraphDiagnostic> {
        self.model.diagnostics()
    }

    /// Merges a backend snapshot according to the workspace policy.
    pub fn apply_snapshot(&mut self, incoming: QuestGraph) -> Result<&RenderableGraph, CoreError> {
        let rendered = self.reconciler.apply(&mut self.model, incoming)?;
        self.rendered = rendered;
        tracing::info!(
            nodes = self.rendered.nodes.len(),
            edges = self.rendered.edges.len(),
            revision = self.model.revision(),
            "applied graph snapshot"
        );
        Ok(&self.rendered)
    }

    /// Loads a graph as-is, without merging (e.g. a quest picked from the
    /// library).
    pub fn load(&mut self, graph: QuestGraph) -> Result<&RenderableGraph, CoreError> {
        self.model.replace(graph)?;
        self.rendered = reconcile(self.model.graph());
        Ok(&self.rendered)
    }

    /// Writes a user edit into the model and re-renders.
    pub fn apply_edit(&mut self, edit: CanvasEdit) -> Result<EditOutcome, CoreError> {
        let outcome = match edit {
            CanvasEdit::MoveNode { id, position } => {
                self.model.move_node(&id, position)?;
                EditOutcome::Moved
            }
            CanvasEdit::Connect {
                source,
                target,
                label,
            } => {
                let exists = self
                    .model
                    .graph()
                    .edges
                    .iter()
                    .any(|e| e.connects(&source, &target));
                if exists {
                    tracing::debug!("connection {} -> {} already exists", source, target);
                    return Ok(EditOutcome::AlreadyConnected);
                }
                let id = self.free_connection_id(&source, &target);
                self.model.add_edge(QuestEdge {
                    id: id.clone(),
                    source,
                    target,
                    label,
                    animated: None,
                })?;
                EditOutcome::Connected(id)
            }
            CanvasEdit::SetField { id, field, value } => {
                self.model.set_node_field(&id, field, value)?;
                EditOutcome::FieldUpdated
            }
        };
        self.rendered = reconcile(self.model.graph());
        Ok(outcome)
    }

    /// Derived id for a new connection, with a `-2`, `-3`, ... suffix when
    /// the plain id already names another edge.
    fn free_connection_id(&self, source: &NodeId, target: &NodeId) -> EdgeId {
        let base = connection_edge_id(source, target);
        let mut id = base.clone();
        let mut suffix = 1u32;
        while self.model.get_edge(&id).is_some() {
            suffix += 1;
            id = EdgeId(format!("{}-{}", base, suffix));
        }
        id
    }

    /// Draws the current rendered graph.
    pub fn render_to(&self, view: &mut impl CanvasView) {
        view.render(&self.rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, Position, QuestNode};
    use crate::presentation::EditableField;

    fn snapshot() -> QuestGraph {
        QuestGraph::new(
            vec![
                QuestNode::new("start", NodeKind::Start, Position::new(0.0, 0.0)),
                QuestNode::new("ask", NodeKind::Choice, Position::new(0.0, 100.0))
                    .with_data("question", "Share?"),
            ],
            vec![],
        )
    }

    struct Recorder {
        frames: Vec<RenderableGraph>,
    }

    impl CanvasView for Recorder {
        fn render(&mut self, graph: &RenderableGraph) {
            self.frames.push(graph.clone());
        }
    }

    #[test]
    fn connect_appends_edge_to_model() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();

        let outcome = ws
            .apply_edit(CanvasEdit::Connect {
                source: NodeId::from("start"),
                target: NodeId::from("ask"),
                label: None,
            })
            .unwrap();

        assert_eq!(outcome, EditOutcome::Connected(EdgeId::from("edge-start-ask")));
        assert_eq!(ws.model().graph().edges.len(), 1);
        assert_eq!(ws.rendered().edges.len(), 1);
        assert!(!ws.rendered().edges[0].animated);
    }

    #[test]
    fn connecting_twice_is_a_no_op() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        let connect = CanvasEdit::Connect {
            source: NodeId::from("start"),
            target: NodeId::from("ask"),
            label: None,
        };
        ws.apply_edit(connect.clone()).unwrap();

        assert_eq!(ws.apply_edit(connect).unwrap(), EditOutcome::AlreadyConnected);
        assert_eq!(ws.model().graph().edges.len(), 1);
    }

    #[test]
    fn colliding_connection_ids_get_a_suffix() {
        let mut ws = QuestWorkspace::default();
        let first = ws
            .apply_edit(CanvasEdit::Connect {
                source: NodeId::from("a"),
                target: NodeId::from("b-c"),
                label: None,
            })
            .unwrap();
        let second = ws
            .apply_edit(CanvasEdit::Connect {
                source: NodeId::from("a-b"),
                target: NodeId::from("c"),
                label: None,
            })
            .unwrap();

        assert_eq!(first, EditOutcome::Connected(EdgeId::from("edge-a-b-c")));
        assert_eq!(second, EditOutcome::Connected(EdgeId::from("edge-a-b-c-2")));
        assert_eq!(ws.model().graph().edges.len(), 2);
    }

    #[test]
    fn connection_id_skips_backend_edge_ids() {
        let mut ws = QuestWorkspace::default();
        let mut graph = snapshot();
        graph.edges.push(QuestEdge::new("edge-start-ask", "ask", "start"));
        ws.apply_snapshot(graph).unwrap();

        let outcome = ws
            .apply_edit(CanvasEdit::Connect {
                source: NodeId::from("start"),
                target: NodeId::from("ask"),
                label: None,
            })
            .unwrap();

        assert_eq!(outcome, EditOutcome::Connected(EdgeId::from("edge-start-ask-2")));
        assert_eq!(ws.rendered().edges.len(), 2);
    }

    #[test]
    fn connect_to_missing_node_is_allowed() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        ws.apply_edit(CanvasEdit::Connect {
            source: NodeId::from("ask"),
            target: NodeId::from("later"),
            label: Some("yes".to_string()),
        })
        .unwrap();
        assert_eq!(ws.rendered().edges[0].label.as_deref(), Some("yes"));
    }

    #[test]
    fn drag_updates_model_and_rendered_positions() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        ws.apply_edit(CanvasEdit::MoveNode {
            id: NodeId::from("ask"),
            position: Position::new(250.0, 80.0),
        })
        .unwrap();

        let rendered = ws.rendered().node(&NodeId::from("ask")).unwrap();
        assert_eq!(rendered.position, Position::new(250.0, 80.0));
    }

    #[test]
    fn drag_survives_next_snapshot_with_preserve_policy() {
        let mut ws = QuestWorkspace::new(ReconcilePolicy::PreservePositions);
        ws.apply_snapshot(snapshot()).unwrap();
        ws.apply_edit(CanvasEdit::MoveNode {
            id: NodeId::from("ask"),
            position: Position::new(250.0, 80.0),
        })
        .unwrap();
        ws.apply_snapshot(snapshot()).unwrap();

        let rendered = ws.rendered().node(&NodeId::from("ask")).unwrap();
        assert_eq!(rendered.position, Position::new(250.0, 80.0));
    }

    #[test]
    fn set_field_relabels_node() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        ws.apply_edit(CanvasEdit::SetField {
            id: NodeId::from("start"),
            field: EditableField::Title,
            value: "Kindness".to_string(),
        })
        .unwrap();

        assert_eq!(ws.rendered().nodes[0].label(), "Kindness");
    }

    #[test]
    fn failed_edit_leaves_state_untouched() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        let before = ws.rendered().clone();

        let result = ws.apply_edit(CanvasEdit::MoveNode {
            id: NodeId::from("ghost"),
            position: Position::default(),
        });
        assert!(result.is_err());
        assert_eq!(ws.rendered(), &before);
    }

    #[test]
    fn load_replaces_without_merging() {
        let mut ws = QuestWorkspace::new(ReconcilePolicy::PreservePositions);
        ws.apply_snapshot(snapshot()).unwrap();
        ws.apply_edit(CanvasEdit::MoveNode {
            id: NodeId::from("start"),
            position: Position::new(9.0, 9.0),
        })
        .unwrap();

        ws.load(snapshot()).unwrap();
        assert_eq!(ws.rendered().nodes[0].position, Position::new(0.0, 0.0));
    }

    #[test]
    fn render_to_draws_current_state() {
        let mut ws = QuestWorkspace::default();
        ws.apply_snapshot(snapshot()).unwrap();
        let mut view = Recorder { frames: Vec::new() };
        ws.render_to(&mut view);
        assert_eq!(view.frames.len(), 1);
        assert_eq!(view.frames[0].nodes.len(), 2);
    }
}
