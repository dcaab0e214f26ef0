//! Quest graph synchronization core.
//!
//! Holds the canonical quest graph of a builder session ([`GraphModel`]),
//! derives display labels and edit affordances per node kind
//! ([`presentation`]), reconciles backend snapshots into canvas state
//! ([`Reconciler`]) and applies user edits coming back from the canvas
//! ([`QuestWorkspace::apply_edit`]). No I/O happens in this crate.

pub mod canvas;
pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod presentation;
pub mod reconcile;
pub mod workspace;

// Re-export commonly used types
pub use canvas::{CanvasEdit, CanvasView, EditOutcome};
pub use edge::QuestEdge;
pub use error::CoreError;
pub use graph::{GraphDiagnostic, GraphModel, QuestGraph};
pub use id::{EdgeId, NodeId};
pub use node::{NodeKind, Position, QuestNode};
pub use presentation::{label, EditableField, NodeCapabilities};
pub use reconcile::{reconcile, RenderableGraph, ReconcilePolicy, Reconciler};
pub use workspace::QuestWorkspace;
