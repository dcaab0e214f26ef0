//! Line commands for the interactive chat and the text canvas.

use std::io::Write;

use quest_core::presentation::editable_fields;
use quest_core::{
    CanvasEdit, CanvasView, EditableField, GraphDiagnostic, NodeId, Position, RenderableGraph,
};

/// One line typed at the `questbuilder chat` prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Plain text: a chat message for the backend.
    Say(String),
    /// `/graph`
    Graph,
    /// `/json`
    Json,
    /// `/move <id> <x> <y>` / `/connect ...` / `/set ...`
    Edit(CanvasEdit),
    /// `/fields <id>`
    Fields(NodeId),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  <text>                         send a chat message
  /graph                         show the quest graph
  /json                          print the quest graph as JSON
  /move <id> <x> <y>             move a node
  /connect <source> <target> [label]
                                 connect two nodes
  /fields <id>                   show editable fields of a node
  /set <id> <field> <value...>   change a field (title, dialogue, question, description)
  /help                          show this help
  /quit                          leave";

/// Parses a prompt line.
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(ReplCommand::Say(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (command, args.as_slice()) {
        ("graph", []) => Ok(ReplCommand::Graph),
        ("json", []) => Ok(ReplCommand::Json),
        ("help", _) => Ok(ReplCommand::Help),
        ("quit" | "exit", _) => Ok(ReplCommand::Quit),
        ("move", [id, x, y]) => {
            let x: f64 = x.parse().map_err(|_| format!("invalid x coordinate '{}'", x))?;
            let y: f64 = y.parse().map_err(|_| format!("invalid y coordinate '{}'", y))?;
            Ok(ReplCommand::Edit(CanvasEdit::MoveNode {
                id: NodeId::from(*id),
                position: Position::new(x, y),
            }))
        }
        ("connect", [source, target, label @ ..]) => Ok(ReplCommand::Edit(CanvasEdit::Connect {
            source: NodeId::from(*source),
            target: NodeId::from(*target),
            label: if label.is_empty() {
                None
            } else {
                Some(label.join(" "))
            },
        })),
        ("fields", [id]) => Ok(ReplCommand::Fields(NodeId::from(*id))),
        ("set", [id, field, value @ ..]) if !value.is_empty() => {
            let field: EditableField = field.parse()?;
            Ok(ReplCommand::Edit(CanvasEdit::SetField {
                id: NodeId::from(*id),
                field,
                value: value.join(" "),
            }))
        }
        _ => Err(format!("unrecognized command '/{}', try /help", rest)),
    }
}

/// Draws the quest graph as indented text.
pub struct TextCanvas<W: Write> {
    out: W,
}

impl<W: Write> TextCanvas<W> {
    pub fn new(out: W) -> Self {
        TextCanvas { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn diagnostics(&mut self, diagnostics: &[GraphDiagnostic]) {
        for diag in diagnostics {
            let _ = writeln!(self.out, "  ! {}", diag);
        }
    }
}

impl<W: Write> CanvasView for TextCanvas<W> {
    fn render(&mut self, graph: &RenderableGraph) {
        if graph.nodes.is_empty() && graph.edges.is_empty() {
            let _ = writeln!(
                self.out,
                "  (the quest graph will appear here once the AI generates it)"
            );
            return;
        }
        if !graph.nodes.is_empty() {
            let _ = writeln!(self.out, "  nodes:");
        }
        for node in &graph.nodes {
            let _ = writeln!(
                self.out,
                "    {:<14} {:<14} ({:.0}, {:.0})  {}",
                node.id, node.kind, node.position.x, node.position.y, node.label()
            );
        }
        if !graph.edges.is_empty() {
            let _ = writeln!(self.out, "  edges:");
        }
        for edge in &graph.edges {
            let arrow = if edge.animated { "~>" } else { "->" };
            let caption = edge
                .label
                .as_deref()
                .map(|l| format!("  [{}]", l))
                .unwrap_or_default();
            let _ = writeln!(
                self.out,
                "    {}: {} {} {}{}",
                edge.id, edge.source, arrow, edge.target, caption
            );
        }
    }
}

/// Formats the editor fields of a node, one per line.
pub fn describe_fields(node: &quest_core::QuestNode) -> String {
    let fields = editable_fields(node);
    if fields.is_empty() {
        return format!("  {} ({}) has no editable fields", node.id, node.kind);
    }
    fields
        .iter()
        .map(|f| format!("  {}: {}", f.field, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}
