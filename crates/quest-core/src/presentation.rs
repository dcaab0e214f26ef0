//! Node presentation: display labels and edit affordances per node kind.
//!
//! [`label`] is a pure, total function over every [`NodeKind`], including
//! kinds this crate does not recognize. [`NodeCapabilities`] describes which
//! `data` fields an editor panel may offer for a kind, so the editor can be
//! generated from the capability set instead of switching on the type tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::node::{NodeKind, QuestNode};

pub const START_LABEL: &str = "Начало";
pub const QUEST_STEP_LABEL: &str = "Шаг квеста";
pub const CHOICE_LABEL: &str = "Выбор";
pub const REALITY_BRIDGE_PREFIX: &str = "Reality Bridge: ";
pub const END_LABEL: &str = "Конец";
pub const FALLBACK_LABEL: &str = "Узел";
pub const ELLIPSIS: &str = "...";

/// Characters of `dialogue` shown in a quest step label.
pub const DIALOGUE_PREVIEW_CHARS: usize = 30;
/// Characters of `description` shown in a reality bridge label.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 20;

/// Computes the display label of a node.
///
/// Truncation counts characters, not bytes. A quest step with a dialogue
/// always gets the ellipsis, even when nothing was cut.
pub fn label(node: &QuestNode) -> String {
    match &node.kind {
        NodeKind::Start => non_empty(node.data_str("title"))
            .unwrap_or(START_LABEL)
            .to_string(),
        NodeKind::QuestStep => match node.data_str("dialogue") {
            Some(dialogue) => {
                format!("{}{}", preview(dialogue, DIALOGUE_PREVIEW_CHARS), ELLIPSIS)
            }
            None => QUEST_STEP_LABEL.to_string(),
        },
        NodeKind::Choice => non_empty(node.data_str("question"))
            .unwrap_or(CHOICE_LABEL)
            .to_string(),
        NodeKind::RealityBridge => {
            let description = node
                .data_str("description")
                .map(|d| preview(d, DESCRIPTION_PREVIEW_CHARS))
                .unwrap_or("");
            format!("{}{}", REALITY_BRIDGE_PREFIX, description)
        }
        NodeKind::End => END_LABEL.to_string(),
        NodeKind::Unknown(_) => FALLBACK_LABEL.to_string(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// First `max_chars` characters of `s` (all of `s` if shorter).
fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Edit affordances
// ---------------------------------------------------------------------------

/// A `data` field an editor may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditableField {
    Title,
    Dialogue,
    Question,
    Description,
}

impl EditableField {
    pub const ALL: [EditableField; 4] = [
        EditableField::Title,
        EditableField::Dialogue,
        EditableField::Question,
        EditableField::Description,
    ];

    /// The `data` key backing this field.
    pub fn key(self) -> &'static str {
        match self {
            EditableField::Title => "title",
            EditableField::Dialogue => "dialogue",
            EditableField::Question => "question",
            EditableField::Description => "description",
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EditableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditableField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| {
                format!(
                    "unknown field '{}', expected title/dialogue/question/description",
                    s
                )
            })
    }
}

/// The set of editable fields a node kind supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeCapabilities {
    pub has_title: bool,
    pub has_dialogue: bool,
    pub has_question: bool,
    pub has_description: bool,
}

impl NodeCapabilities {
    pub fn supports(&self, field: EditableField) -> bool {
        match field {
            EditableField::Title => self.has_title,
            EditableField::Dialogue => self.has_dialogue,
            EditableField::Question => self.has_question,
            EditableField::Description => self.has_description,
        }
    }

    /// Supported fields in canonical order.
    pub fn fields(&self) -> Vec<EditableField> {
        EditableField::ALL
            .into_iter()
            .filter(|field| self.supports(*field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

impl NodeKind {
    /// Editable fields for this kind. Unknown kinds are read-only.
    pub fn capabilities(&self) -> NodeCapabilities {
        let none = NodeCapabilities::default();
        match self {
            NodeKind::Start => NodeCapabilities {
                has_title: true,
                ..none
            },
            NodeKind::QuestStep => NodeCapabilities {
                has_dialogue: true,
                ..none
            },
            NodeKind::Choice => NodeCapabilities {
                has_question: true,
                ..none
            },
            NodeKind::RealityBridge => NodeCapabilities {
                has_title: true,
                has_description: true,
                ..none
            },
            NodeKind::End | NodeKind::Unknown(_) => none,
        }
    }
}

/// Current value of one editable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub field: EditableField,
    /// Empty when the field is absent or not a string.
    pub value: String,
}

/// Lists the editable fields of a node with their current values.
pub fn editable_fields(node: &QuestNode) -> Vec<FieldValue> {
    node.kind
        .capabilities()
        .fields()
        .into_iter()
        .map(|field| FieldValue {
            field,
            value: node.data_str(field.key()).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Writes an editable field into the node's `data`.
pub fn set_field(
    node: &mut QuestNode,
    field: EditableField,
    value: String,
) -> Result<(), CoreError> {
    if !node.kind.capabilities().supports(field) {
        return Err(CoreError::UnsupportedField {
            id: node.id.clone(),
            field,
        });
    }
    node.data.insert(field.key().to_string(), Value::String(value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Position;
    use proptest::prelude::*;

    fn node(kind: &str) -> QuestNode {
        QuestNode::new("n", NodeKind::from(kind), Position::default())
    }

    #[test]
    fn fixed_labels_match_editor_texts() {
        assert_eq!(label(&node("start")), "Начало");
        assert_eq!(label(&node("questStep")), "Шаг квеста");
        assert_eq!(label(&node("choice")), "Выбор");
        assert_eq!(label(&node("realityBridge")), "Reality Bridge: ");
        assert_eq!(label(&node("end")), "Конец");
        assert_eq!(label(&node("minigame")), "Узел");
    }

    #[test]
    fn start_uses_title() {
        assert_eq!(label(&node("start").with_data("title", "Sharing Quest")), "Sharing Quest");
    }

    #[test]
    fn start_falls_back_on_missing_or_empty_title() {
        assert_eq!(label(&node("start")), START_LABEL);
        assert_eq!(label(&node("start").with_data("title", "")), START_LABEL);
    }

    #[test]
    fn quest_step_truncates_to_thirty_chars() {
        let dialogue = "Once upon a time a little fox found a shiny red apple";
        let got = label(&node("questStep").with_data("dialogue", dialogue));
        assert_eq!(got, "Once upon a time a little fox ...");
        assert_eq!(got.chars().count(), DIALOGUE_PREVIEW_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn quest_step_short_dialogue_still_gets_ellipsis() {
        assert_eq!(label(&node("questStep").with_data("dialogue", "Hi!")), "Hi!...");
        assert_eq!(label(&node("questStep").with_data("dialogue", "")), "...");
    }

    #[test]
    fn quest_step_without_dialogue_uses_placeholder() {
        assert_eq!(label(&node("questStep")), QUEST_STEP_LABEL);
    }

    #[test]
    fn quest_step_counts_characters_not_bytes() {
        let dialogue = "Привет! Давай поделимся игрушками с друзьями сегодня";
        let got = label(&node("questStep").with_data("dialogue", dialogue));
        let expected: String = dialogue.chars().take(30).collect();
        assert_eq!(got, format!("{}...", expected));
    }

    #[test]
    fn choice_uses_question() {
        assert_eq!(
            label(&node("choice").with_data("question", "Share the toy?")),
            "Share the toy?"
        );
        assert_eq!(label(&node("choice")), CHOICE_LABEL);
    }

    #[test]
    fn reality_bridge_prefixes_description() {
        let got = label(
            &node("realityBridge").with_data("description", "Give a toy to a friend at school"),
        );
        assert_eq!(got, "Reality Bridge: Give a toy to a frie");
        assert_eq!(label(&node("realityBridge")), REALITY_BRIDGE_PREFIX);
    }

    #[test]
    fn end_ignores_data() {
        assert_eq!(label(&node("end").with_data("title", "Bye")), END_LABEL);
    }

    #[test]
    fn unknown_kind_gets_fallback() {
        assert_eq!(label(&node("minigame")), FALLBACK_LABEL);
    }

    #[test]
    fn non_string_data_is_treated_as_absent() {
        assert_eq!(label(&node("questStep").with_data("dialogue", 42)), QUEST_STEP_LABEL);
        assert_eq!(label(&node("start").with_data("title", true)), START_LABEL);
    }

    #[test]
    fn capabilities_per_kind() {
        assert_eq!(NodeKind::Start.capabilities().fields(), vec![EditableField::Title]);
        assert_eq!(
            NodeKind::RealityBridge.capabilities().fields(),
            vec![EditableField::Title, EditableField::Description]
        );
        assert!(NodeKind::End.capabilities().is_empty());
        assert!(NodeKind::from("portal").capabilities().is_empty());
    }

    #[test]
    fn editable_fields_report_current_values() {
        let n = node("choice").with_data("question", "Why?");
        assert_eq!(
            editable_fields(&n),
            vec![FieldValue {
                field: EditableField::Question,
                value: "Why?".to_string(),
            }]
        );
    }

    #[test]
    fn set_field_writes_supported_fields_only() {
        let mut n = node("questStep");
        set_field(&mut n, EditableField::Dialogue, "Hello".to_string()).unwrap();
        assert_eq!(n.data_str("dialogue"), Some("Hello"));

        let err = set_field(&mut n, EditableField::Question, "?".to_string()).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedField { field: EditableField::Question, .. }));
    }

    #[test]
    fn editable_field_parses_from_key() {
        assert_eq!("title".parse::<EditableField>().unwrap(), EditableField::Title);
        assert!("colour".parse::<EditableField>().is_err());
    }

    proptest! {
        #[test]
        fn label_is_total_and_non_empty(
            kind in prop_oneof![
                Just("start".to_string()),
                Just("questStep".to_string()),
                Just("choice".to_string()),
                Just("realityBridge".to_string()),
                Just("end".to_string()),
                "[a-zA-Z]{0,12}",
            ],
            key in prop_oneof![
                Just("title"),
                Just("dialogue"),
                Just("question"),
                Just("description"),
                Just("other"),
            ],
            value in ".{0,64}",
        ) {
            let n = QuestNode::new("p", NodeKind::from(kind), Position::default())
                .with_data(key, value);
            prop_assert!(!label(&n).is_empty());
        }

        #[test]
        fn quest_step_label_is_prefix_plus_ellipsis(dialogue in ".{0,80}") {
            let n = node("questStep").with_data("dialogue", dialogue.clone());
            let got = label(&n);
            let expected: String = dialogue.chars().take(DIALOGUE_PREVIEW_CHARS).collect();
            prop_assert_eq!(got, format!("{}{}", expected, ELLIPSIS));
        }
    }
}
