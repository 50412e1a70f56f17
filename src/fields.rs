use std::collections::HashMap;

use ego_tree::NodeRef;
use scraper::{Html, Node};

use crate::types::NoteField;

/// User-configured field priorities for the two sides of a display row.
/// Order encodes priority: the first non-empty match wins.
#[derive(Debug, Clone)]
pub struct FieldPreference {
    pub front: Vec<String>,
    pub back: Vec<String>,
}

impl FieldPreference {
    pub fn new(front: Vec<String>, back: Vec<String>) -> Self {
        Self { front, back }
    }
}

/// Title/subtitle pair projected from one record's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub title: String,
    pub subtitle: String,
}

/// Project a record's fields onto a display row. Pure: the same fields and
/// preferences always yield the same projection.
pub fn project(fields: &HashMap<String, NoteField>, prefs: &FieldPreference) -> Projection {
    Projection {
        title: pick(fields, &prefs.front),
        subtitle: pick(fields, &prefs.back),
    }
}

/// First preferred field whose flattened text is non-empty. A configured
/// name missing from this record is skipped, not an error: note types
/// differ within a collection. When no preference matches, fall back to the
/// first non-empty field in schema order, so a record with any content at
/// all never renders blank. An all-empty record yields the empty string.
fn pick(fields: &HashMap<String, NoteField>, preferred: &[String]) -> String {
    for name in preferred {
        if let Some(field) = fields.get(name) {
            let text = strip_html(&field.value);
            if !text.is_empty() {
                return text;
            }
        }
    }

    let mut in_schema_order: Vec<&NoteField> = fields.values().collect();
    in_schema_order.sort_by_key(|f| f.order);
    for field in in_schema_order {
        let text = strip_html(&field.value);
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

/// Flatten a field's HTML value to one line of plain text. Tags are
/// dropped (`<style>`/`<script>` blocks including their contents), character
/// references are decoded by the parser, and a multi-line result collapses
/// to its first line plus " [...]" so a long card back still fits one
/// launcher row.
pub fn strip_html(value: &str) -> String {
    let fragment = Html::parse_fragment(value);
    let mut text = String::new();
    collect_text(fragment.tree.root(), &mut text);

    let trimmed = text.trim();
    match trimmed.split_once('\n') {
        Some((first, _)) => format!("{} [...]", first.trim_end()),
        None => trimmed.to_string(),
    }
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text),
            Node::Element(element) if element.name() == "style" || element.name() == "script" => {}
            Node::Element(_) => collect_text(child, out),
            _ => {}
        }
    }
}
