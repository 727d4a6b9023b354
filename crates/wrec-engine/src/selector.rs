//! Best-effort locator synthesis for an arbitrary document element.

use crate::dom::{Document, NodeId};

/// Synthesize a locator string for `node`. Priority, first match wins:
///
/// 1. `#id` when the element carries an id. Uniqueness is assumed, not
///    verified: the id path must stay cheap and deterministic at capture
///    time, and a duplicate id is unrecoverable at replay anyway.
/// 2. `.c1.c2…` from the class list (original order, empty tokens dropped),
///    but only when a document-wide query for that exact selector matches
///    one element.
/// 3. An ancestor path joined with `" > "`: each level contributes `#id`
///    (which ends the ascent) or the lowercase tag, suffixed with
///    `:nth-of-type(N)` when the element is not the first of its tag among
///    its siblings.
///
/// Path output is not validated; a detached element yields its own segment
/// only.
pub fn synthesize(doc: &Document, node: NodeId) -> String {
    if let Some(id) = doc.id(node) {
        return format!("#{id}");
    }

    let classes: Vec<&str> = doc
        .classes(node)
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty())
        .collect();
    if !classes.is_empty() {
        let selector = format!(".{}", classes.join("."));
        if doc.query_selector_all(&selector).len() == 1 {
            return selector;
        }
    }

    ancestor_path(doc, node)
}

fn ancestor_path(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if let Some(id) = doc.id(current) {
            segments.push(format!("#{id}"));
            break;
        }
        segments.push(path_segment(doc, current));
        cursor = doc.parent(current);
    }
    segments.reverse();
    segments.join(" > ")
}

fn path_segment(doc: &Document, node: NodeId) -> String {
    let tag = doc.tag_name(node);
    let position = doc.nth_of_type_position(node);
    if position > 1 {
        format!("{tag}:nth-of-type({position})")
    } else {
        tag.to_string()
    }
}
