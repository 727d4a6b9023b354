//! Selector synthesis priority and path determinism.

use wrec_engine::dom::Document;
use wrec_engine::selector::synthesize;

#[test]
fn id_wins_over_classes() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let button = doc.create_element("button");
    doc.set_id(button, "x");
    doc.set_class_attr(button, "btn btn-primary");
    doc.append_child(body, button);

    assert_eq!(synthesize(&doc, button), "#x");
}

#[test]
fn unique_class_selector_bypasses_path_construction() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let input = doc.create_element("input");
    doc.set_class_attr(input, "field field-user");
    doc.append_child(body, input);

    let selector = synthesize(&doc, input);
    assert_eq!(selector, ".field.field-user");
    assert_eq!(doc.query_selector(&selector), Some(input));
}

#[test]
fn ambiguous_class_selector_falls_back_to_path() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    for _ in 0..2 {
        let div = doc.create_element("div");
        doc.set_class_attr(div, "card");
        doc.append_child(body, div);
    }
    let second = doc.children(body)[1];

    let selector = synthesize(&doc, second);
    assert_eq!(selector, "html > body > div:nth-of-type(2)");
    assert_eq!(doc.query_selector(&selector), Some(second));
}

#[test]
fn third_sibling_div_ends_in_nth_of_type_three() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let mut last = None;
    for _ in 0..3 {
        let div = doc.create_element("div");
        doc.append_child(body, div);
        last = Some(div);
    }
    let third = last.unwrap();

    let selector = synthesize(&doc, third);
    assert!(selector.ends_with("div:nth-of-type(3)"), "got {selector}");
    assert_eq!(doc.query_selector(&selector), Some(third));
}

#[test]
fn nth_of_type_counts_same_tag_siblings_only() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let span = doc.create_element("span");
    doc.append_child(body, span);
    let div = doc.create_element("div");
    doc.append_child(body, div);

    // The div is the second child but the first of its tag.
    let selector = synthesize(&doc, div);
    assert_eq!(selector, "html > body > div");
    assert_eq!(doc.query_selector(&selector), Some(div));
}

#[test]
fn ancestor_id_ends_the_ascent() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let form = doc.create_element("form");
    doc.set_id(form, "login");
    doc.append_child(body, form);
    let span = doc.create_element("span");
    doc.append_child(form, span);

    let selector = synthesize(&doc, span);
    assert_eq!(selector, "#login > span");
    assert_eq!(doc.query_selector(&selector), Some(span));
}

#[test]
fn detached_element_yields_degenerate_path() {
    let mut doc = Document::new();
    let orphan = doc.create_element("div");
    assert_eq!(synthesize(&doc, orphan), "div");
    // The path does not resolve: the element is not reachable from the root.
    assert_ne!(doc.query_selector("div"), Some(orphan));
}

#[test]
fn empty_class_tokens_are_dropped() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let input = doc.create_element("input");
    doc.set_class_attr(input, "  field   primary  ");
    doc.append_child(body, input);

    assert_eq!(synthesize(&doc, input), ".field.primary");
}
