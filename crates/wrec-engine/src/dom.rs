//! In-memory document harness the engine records from and replays against.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Queries cover exactly the
//! selector grammar the synthesizer emits: `#id`, `.c1.c2`, `tag`,
//! `tag:nth-of-type(N)`, and child chains joined with `" > "`. Event dispatch
//! walks the capture phase (root to target), the target, then the bubble
//! phase, honoring `stop_propagation`. Every dispatch is appended to a log so
//! callers can observe what actually fired.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Default)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub value: String,
    pub text: String,
    pub style: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A dispatched (or dispatchable) event.
#[derive(Debug)]
pub struct Event {
    pub name: String,
    pub bubbles: bool,
    pub cancelable: bool,
    /// True for real user activity, false for synthetic replay dispatches.
    pub trusted: bool,
    pub key: Option<String>,
    pub key_code: Option<u32>,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl Event {
    /// A trusted event, as delivered by real page activity.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bubbles: true,
            cancelable: true,
            trusted: true,
            key: None,
            key_code: None,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    /// An untrusted event, as dispatched during replay.
    pub fn synthetic(name: &str) -> Self {
        Self {
            trusted: false,
            ..Self::new(name)
        }
    }

    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_key(mut self, key: &str, key_code: u32) -> Self {
        self.key = Some(key.to_string());
        self.key_code = Some(key_code);
        self
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// One entry in the document's dispatch log.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub target: NodeId,
    pub event: String,
    /// Target value snapshot at dispatch time.
    pub value: String,
    pub trusted: bool,
}

type ListenerFn = Box<dyn FnMut(&mut Event) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

struct Listener {
    id: usize,
    event: String,
    capture: bool,
    callback: ListenerFn,
}

#[derive(Default)]
struct ParsedSegment {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_of_type: Option<usize>,
}

pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    listeners: HashMap<NodeId, Vec<Listener>>,
    next_listener: usize,
    focused: Option<NodeId>,
    scrolled_into_view: Option<NodeId>,
    dispatch_log: Vec<DispatchRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            tag: "html".to_string(),
            ..Node::default()
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            listeners: HashMap::new(),
            next_listener: 0,
            focused: None,
            scrolled_into_view: None,
            dispatch_log: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element. Attach it with [`Document::append_child`].
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.nodes[node.0].id = Some(id.to_string());
    }

    /// Set the class attribute from a whitespace-separated token list.
    /// Empty tokens are dropped.
    pub fn set_class_attr(&mut self, node: NodeId, classes: &str) {
        self.nodes[node.0].classes = classes
            .split_whitespace()
            .map(str::to_string)
            .collect();
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node.0].classes.push(class.to_string());
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.nodes[node.0].value = value.to_string();
    }

    pub fn set_inline_style(&mut self, node: NodeId, style: &str) {
        self.nodes[node.0].style = style.to_string();
    }

    pub fn tag_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].id.as_deref()
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].classes
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub fn value(&self, node: NodeId) -> &str {
        &self.nodes[node.0].value
    }

    pub fn inline_style(&self, node: NodeId) -> &str {
        &self.nodes[node.0].style
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn last_scrolled_into_view(&self) -> Option<NodeId> {
        self.scrolled_into_view
    }

    pub fn dispatch_log(&self) -> &[DispatchRecord] {
        &self.dispatch_log
    }

    /// Own text followed by descendant text, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        out.push_str(&self.nodes[node.0].text);
        for &child in &self.nodes[node.0].children {
            self.collect_text(child, out);
        }
    }

    /// 1-based position of the node among same-tag siblings. Detached nodes
    /// and the root count as first.
    pub fn nth_of_type_position(&self, node: NodeId) -> usize {
        let Some(parent) = self.nodes[node.0].parent else {
            return 1;
        };
        let tag = &self.nodes[node.0].tag;
        let mut position = 1;
        for &sibling in &self.nodes[parent.0].children {
            if sibling == node {
                break;
            }
            if &self.nodes[sibling.0].tag == tag {
                position += 1;
            }
        }
        position
    }

    pub fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        capture: bool,
        callback: ListenerFn,
    ) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.entry(node).or_default().push(Listener {
            id,
            event: event.to_string(),
            capture,
            callback,
        });
        ListenerId(id)
    }

    pub fn remove_listener(&mut self, listener: ListenerId) {
        for entries in self.listeners.values_mut() {
            entries.retain(|l| l.id != listener.0);
        }
    }

    /// Move focus and fire a non-bubbling focus event at the new target.
    pub fn focus(&mut self, target: NodeId) {
        self.focused = Some(target);
        self.dispatch(target, Event::synthetic("focus").bubbles(false).cancelable(false));
    }

    /// Geometry-free stand-in for centered scrolling: remembers the target.
    pub fn scroll_into_view(&mut self, target: NodeId) {
        self.scrolled_into_view = Some(target);
    }

    /// Full dispatch: capture phase root-to-target, target phase, then bubble
    /// phase if the event bubbles. Returns the event's final state.
    pub fn dispatch(&mut self, target: NodeId, mut event: Event) -> Event {
        self.dispatch_log.push(DispatchRecord {
            target,
            event: event.name.clone(),
            value: self.nodes[target.0].value.clone(),
            trusted: event.trusted,
        });

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.nodes[node.0].parent;
        }
        path.reverse();
        let ancestors = &path[..path.len() - 1];

        for &node in ancestors {
            self.run_listeners(node, &mut event, true);
            if event.propagation_stopped {
                return event;
            }
        }

        self.run_listeners(target, &mut event, true);
        if event.propagation_stopped {
            return event;
        }
        self.run_listeners(target, &mut event, false);
        if event.propagation_stopped {
            return event;
        }

        if event.bubbles {
            for &node in ancestors.iter().rev() {
                self.run_listeners(node, &mut event, false);
                if event.propagation_stopped {
                    return event;
                }
            }
        }
        event
    }

    fn run_listeners(&mut self, node: NodeId, event: &mut Event, capture: bool) {
        let Some(entries) = self.listeners.get_mut(&node) else {
            return;
        };
        for listener in entries.iter_mut() {
            if listener.capture != capture || listener.event != event.name {
                continue;
            }
            (listener.callback)(event);
        }
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// All matches, in document order. Unparseable selectors match nothing.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(segments) = parse_selector(selector) else {
            return Vec::new();
        };

        let order = self.document_order();
        let mut current: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|&node| self.segment_matches(node, &segments[0]))
            .collect();

        for segment in &segments[1..] {
            let mut next = Vec::new();
            for parent in current {
                for &child in &self.nodes[parent.0].children {
                    if self.segment_matches(child, segment) {
                        next.push(child);
                    }
                }
            }
            current = next;
        }

        let index: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        current.sort_by_key(|node| index[node]);
        current
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.push_subtree(self.root, &mut out);
        out
    }

    fn push_subtree(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for &child in &self.nodes[node.0].children {
            self.push_subtree(child, out);
        }
    }

    fn segment_matches(&self, node: NodeId, segment: &ParsedSegment) -> bool {
        let entry = &self.nodes[node.0];
        if let Some(tag) = &segment.tag
            && &entry.tag != tag
        {
            return false;
        }
        if let Some(id) = &segment.id
            && entry.id.as_deref() != Some(id.as_str())
        {
            return false;
        }
        if !segment.classes.iter().all(|c| entry.classes.contains(c)) {
            return false;
        }
        if let Some(n) = segment.nth_of_type
            && self.nth_of_type_position(node) != n
        {
            return false;
        }
        true
    }
}

fn parse_selector(selector: &str) -> Option<Vec<ParsedSegment>> {
    let segments: Vec<ParsedSegment> = selector
        .split(" > ")
        .map(parse_segment)
        .collect::<Option<_>>()?;
    if segments.is_empty() {
        return None;
    }
    Some(segments)
}

fn parse_segment(raw: &str) -> Option<ParsedSegment> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut segment = ParsedSegment::default();
    let head = match raw.split_once(':') {
        Some((head, pseudo)) => {
            let n = pseudo
                .strip_prefix("nth-of-type(")?
                .strip_suffix(')')?
                .parse()
                .ok()?;
            segment.nth_of_type = Some(n);
            head
        }
        None => raw,
    };

    let tag_end = head.find(['#', '.']).unwrap_or(head.len());
    if tag_end > 0 {
        segment.tag = Some(head[..tag_end].to_ascii_lowercase());
    }

    let mut rest = &head[tag_end..];
    while !rest.is_empty() {
        let marker = rest.as_bytes()[0];
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let token = &body[..end];
        if token.is_empty() {
            return None;
        }
        match marker {
            b'#' => segment.id = Some(token.to_string()),
            b'.' => segment.classes.push(token.to_string()),
            _ => return None,
        }
        rest = &body[end..];
    }

    if segment.tag.is_none()
        && segment.id.is_none()
        && segment.classes.is_empty()
        && segment.nth_of_type.is_none()
    {
        return None;
    }
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        doc.append_child(doc.root(), body);
        let form = doc.create_element("form");
        doc.set_id(form, "login");
        doc.append_child(body, form);
        let input = doc.create_element("input");
        doc.set_class_attr(input, "field field-user");
        doc.append_child(form, input);
        (doc, form, input)
    }

    #[test]
    fn queries_by_id() {
        let (doc, form, _) = sample();
        assert_eq!(doc.query_selector("#login"), Some(form));
        assert_eq!(doc.query_selector("#missing"), None);
    }

    #[test]
    fn queries_by_class_set() {
        let (doc, _, input) = sample();
        assert_eq!(doc.query_selector(".field.field-user"), Some(input));
        assert!(doc.query_selector_all(".field.other").is_empty());
    }

    #[test]
    fn queries_child_chains_with_nth_of_type() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        doc.append_child(doc.root(), body);
        let mut divs = Vec::new();
        for _ in 0..3 {
            let div = doc.create_element("div");
            doc.append_child(body, div);
            divs.push(div);
        }
        assert_eq!(
            doc.query_selector("html > body > div:nth-of-type(3)"),
            Some(divs[2])
        );
        assert_eq!(doc.query_selector_all("html > body > div").len(), 3);
    }

    #[test]
    fn unparseable_selector_matches_nothing() {
        let (doc, _, _) = sample();
        assert!(doc.query_selector_all("").is_empty());
        assert!(doc.query_selector_all("div::bogus").is_empty());
    }

    #[test]
    fn capture_listener_sees_event_stopped_in_bubble_phase() {
        let (mut doc, form, input) = sample();
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let seen_capture = seen.clone();
        doc.add_listener(
            doc.root(),
            "click",
            true,
            Box::new(move |_| {
                seen_capture.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }),
        );
        doc.add_listener(form, "click", false, Box::new(|e| e.stop_propagation()));

        let seen_root_bubble = seen.clone();
        doc.add_listener(
            doc.root(),
            "click",
            false,
            Box::new(move |_| {
                seen_root_bubble.fetch_add(100, std::sync::atomic::Ordering::SeqCst);
            }),
        );

        doc.dispatch(input, Event::new("click"));
        // Capture hook fired, bubble hook at the root did not.
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_log_snapshots_target_value() {
        let (mut doc, _, input) = sample();
        doc.set_value(input, "a");
        doc.dispatch(input, Event::synthetic("input").cancelable(false));
        doc.set_value(input, "ab");
        doc.dispatch(input, Event::synthetic("input").cancelable(false));

        let values: Vec<&str> = doc
            .dispatch_log()
            .iter()
            .filter(|r| r.event == "input")
            .map(|r| r.value.as_str())
            .collect();
        assert_eq!(values, vec!["a", "ab"]);
    }
}
