use ego_tree::NodeMut;
use html5ever::{ns, Attribute, LocalName, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};
use tokio::sync::mpsc::UnboundedSender;

use feedclean_common::FeedCleanError;

use super::{DocumentTree, NodeSpec, Rect, Result};
use crate::watcher::{MutationKind, MutationRecord};

pub use ego_tree::NodeId;

/// Size reported for rendered elements without explicit geometry.
const DEFAULT_WIDTH: f64 = 552.0;
const DEFAULT_HEIGHT: f64 = 240.0;

/// Document tree built from an HTML snapshot of the feed.
///
/// Wraps a parsed `scraper::Html` and edits its tree in place, so matching
/// and serialization see every annotation the pipeline writes. Display
/// state lives in the inline `style`; optional geometry comes from
/// `data-width` / `data-height`. Elements that are not displayed
/// (themselves or through an ancestor) or carry `hidden` report a zero
/// rect. Mutations can be published to a `ChangeWatcher`.
#[derive(Debug)]
pub struct SnapshotTree {
    document: Html,
    sink: Option<UnboundedSender<MutationRecord>>,
}

/// Split `display:none` out of an inline style.
fn strip_display(style: &str) -> (String, bool) {
    let mut hidden = false;
    let kept: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let Some((prop, value)) = decl.split_once(':') else {
                return true;
            };
            if prop.trim().eq_ignore_ascii_case("display") {
                hidden = value.trim().eq_ignore_ascii_case("none");
                return false;
            }
            true
        })
        .collect();
    (kept.join("; "), hidden)
}

fn styled_hidden(el: &Element) -> bool {
    el.attr("style").is_some_and(|style| strip_display(style).1)
}

fn attr_name(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

fn build_element(name: QualName, attrs: &[(String, String)]) -> Element {
    let attributes = attrs
        .iter()
        .map(|(key, value)| Attribute {
            name: attr_name(key),
            value: value.as_str().into(),
        })
        .collect();
    Element::new(name, attributes)
}

fn spec_element(spec: &NodeSpec) -> Node {
    let mut attrs = Vec::with_capacity(spec.attributes.len() + 1);
    if !spec.classes.is_empty() {
        attrs.push(("class".to_string(), spec.classes.join(" ")));
    }
    for (key, value) in &spec.attributes {
        attrs.push((key.to_ascii_lowercase(), value.clone()));
    }
    let name = QualName::new(
        None,
        ns!(html),
        LocalName::from(spec.tag.to_ascii_lowercase().as_str()),
    );
    Node::Element(build_element(name, &attrs))
}

fn text_node(text: &str) -> Node {
    Node::Text(Text { text: text.into() })
}

/// Build the text and children of `spec` under `node`.
fn fill(node: &mut NodeMut<'_, Node>, spec: &NodeSpec) {
    if let Some(ref text) = spec.text {
        node.append(text_node(text));
    }
    for child in &spec.children {
        let mut built = node.append(spec_element(child));
        fill(&mut built, child);
    }
}

/// Copy `source` and its subtree from another document under `target`.
fn graft(target: &mut NodeMut<'_, Node>, source: ego_tree::NodeRef<'_, Node>) -> NodeId {
    let mut copied = target.append(source.value().clone());
    for child in source.children() {
        graft(&mut copied, child);
    }
    copied.id()
}

fn put(attrs: &mut Vec<(String, String)>, name: &str, value: String) {
    match attrs.iter_mut().find(|(key, _)| key == name) {
        Some(slot) => slot.1 = value,
        None => attrs.push((name.to_string(), value)),
    }
}

/// Rewrite the `class` attribute through `edit` on its token list.
fn edit_classes(attrs: &mut Vec<(String, String)>, edit: impl FnOnce(&mut Vec<String>)) {
    let mut classes: Vec<String> = attrs
        .iter()
        .find(|(key, _)| key == "class")
        .map(|(_, value)| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    edit(&mut classes);
    attrs.retain(|(key, _)| key != "class");
    if !classes.is_empty() {
        attrs.push(("class".to_string(), classes.join(" ")));
    }
}

impl SnapshotTree {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            sink: None,
        }
    }

    /// Publish child-list and attribute mutations to `sink`.
    pub fn with_mutation_sink(mut self, sink: UnboundedSender<MutationRecord>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_mutation_sink(&mut self, sink: Option<UnboundedSender<MutationRecord>>) {
        self.sink = sink;
    }

    /// The `<html>` element.
    pub fn root(&self) -> NodeId {
        self.document.root_element().id()
    }

    /// The `<body>` element, or the root when the snapshot has none.
    pub fn body(&self) -> NodeId {
        self.document
            .root_element()
            .descendent_elements()
            .find(|el| el.value().name() == "body")
            .map(|el| el.id())
            .unwrap_or_else(|| self.root())
    }

    /// Parse `html` as a fragment and append its top-level nodes to `parent`,
    /// the way an infinite feed appends a new page of posts.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
        self.element(parent)?;
        let fragment = Html::parse_fragment(html);
        let mut added = Vec::new();
        if let Some(mut target) = self.document.tree.get_mut(parent) {
            for child in fragment.root_element().children() {
                if child.value().is_element() || child.value().is_text() {
                    added.push(graft(&mut target, child));
                }
            }
        }
        self.notify(MutationKind::ChildList);
        Ok(added)
    }

    /// Set explicit geometry for a node.
    pub fn set_size(&mut self, node: NodeId, width: f64, height: f64) -> Result<()> {
        self.edit_attributes(node, |attrs| {
            put(attrs, "data-width", width.to_string());
            put(attrs, "data-height", height.to_string());
        })
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().map(|el| el.value().name())
    }

    /// Whether `node` still hangs off the document.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let Some(found) = self.document.tree.get(node) else {
            return false;
        };
        let root = self.document.tree.root().id();
        found.id() == root || found.ancestors().any(|a| a.id() == root)
    }

    /// Parent element of `node`.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node).ok()?.parent()?;
        parent.value().is_element().then(|| parent.id())
    }

    /// Serialize the current tree back to HTML.
    pub fn to_html(&self) -> String {
        self.document.html()
    }

    // --- internals ---

    fn element(&self, id: NodeId) -> Result<ElementRef<'_>> {
        if !self.is_attached(id) {
            return Err(FeedCleanError::StaleHandle(format!("{id:?}")));
        }
        self.document
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| FeedCleanError::StaleHandle(format!("{id:?} is not an element")))
    }

    /// Replace the element at `id` with one carrying the attributes `edit`
    /// leaves behind. Elements cache their id and classes, so attribute
    /// changes always go through a fresh `Element`.
    fn edit_attributes(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Vec<(String, String)>),
    ) -> Result<()> {
        let el = self.element(id)?.value();
        let name = el.name.clone();
        let mut attrs: Vec<(String, String)> = el
            .attrs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        edit(&mut attrs);

        if let Some(mut node) = self.document.tree.get_mut(id) {
            *node.value() = Node::Element(build_element(name, &attrs));
        }
        self.notify(MutationKind::Attributes);
        Ok(())
    }

    fn notify(&self, kind: MutationKind) {
        if let Some(ref sink) = self.sink {
            // The watcher going away just means nobody is listening any more.
            let _ = sink.send(MutationRecord { kind });
        }
    }
}

impl DocumentTree for SnapshotTree {
    type Handle = NodeId;

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| el.id())
            .collect()
    }

    fn query_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.element(scope)
            .ok()?
            .select(selector)
            .find(|el| el.id() != scope)
            .map(|el| el.id())
    }

    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let start = self.element(node).ok()?;
        std::iter::once(*start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .map(|el| el.id())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .ok()?
            .attr(&name.to_ascii_lowercase())
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        self.edit_attributes(node, |attrs| put(attrs, &name, value.to_string()))
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        self.edit_attributes(node, |attrs| attrs.retain(|(key, _)| *key != name))
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_ok_and(|el| el.value().classes().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        self.edit_attributes(node, |attrs| {
            edit_classes(attrs, |classes| {
                if !classes.iter().any(|c| c == class) {
                    classes.push(class.to_string());
                }
            })
        })
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        self.edit_attributes(node, |attrs| {
            edit_classes(attrs, |classes| classes.retain(|c| c != class))
        })
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.text().collect())
            .unwrap_or_default()
    }

    fn is_displayed(&self, node: NodeId) -> bool {
        self.element(node).is_ok_and(|el| !styled_hidden(el.value()))
    }

    fn set_displayed(&mut self, node: NodeId, displayed: bool) -> Result<()> {
        self.edit_attributes(node, |attrs| {
            let style = attrs
                .iter()
                .find(|(key, _)| key == "style")
                .map(|(_, value)| value.as_str())
                .unwrap_or_default();
            let (mut style, _) = strip_display(style);
            if !displayed {
                if !style.is_empty() {
                    style.push_str("; ");
                }
                style.push_str("display: none");
            }
            attrs.retain(|(key, _)| key != "style");
            if !style.is_empty() {
                attrs.push(("style".to_string(), style));
            }
        })
    }

    fn rect(&self, node: NodeId) -> Rect {
        let Ok(el) = self.element(node) else {
            return Rect::ZERO;
        };
        let concealed = std::iter::once(*el)
            .chain(el.ancestors())
            .filter_map(ElementRef::wrap)
            .any(|e| styled_hidden(e.value()) || e.attr("hidden").is_some());
        if concealed {
            return Rect::ZERO;
        }
        let dimension = |name: &str, default: f64| {
            el.attr(name)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(default)
        };
        Rect {
            width: dimension("data-width", DEFAULT_WIDTH),
            height: dimension("data-height", DEFAULT_HEIGHT),
        }
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)
            .ok()?
            .prev_siblings()
            .find(|sibling| sibling.value().is_element())
            .map(|sibling| sibling.id())
    }

    fn insert_before(&mut self, anchor: NodeId, spec: &NodeSpec) -> Result<NodeId> {
        let has_element_parent = self
            .element(anchor)?
            .parent()
            .is_some_and(|parent| parent.value().is_element());
        if !has_element_parent {
            return Err(FeedCleanError::Dom(
                "cannot insert before the root element".into(),
            ));
        }

        let Some(mut anchor) = self.document.tree.get_mut(anchor) else {
            return Err(FeedCleanError::StaleHandle(format!("{anchor:?}")));
        };
        let mut node = anchor.insert_before(spec_element(spec));
        fill(&mut node, spec);
        let id = node.id();

        self.notify(MutationKind::ChildList);
        Ok(id)
    }

    fn append_child(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId> {
        self.element(parent)?;
        let Some(mut parent) = self.document.tree.get_mut(parent) else {
            return Err(FeedCleanError::StaleHandle(format!("{parent:?}")));
        };
        let mut node = parent.append(spec_element(spec));
        fill(&mut node, spec);
        let id = node.id();

        self.notify(MutationKind::ChildList);
        Ok(id)
    }

    fn remove(&mut self, node: NodeId) -> Result<()> {
        self.element(node)?;
        if let Some(mut found) = self.document.tree.get_mut(node) {
            found.detach();
        }
        self.notify(MutationKind::ChildList);
        Ok(())
    }
}
