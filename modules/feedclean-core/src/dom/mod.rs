// Document tree capability surface.
//
// The pipeline never touches a concrete DOM. Everything it needs from the
// host page goes through `DocumentTree`, which the in-memory `SnapshotTree`
// implements for the CLI and for tests.

pub mod snapshot;

use std::fmt;
use std::hash::Hash;
use std::sync::LazyLock;

use feedclean_common::FeedCleanError;

pub use scraper::Selector;
pub use snapshot::{NodeId, SnapshotTree};

pub type Result<T> = std::result::Result<T, FeedCleanError>;

/// Flags the pipeline writes onto item containers.
pub mod flags {
    pub const PROCESSED_ATTR: &str = "data-feedclean-processed";
    pub const HIDDEN_ATTR: &str = "data-feedclean-hidden";
    pub const HIDDEN_CLASS: &str = "feedclean-hidden";
    pub const BLUR_CLASS: &str = "feedclean-blur";
    pub const INDICATOR_CLASS: &str = "feedclean-indicator";
    pub const BADGE_CLASS: &str = "feedclean-score-badge";
    pub const FLAG_SET: &str = "1";
}

/// Rendered size of a node. Zero in either dimension means not on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        width: 0.0,
        height: 0.0,
    };

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

pub trait DocumentTree {
    type Handle: Copy + Eq + Hash + fmt::Debug;

    /// Every element in the document matching `selector`, in document order.
    fn query_all(&self, selector: &Selector) -> Vec<Self::Handle>;

    /// First descendant of `scope` (not `scope` itself) matching `selector`.
    fn query_first(&self, scope: Self::Handle, selector: &Selector) -> Option<Self::Handle>;

    /// `node` itself or its nearest ancestor matching `selector`.
    fn closest(&self, node: Self::Handle, selector: &Selector) -> Option<Self::Handle>;

    fn attribute(&self, node: Self::Handle, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: Self::Handle, name: &str, value: &str) -> Result<()>;
    fn remove_attribute(&mut self, node: Self::Handle, name: &str) -> Result<()>;

    fn has_class(&self, node: Self::Handle, class: &str) -> bool;
    fn add_class(&mut self, node: Self::Handle, class: &str) -> Result<()>;
    fn remove_class(&mut self, node: Self::Handle, class: &str) -> Result<()>;

    /// Concatenated text of all descendant text nodes.
    fn text(&self, node: Self::Handle) -> String;

    fn is_displayed(&self, node: Self::Handle) -> bool;
    fn set_displayed(&mut self, node: Self::Handle, displayed: bool) -> Result<()>;

    fn rect(&self, node: Self::Handle) -> Rect;

    /// Previous element sibling, skipping text.
    fn previous_sibling(&self, node: Self::Handle) -> Option<Self::Handle>;

    fn insert_before(&mut self, anchor: Self::Handle, node: &NodeSpec) -> Result<Self::Handle>;
    fn append_child(&mut self, parent: Self::Handle, node: &NodeSpec) -> Result<Self::Handle>;
    fn remove(&mut self, node: Self::Handle) -> Result<()>;

    /// Trimmed text of the first descendant matching `selector`.
    fn first_text(&self, scope: Self::Handle, selector: &Selector) -> Option<String> {
        self.query_first(scope, selector)
            .map(|node| self.text(node).trim().to_string())
    }

    fn flag_set(&self, node: Self::Handle, name: &str) -> bool {
        self.attribute(node, name).as_deref() == Some(flags::FLAG_SET)
    }
}

/// Description of an element to insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn child_if(self, child: Option<NodeSpec>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }
}

/// Compile a static selector list. Panics on a malformed literal.
pub(crate) fn compile(sources: &[&str]) -> Vec<Selector> {
    sources
        .iter()
        .map(|s| Selector::parse(s).unwrap_or_else(|e| panic!("static selector: {e}")))
        .collect()
}

pub(crate) fn compile_one(source: &str) -> Selector {
    Selector::parse(source).unwrap_or_else(|e| panic!("static selector: {e}"))
}

pub(crate) type Selectors = LazyLock<Vec<Selector>>;
