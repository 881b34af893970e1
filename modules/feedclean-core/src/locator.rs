use std::collections::HashMap;

use feedclean_common::ContentItem;
use tracing::debug;

use crate::dom::{compile, flags, DocumentTree, Selectors};
use crate::identity::resolve_identity;

/// Structural patterns for post containers, also used to canonicalize, in
/// priority order.
pub const CONTAINER_SELECTORS: &[&str] = &[
    ".occludable-update",
    r#"article[data-urn^="urn:li:activity:"]"#,
    r#"div[data-urn^="urn:li:activity:"]"#,
];

static CONTAINERS: Selectors = Selectors::new(|| compile(CONTAINER_SELECTORS));

/// The outermost recognized container for `node`, or `node` itself.
pub fn canonical_item<D: DocumentTree>(doc: &D, node: D::Handle) -> D::Handle {
    CONTAINERS
        .iter()
        .find_map(|selector| doc.closest(node, selector))
        .unwrap_or(node)
}

/// Whether a canonical container still needs processing: not concealed by
/// us, not already handled, and currently rendered.
pub fn is_eligible<D: DocumentTree>(doc: &D, item: D::Handle) -> bool {
    !doc.flag_set(item, flags::HIDDEN_ATTR)
        && !doc.flag_set(item, flags::PROCESSED_ATTR)
        && doc.rect(item).is_visible()
}

/// Scan the document for visible, unprocessed posts, one per identity.
///
/// When several containers resolve to the same identity the last one seen
/// wins; the order of first appearance is kept.
pub fn locate_items<D: DocumentTree>(doc: &D) -> Vec<ContentItem<D::Handle>> {
    let mut order: Vec<String> = Vec::new();
    let mut by_identity: HashMap<String, D::Handle> = HashMap::new();
    let mut candidates = 0usize;

    for selector in CONTAINERS.iter() {
        for node in doc.query_all(selector) {
            candidates += 1;
            let item = canonical_item(doc, node);
            if !is_eligible(doc, item) {
                continue;
            }
            let identity = resolve_identity(doc, item);
            if by_identity.insert(identity.clone(), item).is_none() {
                order.push(identity);
            }
        }
    }

    debug!(candidates, located = order.len(), "Located feed items");

    order
        .into_iter()
        .filter_map(|identity| {
            let handle = by_identity.remove(&identity)?;
            Some(ContentItem::discovered(identity, handle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{compile_one, SnapshotTree};

    const FEED: &str = r#"
        <main>
          <div class="occludable-update">
            <article data-urn="urn:li:activity:1"><p>First post body</p></article>
          </div>
          <div data-urn="urn:li:activity:2"><p>Second post body</p></div>
          <div class="occludable-update" style="display:none">
            <div data-urn="urn:li:activity:3"><p>Not rendered</p></div>
          </div>
          <div class="occludable-update" data-feedclean-processed="1">
            <div data-urn="urn:li:activity:4"><p>Done already</p></div>
          </div>
          <div class="occludable-update" data-feedclean-hidden="1">
            <div data-urn="urn:li:activity:5"><p>Concealed</p></div>
          </div>
        </main>"#;

    #[test]
    fn test_nested_matches_collapse_to_outer_container() {
        let tree = SnapshotTree::parse(FEED);
        let items = locate_items(&tree);
        let ids: Vec<&str> = items.iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, vec!["urn:urn:li:activity:1", "urn:urn:li:activity:2"]);

        let outer = tree.query_all(&compile_one(".occludable-update"))[0];
        assert_eq!(items[0].handle, outer);
    }

    #[test]
    fn test_canonical_item_prefers_occludable_wrapper() {
        let tree = SnapshotTree::parse(FEED);
        let paragraph = tree.query_all(&compile_one("article p"))[0];
        let article = tree.query_all(&compile_one("article"))[0];
        let outer = tree.query_all(&compile_one(".occludable-update"))[0];
        assert_eq!(canonical_item(&tree, article), outer);
        assert_eq!(canonical_item(&tree, paragraph), outer);
    }

    #[test]
    fn test_zero_size_items_skipped() {
        let mut tree = SnapshotTree::parse(FEED);
        let second = tree
            .query_all(&compile_one(r#"div[data-urn="urn:li:activity:2"]"#))[0];
        tree.set_size(second, 0.0, 120.0).unwrap();
        let items = locate_items(&tree);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_duplicate_identity_keeps_last_handle() {
        // The article selector runs before the div selector.
        let tree = SnapshotTree::parse(
            r#"<article data-urn="urn:li:activity:8"><p>a</p></article>
               <div data-urn="urn:li:activity:8"><p>b</p></div>"#,
        );
        let items = locate_items(&tree);
        assert_eq!(items.len(), 1);
        let div = tree.query_all(&compile_one(r#"div[data-urn]"#))[0];
        assert_eq!(items[0].handle, div);
    }
}
