use std::sync::LazyLock;

use feedclean_common::{Author, ContentItem, ItemState};

use crate::dom::{compile, compile_one, DocumentTree, Selector, Selectors};
use crate::normalize::{collapse_whitespace, normalize_name, normalize_role};

/// Body text locations, concatenated in this order.
pub const TEXT_SELECTORS: &[&str] = &[
    ".feed-shared-text",
    ".attributed-text-segment-list__content",
    ".feed-shared-inline-show-more-text",
    ".feed-shared-text__text-view",
    ".update-components-text",
    r#"[data-test-id="main-feed-activity-card"] .attributed-text-segment-list__content"#,
];

pub const ACTOR_ROOT_SELECTOR: &str =
    ".update-components-actor, .feed-shared-actor, .update-components-actor__meta, header";

pub const NAME_LINK_SELECTOR: &str =
    r#".update-components-actor__name a, .feed-shared-actor__name a, a[href*="/in/"]"#;

pub const NAME_SELECTORS: &[&str] = &[
    ".update-components-actor__name",
    ".feed-shared-actor__name",
    "a.update-components-actor__meta-link",
    r#"[data-test-id="actor-name"]"#,
    "span.update-components-actor__name",
];

pub const ROLE_SELECTORS: &[&str] = &[
    ".update-components-actor__sub-description",
    ".feed-shared-actor__sub-description",
];

pub const AVATAR_SELECTORS: &[&str] = &[
    "img.update-components-actor__avatar-image",
    "img.feed-shared-actor__avatar-image",
    "img.entity-image",
    "img.ivm-view-attr__img--entity",
];

/// Image attributes that may carry the avatar source, lazy-load variants last.
pub const AVATAR_SOURCE_ATTRS: &[&str] = &["src", "data-delayed-url", "data-src"];

static TEXT: Selectors = Selectors::new(|| compile(TEXT_SELECTORS));
static ACTOR_ROOT: LazyLock<Selector> = LazyLock::new(|| compile_one(ACTOR_ROOT_SELECTOR));
static NAME_LINK: LazyLock<Selector> = LazyLock::new(|| compile_one(NAME_LINK_SELECTOR));
static NAMES: Selectors = Selectors::new(|| compile(NAME_SELECTORS));
static ROLES: Selectors = Selectors::new(|| compile(ROLE_SELECTORS));
static AVATARS: Selectors = Selectors::new(|| compile(AVATAR_SELECTORS));

/// Fill in `text` and `author` for a located item and mark it extracted.
///
/// Missing pieces stay empty; extraction never fails.
pub fn extract<D: DocumentTree>(doc: &D, item: &mut ContentItem<D::Handle>) {
    item.text = body_text(doc, item.handle);
    item.author = author(doc, item.handle);
    item.advance(ItemState::Extracted);
}

pub fn body_text<D: DocumentTree>(doc: &D, item: D::Handle) -> String {
    let parts: Vec<String> = TEXT
        .iter()
        .filter_map(|selector| doc.first_text(item, selector))
        .collect();
    collapse_whitespace(&parts.join(" "))
}

pub fn author<D: DocumentTree>(doc: &D, item: D::Handle) -> Author {
    let actor = doc.query_first(item, &ACTOR_ROOT).unwrap_or(item);
    let name = author_name(doc, actor);

    let role = ROLES
        .iter()
        .filter_map(|selector| doc.first_text(actor, selector))
        .find(|raw| !raw.is_empty())
        .map(|raw| normalize_role(&raw, &name))
        .unwrap_or_default();

    let avatar = AVATARS.iter().find_map(|selector| {
        let img = doc.query_first(actor, selector)?;
        AVATAR_SOURCE_ATTRS
            .iter()
            .filter_map(|attr| doc.attribute(img, attr))
            .find(|src| !src.is_empty())
    });

    Author { name, role, avatar }
}

fn author_name<D: DocumentTree>(doc: &D, actor: D::Handle) -> String {
    // A direct profile link is authoritative even when it normalizes empty.
    if let Some(link) = doc.query_first(actor, &NAME_LINK) {
        let text = doc.text(link);
        if !text.is_empty() {
            return normalize_name(&text);
        }
    }

    NAMES
        .iter()
        .filter_map(|selector| doc.query_first(actor, selector))
        .map(|node| normalize_name(&doc.text(node)))
        .find(|name| {
            let len = name.chars().count();
            len > 1 && len < 120
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SnapshotTree;

    fn item_of(tree: &SnapshotTree) -> ContentItem<crate::dom::NodeId> {
        let handle = tree.query_all(&compile_one("article"))[0];
        ContentItem::discovered("urn:test".to_string(), handle)
    }

    const POST: &str = r#"
        <article data-urn="urn:li:activity:1">
          <div class="update-components-actor">
            <img class="update-components-actor__avatar-image" data-delayed-url="https://cdn.example/a.jpg">
            <span class="update-components-actor__name"><a href="/in/jane">Jane Smith Jane Smith</a></span>
            <span class="update-components-actor__sub-description">Staff Engineer • Staff Engineer • 3rd+</span>
          </div>
          <div class="feed-shared-text">  We shipped the new
             storage engine today. </div>
          <div class="update-components-text">Benchmarks inside.</div>
        </article>"#;

    #[test]
    fn test_selector_tables_parse() {
        let singles = [ACTOR_ROOT_SELECTOR, NAME_LINK_SELECTOR];
        for source in TEXT_SELECTORS
            .iter()
            .chain(NAME_SELECTORS)
            .chain(ROLE_SELECTORS)
            .chain(AVATAR_SELECTORS)
            .chain(singles.iter())
        {
            assert!(Selector::parse(source).is_ok(), "{source}");
        }
    }

    #[test]
    fn test_extracts_text_and_author() {
        let tree = SnapshotTree::parse(POST);
        let mut item = item_of(&tree);
        extract(&tree, &mut item);

        assert_eq!(item.state, ItemState::Extracted);
        assert_eq!(
            item.text,
            "We shipped the new storage engine today. Benchmarks inside."
        );
        assert_eq!(item.author.name, "Jane Smith");
        assert_eq!(item.author.role, "Staff Engineer");
        assert_eq!(item.author.avatar.as_deref(), Some("https://cdn.example/a.jpg"));
    }

    #[test]
    fn test_name_selectors_enforce_length() {
        let tree = SnapshotTree::parse(
            r#"<article>
                 <div class="feed-shared-actor">
                   <span class="feed-shared-actor__name">J</span>
                   <span data-test-id="actor-name">Acme Corp</span>
                 </div>
               </article>"#,
        );
        let mut item = item_of(&tree);
        extract(&tree, &mut item);
        assert_eq!(item.author.name, "Acme Corp");
    }

    #[test]
    fn test_missing_author_fields_stay_empty() {
        let tree = SnapshotTree::parse(
            r#"<article><div class="feed-shared-text">Only a body here.</div></article>"#,
        );
        let mut item = item_of(&tree);
        extract(&tree, &mut item);
        assert_eq!(item.author, Author::default());
        assert_eq!(item.author.display_name(), "Unknown");
    }

    #[test]
    fn test_avatar_prefers_src() {
        let tree = SnapshotTree::parse(
            r#"<article><header>
                 <img class="entity-image" src="" data-src="https://cdn.example/lazy.png">
               </header></article>"#,
        );
        let item = item_of(&tree);
        assert_eq!(
            author(&tree, item.handle).avatar.as_deref(),
            Some("https://cdn.example/lazy.png")
        );
    }

    #[test]
    fn test_nested_text_selector() {
        let tree = SnapshotTree::parse(
            r#"<article><div data-test-id="main-feed-activity-card">
                 <span class="attributed-text-segment-list__content">Card body</span>
               </div></article>"#,
        );
        // Matched by both the plain and the scoped selector.
        assert_eq!(body_text(&tree, item_of(&tree).handle), "Card body Card body");
    }
}
