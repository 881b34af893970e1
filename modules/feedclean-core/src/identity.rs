use std::sync::LazyLock;

use crate::dom::{compile_one, DocumentTree, Selector};
use crate::normalize::collapse_whitespace;

/// UTF-16 code units of visible text fed into the fallback hash.
pub const HASH_PREFIX_UNITS: usize = 300;

static ACTIVITY_URN: LazyLock<Selector> =
    LazyLock::new(|| compile_one(r#"[data-urn^="urn:li:activity:"]"#));
static ACTIVITY_DATA_ID: LazyLock<Selector> =
    LazyLock::new(|| compile_one(r#"[data-id*="urn:li:activity:"]"#));

/// Stable identity for an item container.
///
/// Prefers the platform activity URN (`urn:`), then a data id (`dataid:`),
/// and falls back to a hash of the visible text (`txt:`). Two different posts
/// sharing the same 300-unit text prefix collide under the fallback; that is
/// a known limitation.
pub fn resolve_identity<D: DocumentTree>(doc: &D, item: D::Handle) -> String {
    if let Some(urn) = own_or_descendant(doc, item, "data-urn", &ACTIVITY_URN) {
        return format!("urn:{urn}");
    }
    if let Some(id) = own_or_descendant(doc, item, "data-id", &ACTIVITY_DATA_ID) {
        return format!("dataid:{id}");
    }
    format!("txt:{}", text_hash(&doc.text(item)))
}

fn own_or_descendant<D: DocumentTree>(
    doc: &D,
    item: D::Handle,
    attr: &str,
    selector: &Selector,
) -> Option<String> {
    let non_empty = |v: String| if v.is_empty() { None } else { Some(v) };
    doc.attribute(item, attr)
        .and_then(non_empty)
        .or_else(|| {
            doc.query_first(item, selector)
                .and_then(|node| doc.attribute(node, attr))
                .and_then(non_empty)
        })
}

/// 32-bit rolling hash (`h = h * 31 + unit`) over the first 300 UTF-16 units
/// of the whitespace-collapsed text, wrapping like a signed 32-bit integer.
pub fn text_hash(text: &str) -> i32 {
    collapse_whitespace(text)
        .encode_utf16()
        .take(HASH_PREFIX_UNITS)
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}
