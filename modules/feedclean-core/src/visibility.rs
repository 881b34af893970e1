use std::sync::LazyLock;

use feedclean_common::{ContentItem, FilterMode, MAX_SCORE};
use tracing::debug;

use crate::dom::{compile_one, flags, DocumentTree, NodeSpec, Result, Selector};
use crate::policy::HideReason;

pub const PREVIEW_WORDS: usize = 10;
pub const RESTORE_LABEL: &str = "Show";

pub const HEADER_SELECTOR: &str = ".update-components-header, .feed-shared-actor, header";

static HEADER: LazyLock<Selector> = LazyLock::new(|| compile_one(HEADER_SELECTOR));
static BADGE: LazyLock<Selector> =
    LazyLock::new(|| compile_one(&format!(".{}", flags::BADGE_CLASS)));

/// First ten words of `text`, with `...` when more were dropped.
pub fn preview(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > PREVIEW_WORDS {
        format!("{}...", words[..PREVIEW_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}

/// What was done to conceal one item, enough to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concealment<H> {
    pub item: H,
    pub indicator: H,
    pub mode: FilterMode,
    was_displayed: bool,
}

impl<H: Copy> Concealment<H> {
    /// The indicator's restore action. The item's identity stays claimed.
    pub fn restore<D: DocumentTree<Handle = H>>(&self, doc: &mut D) -> Result<()> {
        match self.mode {
            FilterMode::Blur => doc.remove_class(self.item, flags::BLUR_CLASS)?,
            FilterMode::Hide => doc.set_displayed(self.item, self.was_displayed)?,
        }
        doc.remove(self.indicator)?;
        doc.remove_class(self.item, flags::HIDDEN_CLASS)?;
        doc.remove_attribute(self.item, flags::HIDDEN_ATTR)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityController {
    mode: FilterMode,
}

impl VisibilityController {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Insert the indicator immediately before `item`, then conceal it.
    ///
    /// Returns `None` when an indicator already precedes the item.
    pub fn conceal<D: DocumentTree>(
        &self,
        doc: &mut D,
        item: &ContentItem<D::Handle>,
        reason: &HideReason,
    ) -> Result<Option<Concealment<D::Handle>>> {
        let target = item.handle;
        if let Some(prev) = doc.previous_sibling(target) {
            if doc.has_class(prev, flags::INDICATOR_CLASS) {
                debug!(identity = %item.identity, "Indicator already present");
                return Ok(None);
            }
        }

        let was_displayed = doc.is_displayed(target);
        let indicator = doc.insert_before(target, &self.indicator_spec(item, reason))?;
        match self.mode {
            FilterMode::Blur => doc.add_class(target, flags::BLUR_CLASS)?,
            FilterMode::Hide => {
                doc.set_displayed(target, false)?;
                doc.add_class(target, flags::HIDDEN_CLASS)?;
            }
        }
        doc.set_attribute(target, flags::HIDDEN_ATTR, flags::FLAG_SET)?;

        Ok(Some(Concealment {
            item: target,
            indicator,
            mode: self.mode,
            was_displayed,
        }))
    }

    fn indicator_spec<H>(&self, item: &ContentItem<H>, reason: &HideReason) -> NodeSpec {
        let author = &item.author;
        let avatar = author.avatar.as_ref().map(|src| {
            NodeSpec::new("img")
                .class("author-avatar")
                .attr("src", src)
                .attr("alt", "")
        });
        let role = (!author.role.is_empty())
            .then(|| NodeSpec::new("div").class("author-role").text(&author.role));

        let meta = NodeSpec::new("div")
            .class("author-meta")
            .child(NodeSpec::new("div").class("author-name").text(author.display_name()))
            .child_if(role)
            .child(
                NodeSpec::new("div")
                    .class("post-preview")
                    .text(format!("\"{}\"", preview(&item.text))),
            )
            .child(NodeSpec::new("div").class("filter-reason").text(reason.label()));

        NodeSpec::new("div")
            .class(flags::INDICATOR_CLASS)
            .attr("data-feedclean-for", &item.identity)
            .attr("data-feedclean-mode", self.mode.as_str())
            .child(
                NodeSpec::new("div")
                    .class("hidden-post-notice")
                    .child(
                        NodeSpec::new("div")
                            .class("hidden-post-left")
                            .child_if(avatar)
                            .child(meta),
                    )
                    .child(
                        NodeSpec::new("div").class("hidden-post-right").child(
                            NodeSpec::new("button")
                                .class("show-hidden-post")
                                .text(RESTORE_LABEL),
                        ),
                    ),
            )
    }

    /// Annotate `item` with its score in the header, or the item itself.
    ///
    /// Returns false when the item already carries a badge.
    pub fn badge<D: DocumentTree>(&self, doc: &mut D, item: D::Handle, score: u8) -> Result<bool> {
        if doc.query_first(item, &BADGE).is_some() {
            return Ok(false);
        }
        let host = doc.query_first(item, &HEADER).unwrap_or(item);
        let badge = NodeSpec::new("div").class(flags::BADGE_CLASS).child(
            NodeSpec::new("span")
                .class("score-value")
                .text(format!("{score}/{MAX_SCORE}")),
        );
        doc.append_child(host, &badge)?;
        Ok(true)
    }
}
