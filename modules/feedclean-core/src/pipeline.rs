use std::fmt;
use std::future::Future;

use ai_client::TextGenerator;
use feedclean_common::{
    Category, ClassificationResult, ContentItem, FilterMode, ItemState, Settings,
};
use tracing::{debug, info, warn};

use crate::classifier::{ClassificationClient, PromptTemplate};
use crate::dom::{flags, DocumentTree, Result};
use crate::extractor::extract;
use crate::locator::locate_items;
use crate::mute::MuteFilter;
use crate::policy::{decide, Decision};
use crate::processed::ProcessedIndex;
use crate::rate_limit::RateLimiter;
use crate::visibility::{Concealment, VisibilityController};
use crate::watcher::ChangeWatcher;

/// Items with less body text than this are too sparse to judge.
pub const MIN_TEXT_CHARS: usize = 10;

// =============================================================================
// Reporting
// =============================================================================

/// Final state of one item handled in a scan.
#[derive(Debug, Clone)]
pub struct ItemOutcome<H> {
    pub identity: String,
    pub handle: H,
    pub state: ItemState,
    pub score: u8,
    pub category: Category,
    /// The mute list matched, so the oracle was never asked.
    pub muted: bool,
    pub decision: Decision,
    /// Present when this scan inserted the item's indicator.
    pub concealment: Option<Concealment<H>>,
}

#[derive(Debug, Clone)]
pub struct ScanReport<H> {
    pub located: usize,
    pub skipped_sparse: usize,
    pub muted: usize,
    pub hidden: usize,
    pub badged: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome<H>>,
}

impl<H> Default for ScanReport<H> {
    fn default() -> Self {
        Self {
            located: 0,
            skipped_sparse: 0,
            muted: 0,
            hidden: 0,
            badged: 0,
            failed: 0,
            items: Vec::new(),
        }
    }
}

impl<H> ScanReport<H> {
    pub fn processed(&self) -> usize {
        self.items.len()
    }

    pub fn outcome(&self, identity: &str) -> Option<&ItemOutcome<H>> {
        self.items.iter().find(|o| o.identity == identity)
    }

    pub fn concealments(&self) -> impl Iterator<Item = &Concealment<H>> {
        self.items.iter().filter_map(|o| o.concealment.as_ref())
    }

    fn record(&mut self, outcome: ItemOutcome<H>) {
        if outcome.state == ItemState::Visible {
            self.badged += 1;
        } else {
            self.hidden += 1;
            if outcome.muted {
                self.muted += 1;
            }
        }
        self.items.push(outcome);
    }
}

impl<H> fmt::Display for ScanReport<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "located={} processed={} hidden={} (muted={}) badged={} sparse={} failed={}",
            self.located,
            self.processed(),
            self.hidden,
            self.muted,
            self.badged,
            self.skipped_sparse,
            self.failed
        )
    }
}

// =============================================================================
// FeedCleaner
// =============================================================================

/// Run context for one page session: configuration plus the run state
/// (processed identities and the oracle rate budget). Created at startup,
/// never persisted.
pub struct FeedCleaner<G> {
    classifier: ClassificationClient<G>,
    mute: MuteFilter,
    visibility: VisibilityController,
    processed: ProcessedIndex,
}

impl<G: TextGenerator> FeedCleaner<G> {
    /// The generator is only used when `settings` carries a credential.
    pub fn new(settings: &Settings, generator: Option<G>) -> Self {
        Self::with_rate_limiter(settings, generator, RateLimiter::default())
    }

    pub fn with_rate_limiter(
        settings: &Settings,
        generator: Option<G>,
        limiter: RateLimiter,
    ) -> Self {
        let generator = generator.filter(|_| settings.credential.is_some());
        Self {
            classifier: ClassificationClient::new(
                generator,
                PromptTemplate::new(settings.prompt_template.clone()),
                limiter,
            ),
            mute: MuteFilter::new(&settings.mute_terms),
            visibility: VisibilityController::new(settings.filter_mode),
            processed: ProcessedIndex::new(),
        }
    }

    pub fn processed(&self) -> &ProcessedIndex {
        &self.processed
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.visibility.mode()
    }

    pub fn classifier(&self) -> &ClassificationClient<G> {
        &self.classifier
    }

    /// Locate, classify and act on every new item currently in `doc`.
    ///
    /// Items are handled one at a time. Each identity is claimed before its
    /// classification is awaited, so a later scan never picks it up again.
    pub async fn scan<D: DocumentTree>(&mut self, doc: &mut D) -> ScanReport<D::Handle> {
        let mut report = ScanReport::default();
        let items = locate_items(doc);
        report.located = items.len();

        for mut item in items {
            if self.processed.contains(&item.identity) {
                debug!(identity = %item.identity, "Already claimed, skipping");
                continue;
            }

            extract(doc, &mut item);
            if item.text.chars().count() < MIN_TEXT_CHARS {
                debug!(identity = %item.identity, "Too little text to judge");
                report.skipped_sparse += 1;
                continue;
            }

            self.processed.insert(item.identity.clone());
            match self.process(doc, &mut item).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(identity = %item.identity, error = %e, "Failed to apply decision");
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn process<D: DocumentTree>(
        &mut self,
        doc: &mut D,
        item: &mut ContentItem<D::Handle>,
    ) -> Result<ItemOutcome<D::Handle>> {
        let muted = self.mute.is_muted(&item.text);
        let result = if muted {
            item.advance(ItemState::Muted);
            ClassificationResult::muted()
        } else {
            let result = self
                .classifier
                .classify(&item.text, item.author.display_name())
                .await;
            item.advance(ItemState::Classified);
            result
        };

        let decision = decide(muted, &result);
        let concealment = match decision {
            Decision::Hide(reason) => {
                let concealment = self.visibility.conceal(doc, item, &reason)?;
                item.advance(match self.visibility.mode() {
                    FilterMode::Hide => ItemState::Hidden,
                    FilterMode::Blur => ItemState::Blurred,
                });
                info!(
                    identity = %item.identity,
                    author = item.author.display_name(),
                    reason = %reason.label(),
                    "Item concealed"
                );
                concealment
            }
            Decision::Badge { score } => {
                self.visibility.badge(doc, item.handle, score)?;
                item.advance(ItemState::Visible);
                debug!(identity = %item.identity, score, "Item badged");
                None
            }
        };
        doc.set_attribute(item.handle, flags::PROCESSED_ATTR, flags::FLAG_SET)?;

        Ok(ItemOutcome {
            identity: item.identity.clone(),
            handle: item.handle,
            state: item.state,
            score: result.score(),
            category: result.category(),
            muted,
            decision,
            concealment,
        })
    }

    /// Scan once, then again after each debounced burst of document changes,
    /// until `shutdown` resolves or the watcher's channel closes. Returns the
    /// number of scans run.
    pub async fn watch<D, S>(&mut self, doc: &mut D, watcher: &mut ChangeWatcher, shutdown: S) -> usize
    where
        D: DocumentTree,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let report = self.scan(doc).await;
        info!("Initial scan complete. {report}");
        let mut scans = 1;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Shutdown requested, stopping watch");
                    break;
                }
                next = watcher.next_scan() => {
                    if next.is_none() {
                        debug!("Change feed closed, stopping watch");
                        break;
                    }
                    let report = self.scan(doc).await;
                    scans += 1;
                    info!(scan = scans, "Re-scan complete. {report}");
                }
            }
        }

        scans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SnapshotTree;
    use crate::testing::{feed_html, MockOracle, PostFixture};

    fn settings() -> Settings {
        Settings {
            credential: Some("test-key".to_string()),
            prompt_template: "{{author}}: {{content}}".to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_second_scan_is_a_no_op() {
        let mut doc = SnapshotTree::parse(&feed_html(&[
            PostFixture::new(1, "Join my webinar to 10x your sales funnel"),
            PostFixture::new(2, "We measured p99 latency across three allocators"),
        ]));
        let oracle = MockOracle::new()
            .on_content("webinar", &MockOracle::verdict(1, "promotional"))
            .otherwise(&MockOracle::verdict(9, "normal"));
        let mut cleaner = FeedCleaner::new(&settings(), Some(oracle.clone()));

        let first = cleaner.scan(&mut doc).await;
        assert_eq!((first.hidden, first.badged), (1, 1));

        let second = cleaner.scan(&mut doc).await;
        assert_eq!(second.located, 0);
        assert_eq!(second.processed(), 0);
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(cleaner.processed().len(), 2);
    }

    #[tokio::test]
    async fn test_generator_ignored_without_credential() {
        let mut doc = SnapshotTree::parse(&feed_html(&[PostFixture::new(
            1,
            "Join my webinar to 10x your sales funnel",
        )]));
        let oracle = MockOracle::new().otherwise(&MockOracle::verdict(0, "promotional"));
        let settings = Settings {
            credential: None,
            ..settings()
        };
        let mut cleaner = FeedCleaner::new(&settings, Some(oracle.clone()));

        let report = cleaner.scan(&mut doc).await;
        assert_eq!(report.badged, 1);
        assert_eq!(oracle.call_count(), 0);
        assert_eq!(report.items[0].score, 8);
    }

    #[test]
    fn test_report_display() {
        let report = ScanReport::<usize> {
            located: 3,
            skipped_sparse: 1,
            hidden: 1,
            badged: 1,
            ..ScanReport::default()
        };
        assert_eq!(
            report.to_string(),
            "located=3 processed=0 hidden=1 (muted=0) badged=1 sparse=1 failed=0"
        );
    }
}
