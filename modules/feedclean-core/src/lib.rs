pub mod classifier;
pub mod dom;
pub mod extractor;
pub mod identity;
pub mod locator;
pub mod mute;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod processed;
pub mod rate_limit;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod visibility;
pub mod watcher;

pub use classifier::{ClassificationClient, PromptTemplate};
pub use dom::{DocumentTree, NodeId, Selector, SnapshotTree};
pub use pipeline::{FeedCleaner, ItemOutcome, ScanReport};
pub use policy::{Decision, HideReason};
pub use visibility::Concealment;
pub use watcher::{ChangeWatcher, Debouncer, MutationRecord};
