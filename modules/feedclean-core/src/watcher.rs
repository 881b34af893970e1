use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Quiet period after the last structural change before a re-scan runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Nodes were added or removed somewhere in the subtree.
    ChildList,
    /// An attribute, class or display state changed.
    Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
}

impl MutationRecord {
    pub fn child_list() -> Self {
        Self {
            kind: MutationKind::ChildList,
        }
    }

    pub fn triggers_scan(&self) -> bool {
        self.kind == MutationKind::ChildList
    }
}

/// Single pending deadline, pushed back by each trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Cancel any pending deadline and schedule a new one `delay` after `now`.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Run `callback` once if the deadline has passed, clearing it.
    pub fn fire_if_due(&mut self, now: Instant, callback: impl FnOnce()) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                callback();
                true
            }
            _ => false,
        }
    }
}

/// Turns a stream of mutation records into debounced scan requests.
pub struct ChangeWatcher {
    rx: UnboundedReceiver<MutationRecord>,
    debouncer: Debouncer,
}

impl ChangeWatcher {
    pub fn new(rx: UnboundedReceiver<MutationRecord>, delay: Duration) -> Self {
        Self {
            rx,
            debouncer: Debouncer::new(delay),
        }
    }

    /// A connected sender and watcher pair.
    pub fn channel(delay: Duration) -> (UnboundedSender<MutationRecord>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, delay))
    }

    /// Wait until a burst of child-list changes has gone quiet.
    ///
    /// Returns `None` once every sender is dropped and nothing is pending.
    /// A burst that was pending when the channel closed still yields one
    /// final scan.
    pub async fn next_scan(&mut self) -> Option<()> {
        let mut closed = false;
        loop {
            if closed {
                let deadline = self.debouncer.deadline()?;
                sleep_until(deadline).await;
                self.debouncer.clear();
                return Some(());
            }

            let deadline = self.debouncer.deadline();
            tokio::select! {
                record = self.rx.recv() => match record {
                    Some(record) if record.triggers_scan() => {
                        trace!("Child list changed, debouncing");
                        self.debouncer.trigger();
                    }
                    Some(_) => {}
                    None => closed = true,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debouncer.fire_if_due(Instant::now(), || {}) {
                        return Some(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_pushes_deadline_back() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.trigger_at(start);
        debouncer.trigger_at(start + Duration::from_millis(200));
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(500)));

        let mut fired = 0;
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(400), || fired += 1));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(500), || fired += 1));
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(900), || fired += 1));
        assert_eq!(fired, 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_one_scan() {
        let (tx, mut watcher) = ChangeWatcher::channel(DEFAULT_DEBOUNCE);
        for _ in 0..5 {
            tx.send(MutationRecord::child_list()).unwrap();
        }
        let started = Instant::now();
        assert_eq!(watcher.next_scan().await, Some(()));
        assert!(started.elapsed() >= DEFAULT_DEBOUNCE);

        drop(tx);
        assert_eq!(watcher.next_scan().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attribute_changes_do_not_trigger() {
        let (tx, mut watcher) = ChangeWatcher::channel(DEFAULT_DEBOUNCE);
        tx.send(MutationRecord {
            kind: MutationKind::Attributes,
        })
        .unwrap();
        drop(tx);
        assert_eq!(watcher.next_scan().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_burst_flushes_after_close() {
        let (tx, mut watcher) = ChangeWatcher::channel(DEFAULT_DEBOUNCE);
        tx.send(MutationRecord::child_list()).unwrap();
        drop(tx);
        assert_eq!(watcher.next_scan().await, Some(()));
        assert_eq!(watcher.next_scan().await, None);
    }
}
