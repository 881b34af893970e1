use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedCleanError {
    #[error("Stale node handle: {0}")]
    StaleHandle(String),

    #[error("Document error: {0}")]
    Dom(String),
}
