//! Page documents the engine reads from and writes titles to
//!
//! This module provides:
//! - Document: the handle the engine needs (title, first-match text query, change feed)
//! - MutationFeed / MutationSource: coalesced structural-change notifications
//! - ElementNode: a small element tree queried with `scraper` selectors
//! - MemoryDocument: an in-memory document built on that tree

pub mod element;
pub mod memory;

pub use element::ElementNode;
pub use memory::MemoryDocument;

use crate::error::{RetitleError, Result};
use async_trait::async_trait;
use scraper::Selector;
use tokio::sync::watch;

/// Parse a CSS selector the way rules store them
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| RetitleError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// A loaded page
#[async_trait]
pub trait Document: Send + Sync {
    /// Current document title
    async fn title(&self) -> Result<String>;

    /// Replace the document title
    async fn set_title(&self, title: &str) -> Result<()>;

    /// `textContent` of the first element matching `selector`, untrimmed, or `None` when nothing matches
    async fn query_text(&self, selector: &str) -> Result<Option<String>>;

    /// Whether at least one element matches `selector`
    async fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.query_text(selector).await?.is_some())
    }

    /// Subscribe to subtree/child-list changes made after this call
    fn subscribe(&self) -> MutationFeed;
}

/// Receiving side of a document's change notifications
///
/// Changes that land between two waits are coalesced into one notification,
/// the way a mutation observer delivers a batch.
#[derive(Debug)]
pub struct MutationFeed {
    rx: watch::Receiver<u64>,
}

impl MutationFeed {
    /// Wait for the next batch; `false` once the document is gone
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// A feed that is already closed
    pub fn closed() -> Self {
        let (tx, rx) = watch::channel(0);
        drop(tx);
        Self { rx }
    }
}

/// Sending side of a document's change notifications
#[derive(Debug)]
pub struct MutationSource {
    tx: watch::Sender<u64>,
}

impl MutationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Record a structural change
    pub fn notify(&self) {
        self.tx.send_modify(|batch| *batch = batch.wrapping_add(1));
    }

    /// New feed that only sees changes after this call
    pub fn subscribe(&self) -> MutationFeed {
        MutationFeed { rx: self.tx.subscribe() }
    }

    /// Number of change batches recorded so far
    pub fn batches(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for MutationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl From<watch::Receiver<u64>> for MutationFeed {
    fn from(mut rx: watch::Receiver<u64>) -> Self {
        rx.borrow_and_update();
        Self { rx }
    }
}
