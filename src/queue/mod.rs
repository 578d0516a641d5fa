//! Crawl frontier: the ordered, growing sequence of save requests.
//!
//! The frontier keeps every request it has ever held. A cursor marks the
//! next item to process; items discovered while processing item *i* are
//! spliced in at *i + 1*, so children are visited before previously queued
//! siblings (depth-first order).
//!
//! # Example
//!
//! ```
//! use archiver_core::queue::{Frontier, SaveRequest};
//!
//! let mut frontier = Frontier::new(vec![
//!     SaveRequest::archive("", "a", ()),
//!     SaveRequest::archive("", "b", ()),
//! ]);
//! let first = frontier.advance().cloned();
//! assert_eq!(first.map(|r| r.title), Some("a".to_string()));
//! frontier.splice_discovered(vec![SaveRequest::archive("", "a/child", ())]);
//! assert_eq!(frontier.advance().map(|r| r.title.as_str()), Some("a/child"));
//! ```

mod item;

pub use item::{SaveFormat, SaveRequest};

use tracing::debug;

/// Ordered work queue with depth-first splice semantics.
#[derive(Debug, Clone)]
pub struct Frontier<M> {
    items: Vec<SaveRequest<M>>,
    /// Index of the next item to hand out.
    cursor: usize,
}

impl<M> Frontier<M> {
    /// Creates a frontier seeded with the initial list.
    #[must_use]
    pub fn new(seed: Vec<SaveRequest<M>>) -> Self {
        Self {
            items: seed,
            cursor: 0,
        }
    }

    /// Returns the next item and moves the cursor past it.
    ///
    /// Returns `None` once the cursor reaches the current length.
    pub fn advance(&mut self) -> Option<&SaveRequest<M>> {
        let item = self.items.get(self.cursor)?;
        self.cursor += 1;
        Some(item)
    }

    /// Inserts discovered items directly after the most recently advanced item.
    ///
    /// Before the first `advance` the items go to the front of the queue.
    pub fn splice_discovered(&mut self, discovered: Vec<SaveRequest<M>>) {
        if discovered.is_empty() {
            return;
        }
        debug!(
            count = discovered.len(),
            at = self.cursor,
            "splicing discovered items"
        );
        self.items.splice(self.cursor..self.cursor, discovered);
    }

    /// Index of the item most recently returned by `advance`.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    /// Number of items already handed out.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.cursor
    }

    /// Number of items still waiting.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Total number of items ever queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was ever queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at `index`, processed or not.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SaveRequest<M>> {
        self.items.get(index)
    }

    /// Iterates over all items in frontier order.
    pub fn iter(&self) -> impl Iterator<Item = &SaveRequest<M>> {
        self.items.iter()
    }
}
