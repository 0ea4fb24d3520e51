//! In-memory sources pre-loaded with a fixed set of items.

use super::{BatchSource, Catalog, ScanPage};
use crate::error::Result;
use crate::types::Item;
use crate::utils::lock;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build `count` synthetic items named `<prefix>_<n>`, numbered from 1
fn synthetic_items(prefix: &str, count: usize) -> Vec<Item> {
    (1..=count)
        .map(|n| Item::new(format!("{}_{}", prefix, n)))
        .collect()
}

/// Finite [`BatchSource`] holding its items in memory
///
/// Hands items out in insertion order and becomes exhausted with the batch
/// that empties it.
#[derive(Debug, Default)]
pub struct MemorySource {
    items: VecDeque<Item>,
    exhausted: bool,
}

impl MemorySource {
    /// Source over the given items
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into(),
            exhausted: false,
        }
    }

    /// Source over `count` synthetic items (`<prefix>_1`, `<prefix>_2`, ...)
    pub fn synthetic(prefix: &str, count: usize) -> Self {
        Self::new(synthetic_items(prefix, count))
    }

    /// Items not yet handed out
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

#[async_trait]
impl BatchSource for MemorySource {
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    async fn next_batch(&mut self, max_size: usize) -> Result<Vec<Item>> {
        let take = max_size.min(self.items.len());
        let batch: Vec<Item> = self.items.drain(..take).collect();
        if self.items.is_empty() {
            self.exhausted = true;
        }
        Ok(batch)
    }
}

/// Paginated [`Catalog`] over an in-memory item list
///
/// Cursors are stringified offsets. Every page served is recorded so callers
/// can inspect how a scan was split up.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: Vec<Item>,
    served: Mutex<Vec<ScanPage>>,
}

impl MemoryCatalog {
    /// Catalog over the given items
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            served: Mutex::new(Vec::new()),
        }
    }

    /// Catalog over `count` synthetic items (`<prefix>_1`, `<prefix>_2`, ...)
    pub fn synthetic(prefix: &str, count: usize) -> Self {
        Self::new(synthetic_items(prefix, count))
    }

    /// `(count, is_final)` of every page served so far
    pub fn served_pages(&self) -> Vec<(usize, bool)> {
        lock(&self.served)
            .iter()
            .map(|page| (page.count, page.is_final))
            .collect()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn scan(&self, cursor: Option<&str>, limit: usize) -> Result<ScanPage> {
        let start = cursor
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0)
            .min(self.items.len());
        let end = start.saturating_add(limit).min(self.items.len());
        let is_final = end >= self.items.len();

        let page = ScanPage {
            items: self.items[start..end].to_vec(),
            count: end - start,
            is_final,
            next_cursor: (!is_final).then(|| end.to_string()),
        };

        lock(&self.served).push(ScanPage {
            items: Vec::new(),
            ..page.clone()
        });

        Ok(page)
    }
}
