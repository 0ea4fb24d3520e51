//! Batch sources: cursors that pull bounded batches out of a paginated catalog.
//!
//! A [`BatchSource`] is created per run and discarded when the run ends. Two
//! implementations exist:
//! - [`CatalogSource`] - walks any [`Catalog`] page by page (production uses
//!   [`HttpCatalog`])
//! - [`MemorySource`] - a finite, pre-loaded source for tests and demos

use crate::error::{Error, Result, ServerErrorKind};
use crate::types::Item;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod catalog;
mod memory;

pub use catalog::HttpCatalog;
pub use memory::{MemoryCatalog, MemorySource};

/// A cursor over the catalog that yields bounded batches
#[async_trait]
pub trait BatchSource: Send {
    /// True once the catalog has signalled that no more data follows
    fn is_exhausted(&self) -> bool;

    /// Return up to `max_size` items from the current position and advance
    ///
    /// # Errors
    ///
    /// Returns a `DataSourceError` server error when the catalog page violates
    /// the scan contract. Such errors are fatal to the run and never retried.
    async fn next_batch(&mut self, max_size: usize) -> Result<Vec<Item>>;
}

/// One page of a catalog scan, as reported by the catalog
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanPage {
    /// Items on this page
    #[serde(default)]
    pub items: Vec<Item>,
    /// Number of items the catalog claims to have returned
    pub count: usize,
    /// Whether this is the last page of the scan
    #[serde(rename = "final")]
    pub is_final: bool,
    /// Continuation token for the next page
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl ScanPage {
    /// Check the page against the scan contract
    pub fn validate(&self) -> Result<()> {
        if self.count != self.items.len() {
            return Err(Error::server(
                ServerErrorKind::DataSourceError,
                format!(
                    "catalog reported {} items but returned {}",
                    self.count,
                    self.items.len()
                ),
            ));
        }
        if !self.is_final && self.next_cursor.is_none() {
            return Err(Error::server(
                ServerErrorKind::DataSourceError,
                "catalog reported more pages but sent no continuation cursor",
            ));
        }
        Ok(())
    }
}

/// Paginated scan over the item catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch up to `limit` items starting at `cursor` (`None` = from the start)
    async fn scan(&self, cursor: Option<&str>, limit: usize) -> Result<ScanPage>;
}

/// [`BatchSource`] backed by a [`Catalog`]
pub struct CatalogSource {
    catalog: Arc<dyn Catalog>,
    cursor: Option<String>,
    exhausted: bool,
}

impl CatalogSource {
    /// Start a fresh scan of `catalog`
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            cursor: None,
            exhausted: false,
        }
    }

    /// Continuation token for the next page
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

#[async_trait]
impl BatchSource for CatalogSource {
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    async fn next_batch(&mut self, max_size: usize) -> Result<Vec<Item>> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let page = self.catalog.scan(self.cursor.as_deref(), max_size).await?;
        page.validate()?;

        if page.is_final {
            self.exhausted = true;
            self.cursor = None;
        } else {
            self.cursor = page.next_cursor;
        }

        tracing::debug!(
            count = page.count,
            is_final = page.is_final,
            "Catalog page received"
        );

        Ok(page.items)
    }
}
