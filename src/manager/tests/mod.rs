use super::test_helpers::*;
use super::fetch::TickOutcome;
use super::*;
use crate::source::{CatalogSource, MemoryCatalog, MemorySource};
use std::time::Duration;

mod fetch;
