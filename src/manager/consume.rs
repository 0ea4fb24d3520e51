//! Consume path: remove items from the head of the queue

use super::TaskManager;
use crate::error::{Error, Result, ServerErrorKind};
use crate::types::Item;
use crate::utils::lock;

impl TaskManager {
    /// Remove and return up to `size` items from the head of the queue, in
    /// FIFO order
    ///
    /// The removal, the `consumed` update and exhaustion detection happen in
    /// one critical section, so concurrent callers never receive the same item.
    /// Fewer than `size` items (possibly none) are returned when the queue is
    /// short.
    ///
    /// # Errors
    ///
    /// Returns a `TaskManagerError` if the manager has not been started or has
    /// been shut down.
    pub async fn pop_tasks(&self, size: usize) -> Result<Vec<Item>> {
        if !self.is_started() {
            return Err(Error::server(
                ServerErrorKind::TaskManagerError,
                "task manager is not started",
            ));
        }

        let (items, drained) = {
            let mut inner = lock(&self.state);
            let take = size.min(inner.queue.len());
            let items: Vec<Item> = inner.queue.drain(..take).collect();
            inner.run.consumed += items.len() as u64;
            let drained = inner.note_drained();
            (items, drained)
        };

        if drained {
            self.announce_exhausted();
        }

        Ok(items)
    }
}
