//! Ordered k-way merge of per-file record streams.

pub mod coordinator;
pub mod min_queue;

pub use coordinator::{FileStats, MergeCoordinator, MergeError, MergeStats, RefillPolicy};
pub use min_queue::MinQueue;
