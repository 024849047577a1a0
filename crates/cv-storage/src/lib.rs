//! Persistence for the labeled dataset and the trained classifier snapshot.

mod atomic;
mod dataset;
mod jsonl;
mod snapshot_store;

pub use atomic::write_atomic;
pub use dataset::{DatasetStore, MemoryDatasetStore};
pub use jsonl::JsonlDatasetStore;
pub use snapshot_store::SnapshotStore;
