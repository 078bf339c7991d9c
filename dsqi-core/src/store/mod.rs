//! Persistence for study records.
//!
//! [`paths`] fixes the on-disk layout, [`Storage`] abstracts whole-document
//! reads and writes, and [`Repository`] maps documents to typed records.

pub mod paths;
mod repo;
mod storage;

pub use repo::Repository;
pub use storage::{FsStorage, MemoryStorage, Storage};
