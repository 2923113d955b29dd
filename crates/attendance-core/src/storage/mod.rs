//! # Storage Module
//!
//! Disk-backed record storage.

mod redb_store;

pub use redb_store::RedbStore;
