//! # Formats Module
//!
//! Serialization formats for attendance data.
//!
//! Pure transformations between bytes and register state. File I/O lives in
//! the app layer.

mod backup;

pub use backup::{BackupDocument, backup_from_bytes, backup_to_bytes};
