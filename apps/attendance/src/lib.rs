//! # Attendance Register Library
//!
//! Library target of the attendance binary. Exposes the HTTP API, CLI,
//! configuration and storage modules so integration tests can drive them
//! directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod storage;
