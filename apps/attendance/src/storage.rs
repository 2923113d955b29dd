//! # Register Storage
//!
//! Opening and saving a register for the selected backend.
//!
//! - `redb`: the database at the path, persisted on every change
//! - `file`: the backup document at the path, loaded into memory and
//!   rewritten by [`save_register`] after each change

use crate::config::BackendKind;
use attendance_core::{
    AttendanceError, MemoryStore, Register, Settings, backup_from_bytes, backup_to_bytes,
    primitives::MAX_BACKUP_SIZE,
};
use std::path::{Path, PathBuf};

/// Validate file size before reading.
pub fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AttendanceError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AttendanceError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AttendanceError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, AttendanceError> {
    let canonical = path.canonicalize().map_err(|e| {
        AttendanceError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AttendanceError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against an existing parent directory.
pub fn validate_output_path(path: &Path) -> Result<PathBuf, AttendanceError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AttendanceError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AttendanceError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AttendanceError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a backup document from disk, with the size limit applied first.
pub fn read_backup_file(path: &Path) -> Result<Vec<u8>, AttendanceError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_BACKUP_SIZE as u64)?;
    std::fs::read(&validated).map_err(|e| AttendanceError::IoError(format!("Read file: {}", e)))
}

/// Open a register at `db_path`, creating an empty one if nothing exists.
pub fn open_register(db_path: &Path, backend: BackendKind) -> Result<Register, AttendanceError> {
    match backend {
        BackendKind::Redb => Register::with_redb(db_path),
        BackendKind::File => {
            if !db_path.exists() {
                return Ok(Register::new());
            }
            let data = read_backup_file(db_path)?;
            let document = backup_from_bytes(&data)?;
            let settings = document.settings(&Settings::default());
            Ok(Register::with_memory(MemoryStore::with_state(
                document.attendance_records,
                settings,
            )))
        }
    }
}

/// Save a register to `db_path`.
///
/// A no-op for persistent backends.
pub fn save_register(register: &Register, db_path: &Path) -> Result<(), AttendanceError> {
    if register.is_persistent() {
        return Ok(());
    }
    let data = backup_to_bytes(&register.export_backup()?)?;
    std::fs::write(db_path, &data)
        .map_err(|e| AttendanceError::IoError(format!("Write db: {}", e)))?;
    tracing::debug!(path = %db_path.display(), bytes = data.len(), "Register saved");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
