use dirsniff_common::{Classification, EntryRecord, Side, SniffError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Copy,
    Delete,
}

/// Result of a file operation
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub operation: FileOperation,
    pub bytes_processed: u64,
    pub dry_run: bool,
}

/// Copy and delete primitives applied to classified entries
pub struct FileOperations {
    dry_run: bool,
    use_trash: bool,
}

impl FileOperations {
    pub fn new(dry_run: bool, use_trash: bool) -> Self {
        Self { dry_run, use_trash }
    }

    /// Side whose file a copy of `entry` would read from.
    ///
    /// A unique file is copied from the side that has it; a modified file
    /// from the newer side over the older one.
    pub fn copy_source_side(entry: &EntryRecord) -> Result<Side, SniffError> {
        match &entry.classification {
            Classification::Unique { side } => Ok(*side),
            Classification::Modified { newer, .. } => Ok(*newer),
            Classification::Equal => Err(SniffError::InvalidOperation(format!(
                "{} is identical on both sides",
                entry.relative_path
            ))),
            Classification::Error { message } => Err(SniffError::InvalidOperation(format!(
                "{} could not be compared: {}",
                entry.relative_path, message
            ))),
        }
    }

    /// Copy the entry to the side that lacks it or holds the older version
    pub fn copy_to_other_side(&self, entry: &EntryRecord) -> Result<OperationResult, SniffError> {
        let from = Self::copy_source_side(entry)?;
        self.copy_file(entry.path_on(from), entry.path_on(from.other()))
    }

    /// Delete a file that exists on one side only
    pub fn delete(&self, entry: &EntryRecord) -> Result<OperationResult, SniffError> {
        match entry.classification {
            Classification::Unique { side } => self.delete_file(entry.path_on(side)),
            _ => Err(SniffError::InvalidOperation(format!(
                "{} is not unique to one side; only unique files can be deleted",
                entry.relative_path
            ))),
        }
    }

    /// Copy a file, creating missing parent directories and keeping the
    /// source modification time
    pub fn copy_file(&self, source: &Path, dest: &Path) -> Result<OperationResult, SniffError> {
        if self.dry_run {
            info!(
                "DRY RUN: Would copy {} to {}",
                source.display(),
                dest.display()
            );
            return Ok(OperationResult {
                source: source.to_path_buf(),
                destination: Some(dest.to_path_buf()),
                operation: FileOperation::Copy,
                bytes_processed: 0,
                dry_run: true,
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Copying {} to {}", source.display(), dest.display());
        let bytes = fs::copy(source, dest)?;

        let modified = fs::metadata(source)?.modified()?;
        filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified))?;

        info!(
            "Copied {} bytes from {} to {}",
            bytes,
            source.display(),
            dest.display()
        );
        Ok(OperationResult {
            source: source.to_path_buf(),
            destination: Some(dest.to_path_buf()),
            operation: FileOperation::Copy,
            bytes_processed: bytes,
            dry_run: false,
        })
    }

    /// Delete a file (with optional trash support)
    pub fn delete_file(&self, path: &Path) -> Result<OperationResult, SniffError> {
        if self.dry_run {
            info!("DRY RUN: Would delete {}", path.display());
            return Ok(OperationResult {
                source: path.to_path_buf(),
                destination: None,
                operation: FileOperation::Delete,
                bytes_processed: 0,
                dry_run: true,
            });
        }

        let bytes = fs::metadata(path)?.len();

        if self.use_trash {
            debug!("Moving {} to trash", path.display());
            trash::delete(path).map_err(|e| SniffError::Io(io::Error::other(e.to_string())))?;
            info!("Moved {} to trash", path.display());
        } else {
            debug!("Permanently deleting {}", path.display());
            fs::remove_file(path)?;
            info!("Deleted {}", path.display());
        }

        Ok(OperationResult {
            source: path.to_path_buf(),
            destination: None,
            operation: FileOperation::Delete,
            bytes_processed: bytes,
            dry_run: false,
        })
    }
}
