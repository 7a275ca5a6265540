/// Undo functionality for reverting a previous organize run.
///
/// This module reads the recorded operation history of an output root and
/// reverses it: moved files are renamed back to their source paths and
/// copied files are removed from the output tree.
use crate::file_organizer::{Operation, OperationKind, OperationLog, OrganizeError, OrganizeResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// Number of moved files restored to their source paths.
    pub restored_moves: usize,
    /// Number of copied files removed from the output tree.
    pub removed_copies: usize,
    /// Files that failed to revert, with the error reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped (e.g., file not found).
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Creates a new empty undo report.
    fn new() -> Self {
        Self {
            restored_moves: 0,
            removed_copies: 0,
            failed_restores: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.restored_moves
            + self.removed_copies
            + self.failed_restores.len()
            + self.skipped_files.len()
    }

    /// Returns true if the undo was completely successful.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Manages undo operations for organize runs.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organize run recorded in an output root.
    ///
    /// This function loads the operation history from the output root,
    /// validates it, and then reverses all recorded operations in reverse
    /// order of execution.
    ///
    /// # Arguments
    ///
    /// * `output_root` - The output directory the run placed files under
    ///
    /// # Returns
    ///
    /// Returns an `UndoReport` describing what was reverted, what failed,
    /// and what was skipped. Returns an error if the history file is missing,
    /// corrupted, or if the output root doesn't exist.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: Skipped with a note that the file couldn't be found
    /// * **File name conflict**: A file now sitting at a move's source path is
    ///   backed up with a timestamp suffix before the restore
    /// * **Permission denied**: Recorded as a failure with the error reason
    /// * **Missing history**: Returns an error indicating no undo is available
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chronosort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let result = UndoManager::undo(Path::new("/path/to/sorted"));
    /// match result {
    ///     Ok(report) => println!("Restored {} moved files", report.restored_moves),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(output_root: &Path) -> OrganizeResult<UndoReport> {
        // Validate that the output root exists
        if !output_root.exists() {
            return Err(OrganizeError::InvalidBasePath {
                path: output_root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "output path does not exist",
                ),
            });
        }

        // Load the operation log
        let log = OperationLog::load(output_root)?;
        let log = log.ok_or_else(|| OrganizeError::InvalidHistoryFormat {
            reason: "No previous organization found to undo".to_string(),
        })?;

        // Process operations in reverse order (undo is LIFO)
        let mut report = UndoReport::new();
        for operation in log.operations.iter().rev() {
            match Self::revert_operation(operation) {
                Ok(OperationKind::Move) => {
                    report.restored_moves += 1;
                }
                Ok(OperationKind::Copy) => {
                    report.removed_copies += 1;
                }
                Err((path, reason)) => {
                    if reason.contains("not found") {
                        report.skipped_files.push((path, reason));
                    } else {
                        report.failed_restores.push((path, reason));
                    }
                }
            }
        }

        // Only delete history if undo was successful
        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(output_root)
        {
            eprintln!("Warning: Could not delete history file: {}", e);
        }

        Ok(report)
    }

    /// Reverts a single recorded operation.
    ///
    /// Moved files are renamed back to their source path, backing up any
    /// file that now occupies it. Copied files are simply removed from the
    /// output tree.
    ///
    /// # Returns
    ///
    /// Returns the kind of the reverted operation on success, or
    /// `Err((path, reason))` on failure.
    fn revert_operation(operation: &Operation) -> Result<OperationKind, (PathBuf, String)> {
        // Check that the placed file is still where the run put it
        if !operation.destination.exists() {
            return Err((
                operation.destination.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        match operation.kind {
            OperationKind::Copy => {
                // The source was never touched, so removing the copy is enough
                fs::remove_file(&operation.destination).map_err(|e| {
                    (
                        operation.destination.clone(),
                        format!("Failed to remove copied file: {}", e),
                    )
                })?;
            }
            OperationKind::Move => {
                // Check if a file already exists at the source location
                if operation.source.exists() {
                    // Try to back up the conflicting file
                    let backup_path = Self::generate_backup_path(&operation.source);
                    fs::rename(&operation.source, &backup_path).map_err(|e| {
                        (
                            operation.source.clone(),
                            format!("Could not backup conflicting file: {}", e),
                        )
                    })?;
                }

                // Move the file back to its source location
                fs::rename(&operation.destination, &operation.source).map_err(|e| {
                    (
                        operation.destination.clone(),
                        format!("Failed to restore file: {}", e),
                    )
                })?;
            }
        }

        Ok(operation.kind)
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        let backup_name = format!("{}.bak.{}", filename, timestamp);

        if let Some(parent) = original_path.parent() {
            parent.join(backup_name)
        } else {
            PathBuf::from(backup_name)
        }
    }
}
