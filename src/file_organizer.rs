/// File placement into the dated output tree.
///
/// This module builds destination paths from file records, performs the
/// copy or move of one file at a time, and records performed operations in
/// a history log so a run can be undone later. Dry-run mode computes the
/// same destinations but reports instead of touching the filesystem.
use crate::file_record::FileRecord;
use clap::ValueEnum;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// The two ways a file can be placed into the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationKind {
    /// Copy the file, leaving the source in place.
    Copy,
    /// Move the file, removing it from the source location.
    Move,
}

impl OperationKind {
    /// Returns the lowercase name used on the command line and in the
    /// history file.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Copy => "copy",
            OperationKind::Move => "move",
        }
    }

    /// Parses a history-file name back into an operation kind.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "copy" => Some(OperationKind::Copy),
            "move" => Some(OperationKind::Move),
            _ => None,
        }
    }

    /// Returns the imperative verb for announcing an intended action.
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Copy => "Copy",
            OperationKind::Move => "Move",
        }
    }

    /// Returns the past-tense verb for confirming a performed action.
    pub fn past_tense(&self) -> &'static str {
        match self {
            OperationKind::Copy => "Copied",
            OperationKind::Move => "Moved",
        }
    }
}

/// A single performed placement, recorded for undo.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Whether the file was copied or moved.
    pub kind: OperationKind,
    /// The source path the file was read from.
    pub source: PathBuf,
    /// The destination path the file was placed at.
    pub destination: PathBuf,
}

/// The full record of one organize run.
///
/// This is persisted into the output root so the run can be undone.
#[derive(Debug, Clone)]
pub struct OperationLog {
    /// ISO 8601 timestamp of when the run happened.
    pub timestamp: String,
    /// The output root the run placed files under.
    pub output_root: PathBuf,
    /// All operations performed in this run, in execution order.
    pub operations: Vec<Operation>,
}

impl OperationLog {
    /// Creates an empty log for a run targeting the given output root.
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            output_root,
            operations: Vec::new(),
        }
    }

    /// Appends a performed operation to this log.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Returns the path of the history file inside an output root.
    fn history_file_path(output_root: &Path) -> PathBuf {
        output_root.join(".chronosort_history.json")
    }

    /// Saves this log into the output root in JSON format.
    pub fn save(&self, output_root: &Path) -> OrganizeResult<()> {
        let json = json!({
            "timestamp": self.timestamp,
            "output_root": self.output_root.to_string_lossy().to_string(),
            "operations": self.operations.iter().map(|op| {
                json!({
                    "kind": op.kind.as_str(),
                    "source": op.source.to_string_lossy().to_string(),
                    "destination": op.destination.to_string_lossy().to_string(),
                })
            }).collect::<Vec<_>>(),
        });

        let history_path = Self::history_file_path(output_root);
        let json_string =
            serde_json::to_string_pretty(&json).map_err(|e| OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            })?;

        fs::write(&history_path, json_string)
            .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;

        Ok(())
    }

    /// Loads the history log from an output root, or `None` when no run has
    /// been recorded there.
    pub fn load(output_root: &Path) -> OrganizeResult<Option<Self>> {
        let history_path = Self::history_file_path(output_root);

        if !history_path.exists() {
            return Ok(None);
        }

        let json_string = fs::read_to_string(&history_path)
            .map_err(|e| OrganizeError::HistoryReadFailed { source: e })?;

        let json: Value = serde_json::from_str(&json_string).map_err(|e| {
            OrganizeError::InvalidHistoryFormat {
                reason: format!("JSON parse error: {}", e),
            }
        })?;

        let timestamp = json["timestamp"]
            .as_str()
            .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                reason: "Missing or invalid 'timestamp' field".to_string(),
            })?
            .to_string();

        let output_root_str =
            json["output_root"]
                .as_str()
                .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                    reason: "Missing or invalid 'output_root' field".to_string(),
                })?;

        let ops_array =
            json["operations"]
                .as_array()
                .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                    reason: "Missing or invalid 'operations' field".to_string(),
                })?;

        let operations: Result<Vec<_>, _> = ops_array
            .iter()
            .map(|op| {
                let kind_name =
                    op["kind"]
                        .as_str()
                        .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                            reason: "Missing 'kind' in operation".to_string(),
                        })?;
                let kind =
                    OperationKind::parse(kind_name).ok_or_else(|| {
                        OrganizeError::InvalidHistoryFormat {
                            reason: format!("Unknown operation kind '{}'", kind_name),
                        }
                    })?;
                let source = op["source"].as_str().ok_or_else(|| {
                    OrganizeError::InvalidHistoryFormat {
                        reason: "Missing 'source' in operation".to_string(),
                    }
                })?;
                let destination = op["destination"].as_str().ok_or_else(|| {
                    OrganizeError::InvalidHistoryFormat {
                        reason: "Missing 'destination' in operation".to_string(),
                    }
                })?;

                Ok(Operation {
                    kind,
                    source: PathBuf::from(source),
                    destination: PathBuf::from(destination),
                })
            })
            .collect();

        Ok(Some(OperationLog {
            timestamp,
            output_root: PathBuf::from(output_root_str),
            operations: operations?,
        }))
    }

    /// Deletes the history file from an output root, if one exists.
    pub fn delete(output_root: &Path) -> OrganizeResult<()> {
        let history_path = Self::history_file_path(output_root);
        if history_path.exists() {
            fs::remove_file(&history_path)
                .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;
        }
        Ok(())
    }
}

/// Errors that can occur while placing files or handling run history.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create a year/quarter bucket directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to open the source file of a copy.
    SourceOpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the destination file of a copy.
    FileCopyFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to rename a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The computed destination is already occupied.
    DestinationExists { destination: PathBuf },
    /// The output root path is invalid or doesn't exist.
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write history file.
    HistoryWriteFailed { source: std::io::Error },
    /// Failed to read history file.
    HistoryReadFailed { source: std::io::Error },
    /// History file has invalid format.
    InvalidHistoryFormat { reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::SourceOpenFailed { path, source } => {
                write!(f, "Failed to open source file {}: {}", path.display(), source)
            }
            Self::FileCopyFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists { destination } => {
                write!(
                    f,
                    "Destination file already exists: {}",
                    destination.display()
                )
            }
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid output path {}: {}", path.display(), source)
            }
            Self::HistoryWriteFailed { source } => {
                write!(f, "Failed to write history file: {}", source)
            }
            Self::HistoryReadFailed { source } => {
                write!(f, "Failed to read history file: {}", source)
            }
            Self::InvalidHistoryFormat { reason } => {
                write!(f, "Invalid history file format: {}", reason)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for file placement operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Composes the bucket directory for a record: `<root>/<year>/<quarter>`.
pub fn destination_dir(record: &FileRecord, output_root: &Path) -> PathBuf {
    output_root
        .join(record.year_label())
        .join(record.quarter_label())
}

/// Composes the destination filename for a record.
///
/// The filename is the record's stem, a `_<suffix>` disambiguator when the
/// suffix is non-empty, then the original extension. An empty suffix
/// reproduces the original filename exactly.
pub fn destination_filename(record: &FileRecord, suffix: &str) -> String {
    if suffix.is_empty() {
        format!("{}{}", record.stem(), record.extension())
    } else {
        format!("{}_{}{}", record.stem(), suffix, record.extension())
    }
}

/// The outcome of placing one file.
#[derive(Debug)]
pub enum Placement {
    /// The file was copied or moved to the destination.
    Performed(Operation),
    /// Dry run: the file would have been placed at this destination.
    WouldPlace { destination: PathBuf },
    /// Dry run: the destination is already taken, nothing would be placed.
    AlreadyOccupied { destination: PathBuf },
}

/// Places files into year/quarter bucket directories under an output root.
///
/// One organizer handles a whole run; it carries the run's operation kind
/// and dry-run flag, and performs one placement per call to `place`.
pub struct FileOrganizer {
    output_root: PathBuf,
    operation: OperationKind,
    dry_run: bool,
}

impl FileOrganizer {
    /// Creates an organizer for one run.
    pub fn new(output_root: PathBuf, operation: OperationKind, dry_run: bool) -> Self {
        Self {
            output_root,
            operation,
            dry_run,
        }
    }

    /// Places one file into its bucket, disambiguated by the run index.
    ///
    /// The destination is checked first: an occupied destination is an error
    /// outside dry-run, and a reported no-op under dry-run. Under dry-run
    /// with a free destination, the intended action is returned without any
    /// filesystem mutation. Otherwise the bucket directory is created as
    /// needed and the file is copied or moved into it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chronosort::file_organizer::{FileOrganizer, OperationKind};
    /// use chronosort::file_record::FileRecord;
    /// use std::path::PathBuf;
    ///
    /// let organizer = FileOrganizer::new(PathBuf::from("/sorted"), OperationKind::Copy, false);
    /// let record = FileRecord {
    ///     path: PathBuf::from("/inbox/photo.jpg"),
    ///     created_at: None,
    /// };
    ///
    /// match organizer.place(&record, 0) {
    ///     Ok(outcome) => println!("{:?}", outcome),
    ///     Err(e) => eprintln!("Placement failed: {}", e),
    /// }
    /// ```
    pub fn place(&self, record: &FileRecord, index: usize) -> OrganizeResult<Placement> {
        let bucket_dir = destination_dir(record, &self.output_root);
        let destination = bucket_dir.join(destination_filename(record, &index.to_string()));

        if destination.exists() {
            if self.dry_run {
                return Ok(Placement::AlreadyOccupied { destination });
            }
            return Err(OrganizeError::DestinationExists { destination });
        }

        if self.dry_run {
            return Ok(Placement::WouldPlace { destination });
        }

        match self.operation {
            OperationKind::Copy => Self::copy_file(&record.path, &destination)?,
            OperationKind::Move => Self::move_file(&record.path, &destination)?,
        }

        Ok(Placement::Performed(Operation {
            kind: self.operation,
            source: record.path.clone(),
            destination,
        }))
    }

    /// Copies a file by streaming its bytes to the destination.
    fn copy_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
        // An unreadable source must not leave an empty bucket directory
        // behind, so it is opened before anything is created.
        let mut reader = File::open(source).map_err(|e| OrganizeError::SourceOpenFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

        if let Some(parent) = destination.parent() {
            Self::create_bucket_dir(parent)?;
        }

        let mut writer =
            File::create(destination).map_err(|e| OrganizeError::FileCopyFailure {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source_error: e,
            })?;

        io::copy(&mut reader, &mut writer).map_err(|e| OrganizeError::FileCopyFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        })?;

        Ok(())
    }

    /// Moves a file by renaming it to the destination.
    fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
        if let Some(parent) = destination.parent() {
            Self::create_bucket_dir(parent)?;
        }

        fs::rename(source, destination).map_err(|e| OrganizeError::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        })
    }

    /// Creates a bucket directory and any missing parents.
    fn create_bucket_dir(dir: &Path) -> OrganizeResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            // 0777 before the process umask.
            builder.mode(0o777);
        }
        builder
            .create(dir)
            .map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })
    }
}
