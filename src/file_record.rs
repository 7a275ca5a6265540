/// File records and creation-timestamp resolution.
///
/// A `FileRecord` captures the one fact this tool classifies by: the file's
/// creation (birth) timestamp, when the platform and filesystem expose one.
/// The timestamp lookup sits behind the `TimestampSource` trait so the
/// classification pipeline can be exercised in tests without depending on
/// real filesystem birth times.
use crate::quarter::Quarter;
use chrono::{DateTime, Datelike, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Label used for both the year and quarter directory when a file has no
/// resolvable creation time.
pub const UNDEFINED_LABEL: &str = "UNDEFINED";

/// Error raised when a file's metadata cannot be read at all.
///
/// A missing birth time is not an error (see `FileRecord::created_at`);
/// this only covers the stat call itself failing.
#[derive(Debug)]
pub struct ResolveError {
    /// The path whose metadata could not be read.
    pub path: PathBuf,
    /// The underlying IO error.
    pub source: std::io::Error,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to read metadata for {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for ResolveError {}

/// Source of creation timestamps for paths.
///
/// The filesystem implementation is `FsTimestamps`; tests substitute their
/// own implementation to classify against fixed dates.
pub trait TimestampSource {
    /// Returns the creation time for `path`, or `None` when the platform or
    /// filesystem does not record one. Fails only if the path cannot be
    /// stat-ed at all.
    fn created_at(&self, path: &Path) -> Result<Option<SystemTime>, ResolveError>;
}

/// Reads creation timestamps from the real filesystem.
pub struct FsTimestamps;

impl TimestampSource for FsTimestamps {
    fn created_at(&self, path: &Path) -> Result<Option<SystemTime>, ResolveError> {
        let metadata = fs::metadata(path).map_err(|e| ResolveError {
            path: path.to_path_buf(),
            source: e,
        })?;
        // created() errs when the platform has no birth time; that is a
        // valid record state, not a failure.
        Ok(metadata.created().ok())
    }
}

/// A file selected for organization, together with its creation time.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// The source path of the file.
    pub path: PathBuf,
    /// The creation time, or `None` when the filesystem records none.
    pub created_at: Option<DateTime<Local>>,
}

impl FileRecord {
    /// Builds a record for `path` by resolving its creation time through the
    /// given source.
    pub fn resolve(path: &Path, source: &impl TimestampSource) -> Result<Self, ResolveError> {
        let created_at = source.created_at(path)?.map(DateTime::<Local>::from);
        Ok(Self {
            path: path.to_path_buf(),
            created_at,
        })
    }

    /// Returns the year directory label: the decimal year, or the
    /// `UNDEFINED` label when the record has no creation time.
    pub fn year_label(&self) -> String {
        match self.created_at {
            Some(created_at) => created_at.year().to_string(),
            None => UNDEFINED_LABEL.to_string(),
        }
    }

    /// Returns the quarter directory label, or the `UNDEFINED` label when
    /// the record has no creation time.
    ///
    /// The year and quarter label are governed by the same timestamp, so
    /// they are `UNDEFINED` together or not at all.
    pub fn quarter_label(&self) -> &'static str {
        match self.created_at {
            Some(created_at) => Quarter::of_month(created_at.month()).dir_name(),
            None => UNDEFINED_LABEL,
        }
    }

    /// Returns the filename without its extension.
    ///
    /// A leading dot is not treated as an extension separator, so the stem
    /// of `.bashrc` is `.bashrc`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Returns the extension including its leading dot, or an empty string
    /// for files without one. `stem() + extension()` always reproduces the
    /// original filename.
    pub fn extension(&self) -> String {
        match self.path.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs::File;
    use tempfile::TempDir;

    /// Timestamp source returning a fixed value for every path.
    struct StubTimestamps {
        at: Option<SystemTime>,
    }

    impl TimestampSource for StubTimestamps {
        fn created_at(&self, _path: &Path) -> Result<Option<SystemTime>, ResolveError> {
            Ok(self.at)
        }
    }

    fn record_with_date(path: &str, year: i32, month: u32, day: u32) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            created_at: Some(
                Local
                    .with_ymd_and_hms(year, month, day, 12, 0, 0)
                    .single()
                    .expect("valid test date"),
            ),
        }
    }

    fn record_without_date(path: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            created_at: None,
        }
    }

    #[test]
    fn test_labels_with_timestamp() {
        let record = record_with_date("/in/photo.jpg", 2023, 5, 10);
        assert_eq!(record.year_label(), "2023");
        assert_eq!(record.quarter_label(), "01_apr_to_jun");
    }

    #[test]
    fn test_labels_undefined_together_without_timestamp() {
        let record = record_without_date("/in/photo.jpg");
        assert_eq!(record.year_label(), UNDEFINED_LABEL);
        assert_eq!(record.quarter_label(), UNDEFINED_LABEL);
    }

    #[test]
    fn test_stem_and_extension() {
        let record = record_without_date("/in/photo.jpg");
        assert_eq!(record.stem(), "photo");
        assert_eq!(record.extension(), ".jpg");

        let record = record_without_date("/in/archive.tar.gz");
        assert_eq!(record.stem(), "archive.tar");
        assert_eq!(record.extension(), ".gz");

        let record = record_without_date("/in/README");
        assert_eq!(record.stem(), "README");
        assert_eq!(record.extension(), "");

        let record = record_without_date("/in/.bashrc");
        assert_eq!(record.stem(), ".bashrc");
        assert_eq!(record.extension(), "");
    }

    #[test]
    fn test_stem_plus_extension_reproduces_filename() {
        for name in ["photo.jpg", "archive.tar.gz", "README", ".bashrc", "a.b.c"] {
            let record = record_without_date(&format!("/in/{}", name));
            assert_eq!(
                format!("{}{}", record.stem(), record.extension()),
                name,
                "stem + extension should round-trip {}",
                name
            );
        }
    }

    #[test]
    fn test_resolve_with_stubbed_timestamp() {
        let at = SystemTime::from(Utc.with_ymd_and_hms(2023, 5, 10, 12, 0, 0).unwrap());
        let source = StubTimestamps { at: Some(at) };

        let record =
            FileRecord::resolve(Path::new("/in/photo.jpg"), &source).expect("resolve failed");

        assert_eq!(record.path, PathBuf::from("/in/photo.jpg"));
        assert_eq!(record.year_label(), "2023");
        assert_eq!(record.quarter_label(), "01_apr_to_jun");
    }

    #[test]
    fn test_resolve_with_stubbed_missing_timestamp() {
        let source = StubTimestamps { at: None };

        let record =
            FileRecord::resolve(Path::new("/in/photo.jpg"), &source).expect("resolve failed");

        assert!(record.created_at.is_none());
        assert_eq!(record.year_label(), UNDEFINED_LABEL);
    }

    #[test]
    fn test_resolve_against_filesystem() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("file.txt");
        File::create(&file_path).expect("Failed to create file");

        let record = FileRecord::resolve(&file_path, &FsTimestamps).expect("resolve failed");

        assert_eq!(record.path, file_path);
        // Whether a birth time exists depends on the filesystem; the labels
        // must still be undefined together or defined together.
        assert_eq!(
            record.year_label() == UNDEFINED_LABEL,
            record.quarter_label() == UNDEFINED_LABEL
        );
    }

    #[test]
    fn test_resolve_missing_file_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing.txt");

        let result = FileRecord::resolve(&missing, &FsTimestamps);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.path, missing);
    }
}
