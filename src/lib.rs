//! chronosort - A batch file organizer built around creation dates
//!
//! This library provides utilities for resolving file creation timestamps,
//! bucketing files into year and quarter folders, copying or moving them
//! into a dated output tree, undoing those operations, and configuring
//! ignore rules via TOML configuration files.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod file_record;
pub mod output;
pub mod quarter;
pub mod undo;

pub use config::{CompiledIgnore, ConfigError, IgnoreConfig};
pub use file_organizer::{FileOrganizer, Operation, OperationKind, OperationLog, Placement};
pub use file_record::{FileRecord, FsTimestamps, TimestampSource, UNDEFINED_LABEL};
pub use quarter::Quarter;
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, run_cli, run_organize, run_undo};
