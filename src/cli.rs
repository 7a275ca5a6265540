//! Command-line interface module for chronosort.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing and validation
//! - Input tree walking and ignore filtering
//! - Placement orchestration and progress reporting
//! - Undo operation handling

use crate::config::{CompiledIgnore, IgnoreConfig};
use crate::file_organizer::{FileOrganizer, OperationKind, OperationLog, Placement};
use crate::file_record::{FileRecord, FsTimestamps};
use crate::output::OutputFormatter;
use crate::undo::UndoManager;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sort files into year and quarter folders by creation date.
#[derive(Parser)]
#[command(name = "chronosort", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The commands chronosort understands.
#[derive(Subcommand)]
pub enum Commands {
    /// Organize the files of an input tree into the output directory
    Organize {
        /// Directory whose files are organized
        input_dir: PathBuf,

        /// Directory the dated folder structure is created under
        output_dir: PathBuf,

        /// Report what would happen without touching any file
        #[arg(long)]
        dry_run: bool,

        /// Whether files are copied or moved into place
        #[arg(long, value_enum, default_value_t = OperationKind::Copy)]
        operation: OperationKind,

        /// Path to an ignore-rule configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Revert the previous organize run recorded in an output directory
    Undo {
        /// Output directory holding the run history
        output_dir: PathBuf,
    },
}

/// Everything one organize run needs, resolved up front.
pub struct RunContext {
    /// The directory whose files are organized.
    pub input_dir: PathBuf,
    /// The root the dated folder structure is created under.
    pub output_dir: PathBuf,
    /// Whether files are copied or moved.
    pub operation: OperationKind,
    /// If true, report intended actions without touching any file.
    pub dry_run: bool,
    ignore: CompiledIgnore,
}

/// Runs the CLI application with parsed arguments.
///
/// This is the main entry point for CLI operations. It dispatches to the
/// organize or undo flow based on the parsed command.
///
/// # Examples
///
/// ```no_run
/// use chronosort::cli::{Cli, run_cli};
/// use clap::Parser;
///
/// let cli = Cli::parse_from(["chronosort", "organize", "/inbox", "/sorted", "--dry-run"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("{}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Organize {
            input_dir,
            output_dir,
            dry_run,
            operation,
            config,
        } => run_organize(&input_dir, &output_dir, operation, dry_run, config.as_deref()),
        Commands::Undo { output_dir } => run_undo(&output_dir),
    }
}

/// Organizes an input tree into dated folders under an output directory.
///
/// This function:
/// 1. Validates the input and output directories
/// 2. Loads and compiles the ignore configuration
/// 3. Walks the input tree and collects the files to organize
/// 4. Resolves each file's creation timestamp and places it in its bucket
/// 5. Records performed operations for potential undo
///
/// # Arguments
///
/// * `input_dir` - The directory whose files are organized
/// * `output_dir` - The directory the dated structure is created under
/// * `operation` - Whether files are copied or moved
/// * `dry_run` - If true, report intended actions without touching any file
/// * `config_path` - Optional path to an ignore-rule configuration file
pub fn run_organize(
    input_dir: &Path,
    output_dir: &Path,
    operation: OperationKind,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<(), String> {
    validate_directories(input_dir, output_dir)?;

    // Load and compile the ignore configuration
    let config = IgnoreConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let ignore = config
        .compile()
        .map_err(|e| format!("Error compiling ignore rules: {}", e))?;

    let context = RunContext {
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        operation,
        dry_run,
        ignore,
    };

    organize_tree(&context)
}

/// Checks that the input directory exists and differs from the output.
fn validate_directories(input_dir: &Path, output_dir: &Path) -> Result<(), String> {
    if !input_dir.is_dir() {
        return Err(format!(
            "Input directory {} does not exist or is not a directory",
            input_dir.display()
        ));
    }

    if input_dir == output_dir {
        return Err("Input and output directories must be different".to_string());
    }

    // The same directory reached through different spellings
    if let (Ok(canonical_input), Ok(canonical_output)) =
        (input_dir.canonicalize(), output_dir.canonicalize())
        && canonical_input == canonical_output
    {
        return Err("Input and output directories must be different".to_string());
    }

    Ok(())
}

/// Walks the input tree and collects the files to organize.
///
/// Directories are traversed in lexical filename order so that index
/// suffixes are assigned deterministically. Ignored files are dropped
/// before indexes are handed out.
fn collect_files(context: &RunContext) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();

    for entry in WalkDir::new(&context.input_dir).sort_by_file_name() {
        let entry =
            entry.map_err(|e| format!("Error walking {}: {}", context.input_dir.display(), e))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        if context.ignore.should_include(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Runs one organize pass over the collected files.
///
/// The file list is fully collected before the first placement, so the
/// output directory growing during the run never feeds back into the walk.
/// The run stops at the first placement or resolution error; operations
/// performed up to that point are kept undoable.
fn organize_tree(context: &RunContext) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        context.input_dir.display()
    ));
    if context.dry_run {
        OutputFormatter::dry_run_notice("No files will be modified.");
    }

    let files = collect_files(context)?;
    if files.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let organizer = FileOrganizer::new(
        context.output_dir.clone(),
        context.operation,
        context.dry_run,
    );
    let mut operation_log = OperationLog::new(context.output_dir.clone());
    let mut bucket_counts: HashMap<String, usize> = HashMap::new();
    let timestamps = FsTimestamps;

    let progress =
        (!context.dry_run).then(|| OutputFormatter::create_progress_bar(files.len() as u64));
    let mut run_error: Option<String> = None;

    for (index, path) in files.iter().enumerate() {
        let record = match FileRecord::resolve(path, &timestamps) {
            Ok(record) => record,
            Err(e) => {
                run_error = Some(e.to_string());
                break;
            }
        };

        let bucket = format!("{}/{}", record.year_label(), record.quarter_label());

        match organizer.place(&record, index) {
            Ok(Placement::Performed(operation)) => {
                let message = format!(
                    "{} {} to {}",
                    context.operation.past_tense(),
                    operation.source.display(),
                    operation.destination.display()
                );
                match progress.as_ref() {
                    Some(pb) => pb.suspend(|| OutputFormatter::success(&message)),
                    None => OutputFormatter::success(&message),
                }
                operation_log.add_operation(operation);
                *bucket_counts.entry(bucket).or_insert(0) += 1;
            }
            Ok(Placement::WouldPlace { destination }) => {
                OutputFormatter::dry_run_notice(&format!(
                    "{} {} to {}",
                    context.operation.verb(),
                    path.display(),
                    destination.display()
                ));
                *bucket_counts.entry(bucket).or_insert(0) += 1;
            }
            Ok(Placement::AlreadyOccupied { destination }) => {
                OutputFormatter::warning(&format!(
                    "Unable to {} {} to {}: the destination file already exists",
                    context.operation.as_str(),
                    path.display(),
                    destination.display()
                ));
                *bucket_counts.entry(bucket).or_insert(0) += 1;
            }
            Err(e) => {
                run_error = Some(e.to_string());
                break;
            }
        }

        if let Some(pb) = progress.as_ref() {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    // Operations already performed stay undoable even when the run stops
    // early, so the history is saved before the error is reported.
    if !context.dry_run
        && !operation_log.operations.is_empty()
        && let Err(e) = operation_log.save(&context.output_dir)
    {
        OutputFormatter::warning(&format!("Could not save history: {}", e));
    }

    if let Some(e) = run_error {
        return Err(e);
    }

    OutputFormatter::summary_table(&bucket_counts, files.len());

    if context.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
        if !operation_log.operations.is_empty() {
            OutputFormatter::plain(&format!(
                "History saved. Use 'chronosort undo {}' to revert changes.",
                context.output_dir.display()
            ));
        }
    }

    Ok(())
}

/// Undoes the previous organize run recorded in an output directory.
///
/// This function:
/// 1. Loads the operation history from the output directory
/// 2. Reverses all recorded operations
/// 3. Reports on any skipped or failed restorations
///
/// # Arguments
///
/// * `output_dir` - The output directory the run placed files under
pub fn run_undo(output_dir: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    match UndoManager::undo(output_dir) {
        Ok(report) => {
            OutputFormatter::success("Undo complete!");
            OutputFormatter::plain(&format!(
                "  Operations processed: {}",
                report.total_processed()
            ));
            OutputFormatter::plain(&format!("  Restored moves: {}", report.restored_moves));
            OutputFormatter::plain(&format!("  Removed copies: {}", report.removed_copies));

            if !report.skipped_files.is_empty() {
                OutputFormatter::plain(&format!("  Skipped: {}", report.skipped_files.len()));
                for (path, reason) in &report.skipped_files {
                    OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
                }
            }

            if !report.failed_restores.is_empty() {
                OutputFormatter::plain(&format!("  Failed: {}", report.failed_restores.len()));
                for (path, reason) in &report.failed_restores {
                    OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
                }
                OutputFormatter::warning("History file was NOT deleted due to failures.");
                OutputFormatter::plain("Please fix the issues and try again.");
            }

            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_context(input_dir: &Path, output_dir: &Path) -> RunContext {
        RunContext {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            operation: OperationKind::Copy,
            dry_run: false,
            ignore: IgnoreConfig::default()
                .compile()
                .expect("default rules should compile"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize_defaults() {
        let cli = Cli::try_parse_from(["chronosort", "organize", "/inbox", "/sorted"])
            .expect("parse failed");

        match cli.command {
            Commands::Organize {
                input_dir,
                output_dir,
                dry_run,
                operation,
                config,
            } => {
                assert_eq!(input_dir, PathBuf::from("/inbox"));
                assert_eq!(output_dir, PathBuf::from("/sorted"));
                assert!(!dry_run);
                assert_eq!(operation, OperationKind::Copy);
                assert!(config.is_none());
            }
            Commands::Undo { .. } => panic!("expected the organize command"),
        }
    }

    #[test]
    fn test_parse_organize_flags() {
        let cli = Cli::try_parse_from([
            "chronosort",
            "organize",
            "/inbox",
            "/sorted",
            "--dry-run",
            "--operation=move",
        ])
        .expect("parse failed");

        match cli.command {
            Commands::Organize {
                dry_run, operation, ..
            } => {
                assert!(dry_run);
                assert_eq!(operation, OperationKind::Move);
            }
            Commands::Undo { .. } => panic!("expected the organize command"),
        }
    }

    #[test]
    fn test_parse_undo() {
        let cli = Cli::try_parse_from(["chronosort", "undo", "/sorted"]).expect("parse failed");

        match cli.command {
            Commands::Undo { output_dir } => {
                assert_eq!(output_dir, PathBuf::from("/sorted"));
            }
            Commands::Organize { .. } => panic!("expected the undo command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_operation() {
        let result = Cli::try_parse_from([
            "chronosort",
            "organize",
            "/inbox",
            "/sorted",
            "--operation=shred",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let output = TempDir::new().expect("Failed to create temp directory");
        let result = validate_directories(Path::new("/non/existent/input"), output.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_same_directories() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let result = validate_directories(dir.path(), dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_distinct_directories() {
        let input = TempDir::new().expect("Failed to create temp directory");
        let output = TempDir::new().expect("Failed to create temp directory");
        let result = validate_directories(input.path(), output.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_collect_files_sorted_and_filtered() {
        let input = TempDir::new().expect("Failed to create temp directory");
        let output = TempDir::new().expect("Failed to create temp directory");

        fs::write(input.path().join("b.txt"), "b").expect("write failed");
        fs::write(input.path().join("a.txt"), "a").expect("write failed");
        fs::write(input.path().join(".DS_Store"), "junk").expect("write failed");
        fs::create_dir(input.path().join("sub")).expect("mkdir failed");
        fs::write(input.path().join("sub").join("c.txt"), "c").expect("write failed");

        let context = test_context(input.path(), output.path());
        let files = collect_files(&context).expect("collect failed");

        assert_eq!(
            files,
            vec![
                input.path().join("a.txt"),
                input.path().join("b.txt"),
                input.path().join("sub").join("c.txt"),
            ]
        );
    }

    #[test]
    fn test_collect_files_skips_directories() {
        let input = TempDir::new().expect("Failed to create temp directory");
        let output = TempDir::new().expect("Failed to create temp directory");

        fs::create_dir(input.path().join("empty")).expect("mkdir failed");
        fs::create_dir(input.path().join("nested")).expect("mkdir failed");
        fs::write(input.path().join("nested").join("file.txt"), "x").expect("write failed");

        let context = test_context(input.path(), output.path());
        let files = collect_files(&context).expect("collect failed");

        assert_eq!(files, vec![input.path().join("nested").join("file.txt")]);
    }
}
