//! Backup management for the ledger file before it is overwritten.

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Prefix for ledger backup files.
pub const LEDGER: &str = "ledger";

const CSV: &str = "csv";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    ledger_path: PathBuf,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            ledger_path: config.ledger_path().to_path_buf(),
        }
    }

    /// Copies the ledger file to the backups directory. Returns `Ok(None)` if there is no ledger
    /// file yet.
    ///
    /// The filename format is `ledger.YYYY-MM-DD-NNN.csv` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    pub fn copy_ledger(&self) -> Result<Option<PathBuf>> {
        if !self.ledger_path.is_file() {
            return Ok(None);
        }
        let date = today();
        let seq = self.next_sequence_number(LEDGER, &date, CSV)?;
        let filename = format!("{LEDGER}.{date}-{seq:03}.{CSV}");
        let path = self.backups_dir.join(&filename);

        utils::copy(&self.ledger_path, &path)?;

        self.rotate(LEDGER, CSV)?;

        Ok(Some(path))
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    fn next_sequence_number(&self, prefix: &str, date: &str, extension: &str) -> Result<u32> {
        let pattern_start = format!("{prefix}.{date}-");
        let mut max_seq: u32 = 0;

        for entry in utils::read_dir(&self.backups_dir)? {
            let entry = entry.context("Failed to read directory entry")?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if name.starts_with(&pattern_start) {
                if let Some(seq) = parse_sequence_number(&name, prefix, date, extension) {
                    max_seq = max_seq.max(seq);
                }
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    fn rotate(&self, prefix: &str, extension: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        for entry in utils::read_dir(&self.backups_dir)? {
            let entry = entry.context("Failed to read directory entry")?;
            let name = entry.file_name().to_string_lossy().to_string();

            if is_backup_file(&name, prefix, extension) {
                files.push((entry.path(), name));
            }
        }

        // Sort by filename (which sorts by date and sequence number due to format)
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path)?;
        }

        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str, extension: &str) -> Option<u32> {
    // Pattern: {prefix}.{date}-{NNN}.{ext}
    let expected_start = format!("{prefix}.{date}-");
    let remainder = filename.strip_prefix(&expected_start)?;
    let seq_str = remainder.strip_suffix(&format!(".{extension}"))?;
    seq_str.parse().ok()
}

/// Checks if a filename is a backup file with the given prefix and extension.
fn is_backup_file(filename: &str, prefix: &str, extension: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{extension}"))
}
