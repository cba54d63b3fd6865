//! Local folder and blob container comparison
//!
//! [`FileSyncInfo`] compares the data files below a local folder with the blobs of a
//! container. [`synchronise`] copies the differences in one [`SyncDirection`],
//! optionally asking before each file.

use crate::adapters::storage::{blob_name_for, BlobStore};
use crate::domain::{DextractError, Result};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Extensions compared when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 4] = [".csv", ".xls", ".xlsx", ".zip"];

/// Which side is copied to the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SyncDirection {
    /// Local files to blob storage
    Upload,
    /// Blobs to the local folder
    Download,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Upload => f.write_str("upload"),
            SyncDirection::Download => f.write_str("download"),
        }
    }
}

/// What a sync copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Copy files present on both sides
    pub update_existing: bool,
    /// Copy files present only on the source side
    pub add_missing: bool,
    /// Ask before each file
    pub confirm: bool,
    /// Replace existing blobs when uploading
    pub overwrite: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            update_existing: true,
            add_missing: true,
            confirm: true,
            overwrite: true,
        }
    }
}

/// Outcome of [`synchronise`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub transferred: usize,
    pub skipped: usize,
}

/// Answers the per-file question asked when confirmation is on
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Asks on stdout and reads the answer from stdin; `y` or `yes` accepts
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Accepts everything
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Local files and blobs, and how they overlap
///
/// All names are relative with `/` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyncInfo {
    pub local_files: BTreeSet<String>,
    pub blob_files: BTreeSet<String>,
    /// Blobs with no local copy
    pub local_missing: BTreeSet<String>,
    /// Local files with no blob
    pub blob_missing: BTreeSet<String>,
    pub in_both: BTreeSet<String>,
}

impl FileSyncInfo {
    /// Compares the files below `local_root` with `blob_names`
    ///
    /// Only names ending in one of `extensions` are considered. Local files whose
    /// name starts with `_` or `.` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `local_root` cannot be walked.
    pub fn compute<S: AsRef<str>>(
        local_root: &Path,
        extensions: &[S],
        blob_names: &[String],
    ) -> Result<Self> {
        let has_extension =
            |name: &str| extensions.iter().any(|ext| name.ends_with(ext.as_ref()));

        let mut local_files = BTreeSet::new();
        if local_root.exists() {
            for entry in WalkDir::new(local_root).min_depth(1) {
                let entry = entry.map_err(|e| DextractError::Io(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy();
                if file_name.starts_with('_') || file_name.starts_with('.') {
                    continue;
                }
                let name = blob_name_for(entry.path(), local_root)?;
                if has_extension(&name) {
                    local_files.insert(name);
                }
            }
        }

        let blob_files: BTreeSet<String> = blob_names
            .iter()
            .filter(|name| has_extension(name))
            .cloned()
            .collect();

        Ok(Self {
            local_missing: blob_files.difference(&local_files).cloned().collect(),
            blob_missing: local_files.difference(&blob_files).cloned().collect(),
            in_both: local_files.intersection(&blob_files).cloned().collect(),
            local_files,
            blob_files,
        })
    }

    /// Lists every blob and compares it with `local_root`
    pub async fn from_store<S: AsRef<str>>(
        store: &dyn BlobStore,
        local_root: &Path,
        extensions: &[S],
    ) -> Result<Self> {
        let blobs = store.list_blobs().await?;
        Self::compute(local_root, extensions, &blobs)
    }

    /// The three human-readable comparison messages
    pub fn diff_messages(&self) -> [String; 3] {
        [
            describe(
                &self.local_missing,
                "All blobs exist on your local machine.",
                "These blobs are missing from your local machine:",
            ),
            describe(
                &self.blob_missing,
                "All local files exist in blob storage.",
                "These local files are missing from blob storage:",
            ),
            describe(
                &self.in_both,
                "No files exist in both blob and local storage.",
                "These files exist in both blob and local storage:",
            ),
        ]
    }

    /// Names to copy in `direction`
    pub fn plan(&self, direction: SyncDirection, options: &SyncOptions) -> BTreeSet<String> {
        let missing = match direction {
            SyncDirection::Upload => &self.blob_missing,
            SyncDirection::Download => &self.local_missing,
        };

        let mut names = BTreeSet::new();
        if options.update_existing {
            names.extend(self.in_both.iter().cloned());
        }
        if options.add_missing {
            names.extend(missing.iter().cloned());
        }
        names
    }
}

fn describe(names: &BTreeSet<String>, empty: &str, heading: &str) -> String {
    if names.is_empty() {
        empty.to_string()
    } else {
        let list = names
            .iter()
            .map(|n| format!("  {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{heading}\n{list}")
    }
}

/// Copies the planned files between `local_root` and `store`
///
/// Files are processed in name order. The first failed transfer stops the sync.
///
/// # Errors
///
/// Returns the storage or I/O error of the failed transfer.
pub async fn synchronise<S: AsRef<str>>(
    store: &dyn BlobStore,
    local_root: &Path,
    extensions: &[S],
    direction: SyncDirection,
    options: &SyncOptions,
    confirm: &mut dyn Confirm,
) -> Result<SyncSummary> {
    let info = FileSyncInfo::from_store(store, local_root, extensions).await?;
    let planned = info.plan(direction, options);
    let mut summary = SyncSummary::default();

    if planned.is_empty() {
        tracing::info!(direction = %direction, "There are no files to {direction}");
        return Ok(summary);
    }

    tracing::info!(direction = %direction, files = planned.len(), "Starting sync");

    for name in &planned {
        if options.confirm && !confirm.confirm(&format!("Would you like to {direction} the file: {name}?")) {
            tracing::info!(file = %name, "Skipped");
            summary.skipped += 1;
            continue;
        }

        let local_path = local_root.join(name);
        match direction {
            SyncDirection::Upload => store.upload(&local_path, name, options.overwrite).await?,
            SyncDirection::Download => store.download(name, &local_path).await?,
        }
        crate::log_blob_transfer!(direction, name);
        summary.transferred += 1;
    }

    Ok(summary)
}
