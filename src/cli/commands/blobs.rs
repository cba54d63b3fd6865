//! Blob storage commands
//!
//! List, upload, download and delete blobs in the configured container, and compare
//! or synchronise it with the local `storage.sync_root` folder.

use super::load_or_report;
use crate::adapters::storage::{create_blob_store, upload_file, BlobStore};
use crate::config::StorageConfig;
use crate::core::sync::{
    synchronise, AssumeYes, Confirm, FileSyncInfo, StdinConfirm, SyncDirection, SyncOptions,
};
use crate::domain::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the blobs command
#[derive(Args, Debug)]
pub struct BlobsArgs {
    #[command(subcommand)]
    pub command: BlobCommand,
}

/// Blob operations
#[derive(Subcommand, Debug)]
pub enum BlobCommand {
    /// List every blob in the container
    List,

    /// Upload a local file, named by its path relative to the sync root
    Upload {
        /// File to upload
        file: PathBuf,
    },

    /// Download a blob into the sync root
    Download {
        /// Blob name
        blob: String,
    },

    /// Delete a blob
    Delete {
        /// Blob name
        blob: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show which files are only local, only in blob storage, or in both
    Diff,

    /// Copy differences between the sync root and the container
    Sync(SyncArgs),
}

/// Arguments for `blobs sync`
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Direction to copy files in
    #[arg(long, value_enum)]
    pub direction: SyncDirection,

    /// Leave files present on both sides alone
    #[arg(long)]
    pub no_update_existing: bool,

    /// Do not copy files missing from the destination
    #[arg(long)]
    pub no_add_missing: bool,

    /// Skip the per-file confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            update_existing: !self.no_update_existing,
            add_missing: !self.no_add_missing,
            confirm: !self.yes,
            overwrite: true,
        }
    }
}

impl BlobsArgs {
    /// Execute the blobs command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let storage = match config.require_storage() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };
        let store = match create_blob_store(storage) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to initialize blob storage: {e}");
                return Ok(e.exit_code());
            }
        };

        match self.run(store.as_ref(), storage).await {
            Ok(code) => Ok(code),
            Err(e) => {
                crate::log_error_with_context!(&e, "Blob command failed");
                eprintln!("❌ {e}");
                Ok(e.exit_code())
            }
        }
    }

    /// Runs the subcommand against an already created store
    pub async fn run(&self, store: &dyn BlobStore, storage: &StorageConfig) -> Result<i32> {
        let root = &storage.sync_root;

        match &self.command {
            BlobCommand::List => {
                let blobs = store.list_blobs().await?;
                println!("📦 {} ({} blob(s))", store.location(), blobs.len());
                for blob in blobs {
                    println!("  {blob}");
                }
            }
            BlobCommand::Upload { file } => {
                let blob = upload_file(store, file, root).await?;
                println!("✅ Uploaded {} as {blob}", file.display());
            }
            BlobCommand::Download { blob } => {
                let dest = root.join(blob);
                store.download(blob, &dest).await?;
                crate::log_blob_transfer!("download", blob);
                println!("✅ Downloaded {blob} to {}", dest.display());
            }
            BlobCommand::Delete { blob, yes } => {
                let confirmed = *yes
                    || StdinConfirm.confirm(&format!(
                        "Are you sure you want to delete '{blob}' from {}?",
                        store.location()
                    ));
                if !confirmed {
                    println!("Delete cancelled.");
                    return Ok(0);
                }
                store.delete(blob).await?;
                tracing::info!(blob = %blob, "Deleted blob");
                println!("🗑️  Deleted {blob}");
            }
            BlobCommand::Diff => {
                let info = FileSyncInfo::from_store(store, root, &storage.extensions).await?;
                for message in info.diff_messages() {
                    println!("{message}");
                    println!();
                }
            }
            BlobCommand::Sync(args) => {
                let options = args.options();
                let mut confirm: Box<dyn Confirm> = if options.confirm {
                    Box::new(StdinConfirm)
                } else {
                    Box::new(AssumeYes)
                };
                let summary = synchronise(
                    store,
                    root,
                    &storage.extensions,
                    args.direction,
                    &options,
                    confirm.as_mut(),
                )
                .await?;
                println!(
                    "✅ Sync ({}) complete: {} transferred, {} skipped",
                    args.direction, summary.transferred, summary.skipped
                );
            }
        }

        Ok(0)
    }
}
