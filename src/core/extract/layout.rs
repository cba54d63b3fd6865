//! On-disk layout of a data extract
//!
//! ```text
//! <container>/
//!     <name>-<YYYYmmDDHHMM>-<id>/
//!         <name>-<YYYYmmDDHHMM>-<id>-PRIVATE.json
//!         <name>-<YYYYmmDDHHMM>-<id>-PUBLIC/
//!             data/<source>.csv
//!             img/
//!             docs/README.md
//!             docs/img/
//!         <name>-<YYYYmmDDHHMM>-<id>-PUBLIC.zip
//! ```
//!
//! Only the PUBLIC folder is shared. The PRIVATE file holds the real-to-surrogate
//! mappings and must stay with the data owner.

use crate::domain::{ExtractId, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths of one extract, derived from its name, creation time and id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractLayout {
    name_date_id: String,
    root: PathBuf,
}

impl ExtractLayout {
    pub fn new(container: &Path, name: &str, created_at: &DateTime<Utc>, id: &ExtractId) -> Self {
        let name_date_id = format!("{}-{}-{}", name, created_at.format("%Y%m%d%H%M"), id);
        let root = container.join(&name_date_id);
        Self { name_date_id, root }
    }

    /// `<name>-<YYYYmmDDHHMM>-<id>`
    pub fn name_date_id(&self) -> &str {
        &self.name_date_id
    }

    /// Folder holding everything belonging to the extract
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(format!("{}-PUBLIC", self.name_date_id))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.public_dir().join("data")
    }

    pub fn img_dir(&self) -> PathBuf {
        self.public_dir().join("img")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.public_dir().join("docs")
    }

    pub fn docs_img_dir(&self) -> PathBuf {
        self.docs_dir().join("img")
    }

    pub fn report_file(&self) -> PathBuf {
        self.docs_dir().join("README.md")
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}-PUBLIC.zip", self.name_date_id)
    }

    pub fn archive_file(&self) -> PathBuf {
        self.root.join(self.archive_file_name())
    }

    pub fn private_file(&self) -> PathBuf {
        self.root.join(format!("{}-PRIVATE.json", self.name_date_id))
    }

    /// Creates the data, img and docs/img folders
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.data_dir(), self.img_dir(), self.docs_img_dir()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
