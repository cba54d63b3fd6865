//! Data extracts
//!
//! A [`DataExtract`] is a named, timestamped bundle of data sources sharing one
//! identifier-mapping store. It owns the on-disk layout: exported CSVs and the
//! markdown report go to the PUBLIC folder, the full state (including the real
//! identifiers' mappings) to the PRIVATE file.

use super::archive::zip_folder;
use super::layout::ExtractLayout;
use super::source::DataSource;
use crate::adapters::storage::BlobStore;
use crate::core::pseudonymise::{
    IdentifierMappingStore, PseudonymisationEngine, PseudonymisationReport,
};
use crate::core::report::{MarkdownReport, TocEntry};
use crate::domain::{DataSourceName, DextractError, ExtractId, PseudonymisationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Named, timestamped collection of data sources
#[derive(Debug, Serialize, Deserialize)]
pub struct DataExtract {
    name: String,
    description: String,
    id: ExtractId,
    created_at: DateTime<Utc>,
    container: PathBuf,
    sources: BTreeMap<DataSourceName, DataSource>,
    mappings: IdentifierMappingStore,
}

impl DataExtract {
    /// Creates an extract under `container` and its folder layout
    ///
    /// Stamps a fresh random id and the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or one containing a path
    /// separator, or an I/O error if the folders cannot be created.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        container: impl Into<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(DextractError::Validation(format!(
                "Invalid data extract name '{}'",
                name
            )));
        }

        let extract = Self {
            name,
            description: description.into(),
            id: ExtractId::generate(),
            created_at: Utc::now(),
            container: container.into(),
            sources: BTreeMap::new(),
            mappings: IdentifierMappingStore::new(),
        };
        extract.layout().create_dirs()?;

        tracing::info!(
            extract = %extract.name,
            id = %extract.id,
            path = %extract.layout().root().display(),
            "Created data extract"
        );
        Ok(extract)
    }

    /// Seeds the identifier mappings, typically from a previous run's snapshot
    pub fn with_mappings(mut self, mappings: IdentifierMappingStore) -> Self {
        self.mappings = mappings;
        self
    }

    /// Restores an extract from its PRIVATE file
    ///
    /// The container is taken from the file's location, so an extract folder that
    /// was moved as a whole still resolves its paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DextractError::Io(format!(
                "Failed to read data extract {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut extract: Self = serde_json::from_str(&contents)?;

        if let Some(container) = path.parent().and_then(Path::parent) {
            extract.container = container.to_path_buf();
        }

        tracing::info!(
            extract = %extract.name,
            sources = extract.sources.len(),
            "Loaded data extract"
        );
        Ok(extract)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn id(&self) -> &ExtractId {
        &self.id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn layout(&self) -> ExtractLayout {
        ExtractLayout::new(&self.container, &self.name, &self.created_at, &self.id)
    }

    pub fn mappings(&self) -> &IdentifierMappingStore {
        &self.mappings
    }

    /// Registers a source, returning the one it replaces
    pub fn add_data_source(&mut self, mut source: DataSource) -> Option<DataSource> {
        source.set_extract_id(self.id.clone());
        let replaced = self.sources.insert(source.name().clone(), source);
        if let Some(old) = &replaced {
            tracing::warn!(source = %old.name(), "Replaced existing data source");
        }
        replaced
    }

    /// Returns the named source, building and registering it first if absent
    pub fn get_or_insert_with<F>(&mut self, name: &DataSourceName, load: F) -> Result<&mut DataSource>
    where
        F: FnOnce(DataSourceName) -> Result<DataSource>,
    {
        if !self.sources.contains_key(name) {
            let source = load(name.clone())?;
            if source.name() != name {
                return Err(DextractError::Validation(format!(
                    "Loader for '{}' returned data source '{}'",
                    name,
                    source.name()
                )));
            }
            self.add_data_source(source);
        }
        self.sources
            .get_mut(name)
            .ok_or_else(|| DextractError::Other(format!("Data source '{}' vanished", name)))
    }

    pub fn data_source(&self, name: &DataSourceName) -> Option<&DataSource> {
        self.sources.get(name)
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &DataSource> {
        self.sources.values()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &DataSourceName> {
        self.sources.keys()
    }

    /// Pseudonymises a registered source with the default identifier convention
    pub fn pseudonymise(
        &mut self,
        name: &DataSourceName,
    ) -> std::result::Result<PseudonymisationReport, PseudonymisationError> {
        self.pseudonymise_with(&PseudonymisationEngine::default(), name)
    }

    /// Pseudonymises a registered source using the extract's shared mappings
    ///
    /// # Errors
    ///
    /// `NotFound` if no source has that name, otherwise whatever the engine reports.
    pub fn pseudonymise_with(
        &mut self,
        engine: &PseudonymisationEngine,
        name: &DataSourceName,
    ) -> std::result::Result<PseudonymisationReport, PseudonymisationError> {
        let source = self
            .sources
            .get_mut(name)
            .ok_or_else(|| PseudonymisationError::NotFound {
                source_name: name.to_string(),
            })?;
        engine.pseudonymise(&mut self.mappings, source)
    }

    /// Exports the named sources, or all of them, to the PUBLIC data folder
    ///
    /// Every name is checked before anything is written.
    pub fn export(&self, names: Option<&[DataSourceName]>) -> Result<Vec<PathBuf>> {
        let selected: Vec<&DataSource> = match names {
            None => self.sources.values().collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.sources
                        .get(name)
                        .ok_or_else(|| PseudonymisationError::NotFound {
                            source_name: name.to_string(),
                        })
                })
                .collect::<std::result::Result<_, _>>()?,
        };

        let data_dir = self.layout().data_dir();
        fs::create_dir_all(&data_dir)?;
        selected
            .into_iter()
            .map(|source| source.export(&data_dir))
            .collect()
    }

    /// Writes `docs/README.md` describing the extract and every source
    pub fn generate_markdown_report(&self) -> Result<PathBuf> {
        let mut report = MarkdownReport::new(format!("Data analysis for {}", self.name));

        let anchors = report.add_table_of_contents(&[
            TocEntry::new("Introduction"),
            TocEntry::new("Data Sources")
                .with_children(self.sources.keys().map(|n| TocEntry::new(n.as_str()))),
        ])?;

        report.add_definitions(&[
            ("Name".to_string(), self.name.clone()),
            ("Id".to_string(), self.id.to_string()),
            ("Datetime".to_string(), self.formatted_datetime()),
        ]);

        report.add_heading("Introduction", 1, anchors.get("Introduction").map(String::as_str));
        report.add_markdown(&self.description);

        report.add_heading("Data Sources", 1, anchors.get("Data Sources").map(String::as_str));
        for source in self.sources.values() {
            let anchor = anchors
                .get(source.name().as_str())
                .map_or(source.name().as_str(), String::as_str);
            source.add_to_report(&mut report, anchor);
        }

        let path = self.layout().report_file();
        report.save(&path)?;
        tracing::info!(path = %path.display(), "Generated markdown report");
        Ok(path)
    }

    /// Writes the full extract state to the PRIVATE file
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.layout().private_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "Saved data extract");
        Ok(path)
    }

    /// Zips the PUBLIC folder and uploads the archive
    ///
    /// The blob is named `<name-date-id>/<name-date-id>-PUBLIC.zip`. Returns the blob name.
    pub async fn archive(&self, store: &dyn BlobStore) -> Result<String> {
        let layout = self.layout();
        let archive = layout.archive_file();
        let files = zip_folder(&layout.public_dir(), &archive)?;

        let blob_name = format!("{}/{}", layout.name_date_id(), layout.archive_file_name());
        store.upload(&archive, &blob_name, true).await?;

        tracing::info!(
            extract = %self.name,
            files,
            blob = %blob_name,
            "Archived data extract"
        );
        Ok(blob_name)
    }

    fn formatted_datetime(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string()
    }
}

impl fmt::Display for DataExtract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:\t\t{}", self.name)?;
        writeln!(f, "Id:\t\t{}", self.id)?;
        writeln!(f, "Datetime:\t{}", self.formatted_datetime())?;
        write!(f, "Description:\t{}", self.description)
    }
}
