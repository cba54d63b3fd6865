//! Extract runner - builds a configured extract end to end
//!
//! Loads every `[[sources]]` entry, pseudonymises them in declaration order against
//! one shared mapping store, then exports, reports, saves and optionally archives.

use super::data_extract::DataExtract;
use super::source::DataSource;
use crate::adapters::azure::{ClientSecretTokenSource, TableStorageClient};
use crate::adapters::sql::SqlClient;
use crate::adapters::storage::BlobStore;
use crate::config::{DextractConfig, SourceConfig, SourceKind, StorageBackend};
use crate::core::pseudonymise::{
    IdentifierMappingStore, PseudonymisationEngine, PseudonymisationReport,
};
use crate::domain::{DataSourceName, DextractError, EntityName, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to do besides pseudonymising and exporting
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Mapping snapshot to use instead of `extract.mappings`
    pub mappings: Option<PathBuf>,
    /// Upload the zipped PUBLIC folder
    pub archive: bool,
    /// Skip the markdown report
    pub skip_report: bool,
}

/// Outcome of [`ExtractRunner::run`]
#[derive(Debug)]
pub struct RunSummary {
    pub extract: DataExtract,
    pub reports: Vec<PseudonymisationReport>,
    pub exported: Vec<PathBuf>,
    pub report_file: Option<PathBuf>,
    pub private_file: PathBuf,
    pub mappings_file: Option<PathBuf>,
    pub archive_blob: Option<String>,
    pub duration: Duration,
}

/// Identifier policy problems of one source, as found by [`ExtractRunner::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCheck {
    pub source: String,
    pub rows: usize,
    pub unhandled_columns: BTreeSet<String>,
    pub missing_mapped_columns: Vec<String>,
}

impl SourceCheck {
    pub fn is_ok(&self) -> bool {
        self.unhandled_columns.is_empty() && self.missing_mapped_columns.is_empty()
    }
}

/// Builds extracts from configuration
pub struct ExtractRunner {
    config: DextractConfig,
    engine: PseudonymisationEngine,
    sql: Option<SqlClient>,
    tables: Option<TableStorageClient>,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl ExtractRunner {
    /// Creates the clients the configured sources need
    ///
    /// # Errors
    ///
    /// Returns an error if a SQL or table storage client cannot be created.
    pub fn new(config: DextractConfig) -> Result<Self> {
        let sql = match config.sql {
            Some(ref sql) if config.sources.iter().any(|s| s.kind == SourceKind::Sql) => {
                Some(SqlClient::new(sql)?)
            }
            _ => None,
        };

        let needs_tables = config
            .sources
            .iter()
            .any(|s| s.kind == SourceKind::TableStorage);
        let tables = match config.storage {
            Some(ref storage) if needs_tables && storage.backend == StorageBackend::Azure => {
                let tokens = ClientSecretTokenSource::from_config(storage)?;
                Some(TableStorageClient::from_config(storage, Arc::new(tokens))?)
            }
            _ => None,
        };

        Ok(Self {
            config,
            engine: PseudonymisationEngine::default(),
            sql,
            tables,
            blob_store: None,
        })
    }

    /// Sets the blob store archives are uploaded to
    pub fn with_blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    /// Replaces the default pseudonymisation engine
    pub fn with_engine(mut self, engine: PseudonymisationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &DextractConfig {
        &self.config
    }

    /// Builds the extract
    ///
    /// Sources are loaded first so merges see raw parents, then pseudonymised in
    /// declaration order. The mapping snapshot is read before and written after.
    ///
    /// # Errors
    ///
    /// Stops at the first failing source; nothing is exported in that case.
    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mappings_file = options
            .mappings
            .clone()
            .or_else(|| self.config.extract.mappings.clone());

        let store = match mappings_file {
            Some(ref path) if path.exists() => IdentifierMappingStore::load(path)?,
            Some(ref path) => {
                tracing::info!(path = %path.display(), "No mapping snapshot yet, starting empty");
                IdentifierMappingStore::new()
            }
            None => IdentifierMappingStore::new(),
        };

        let mut extract = DataExtract::new(
            &self.config.extract.name,
            &self.config.extract.description,
            self.config.extract.container.clone(),
        )?
        .with_mappings(store);

        for source_config in &self.config.sources {
            let source = self.load_source(source_config, &extract).await?;
            extract.add_data_source(source);
        }

        let mut reports = Vec::with_capacity(self.config.sources.len());
        for source_config in &self.config.sources {
            let name = source_name(source_config)?;
            reports.push(extract.pseudonymise_with(&self.engine, &name)?);
        }

        let exported = extract.export(None)?;
        let report_file = if options.skip_report {
            None
        } else {
            Some(extract.generate_markdown_report()?)
        };
        let private_file = extract.save()?;

        if let Some(ref path) = mappings_file {
            extract.mappings().save(path)?;
        }

        let archive_blob = if options.archive {
            let store = self.blob_store.as_ref().ok_or_else(|| {
                DextractError::Configuration(
                    "Archiving requires a [storage] section".to_string(),
                )
            })?;
            store.ensure_container().await?;
            Some(extract.archive(store.as_ref()).await?)
        } else {
            None
        };

        let duration = start_time.elapsed();
        tracing::info!(
            extract = %extract.name(),
            sources = reports.len(),
            duration_ms = duration.as_millis() as u64,
            "Data extract complete"
        );

        Ok(RunSummary {
            extract,
            reports,
            exported,
            report_file,
            private_file,
            mappings_file,
            archive_blob,
            duration,
        })
    }

    /// Loads every source and reports identifier columns that are neither mapped nor
    /// whitelisted, without pseudonymising or writing anything
    pub async fn check(&self) -> Result<Vec<SourceCheck>> {
        let mut loaded: Vec<DataSource> = Vec::with_capacity(self.config.sources.len());
        let mut checks = Vec::with_capacity(self.config.sources.len());

        for source_config in &self.config.sources {
            let source = self.load_source_from(source_config, &loaded).await?;

            checks.push(SourceCheck {
                source: source_config.name.clone(),
                rows: source.table().n_rows(),
                unhandled_columns: self.engine.unhandled_columns(&source),
                missing_mapped_columns: self.engine.missing_mapped_columns(&source),
            });
            loaded.push(source);
        }

        Ok(checks)
    }

    async fn load_source(&self, config: &SourceConfig, extract: &DataExtract) -> Result<DataSource> {
        let parents = self.parents(config, move |name| extract.data_source(name))?;
        self.build_source(config, &parents).await
    }

    async fn load_source_from(&self, config: &SourceConfig, loaded: &[DataSource]) -> Result<DataSource> {
        let parents = self.parents(config, move |name| loaded.iter().find(|s| s.name() == name))?;
        self.build_source(config, &parents).await
    }

    fn parents<'a, F>(&self, config: &SourceConfig, lookup: F) -> Result<Vec<&'a DataSource>>
    where
        F: Fn(&DataSourceName) -> Option<&'a DataSource>,
    {
        config
            .parents
            .iter()
            .map(|parent| {
                let name = DataSourceName::new(parent.as_str()).map_err(DextractError::Validation)?;
                lookup(&name).ok_or_else(|| {
                    DextractError::Configuration(format!(
                        "sources.{}: parent '{}' has not been loaded",
                        config.name, parent
                    ))
                })
            })
            .collect()
    }

    async fn build_source(&self, config: &SourceConfig, parents: &[&DataSource]) -> Result<DataSource> {
        let name = source_name(config)?;
        tracing::debug!(source = %name, kind = %config.kind, "Loading data source");

        let source = match config.kind {
            SourceKind::Sql => {
                let client = self.sql.as_ref().ok_or_else(|| {
                    DextractError::Configuration("kind 'sql' requires a [sql] section".to_string())
                })?;
                match (&config.query, &config.path) {
                    (Some(query), _) => DataSource::from_sql(name, client, query).await?,
                    (None, Some(path)) => DataSource::from_sql_file(name, client, path).await?,
                    (None, None) => {
                        return Err(DextractError::Configuration(format!(
                            "sources.{}: kind 'sql' needs 'query' or 'path'",
                            config.name
                        )))
                    }
                }
            }
            SourceKind::Csv => DataSource::from_csv(name, required_path(config)?)?,
            SourceKind::Spreadsheet => {
                DataSource::from_spreadsheet(name, required_path(config)?, config.sheet.as_deref())?
            }
            SourceKind::TableStorage => {
                let client = self.tables.as_ref().ok_or_else(|| {
                    DextractError::Configuration(
                        "kind 'table_storage' requires [storage] with backend = 'azure'".to_string(),
                    )
                })?;
                let table = config.table.as_deref().ok_or_else(|| {
                    DextractError::Configuration(format!(
                        "sources.{}: kind 'table_storage' requires 'table'",
                        config.name
                    ))
                })?;
                DataSource::from_table_storage(name, client, table, config.filter.as_deref()).await?
            }
            SourceKind::Merge => DataSource::from_merge(name, parents, DataSource::concat_parents)?,
        };

        let mut source = source
            .with_columns_to_entities(config.columns_to_entities.clone())
            .with_whitelist(config.whitelist.iter().cloned())
            .with_glossary(config.glossary.clone());
        if let Some(ref description) = config.description {
            source = source.with_description(description);
        }
        Ok(source)
    }
}

fn source_name(config: &SourceConfig) -> Result<DataSourceName> {
    DataSourceName::new(config.name.as_str()).map_err(DextractError::Validation)
}

fn required_path(config: &SourceConfig) -> Result<&PathBuf> {
    config.path.as_ref().ok_or_else(|| {
        DextractError::Configuration(format!(
            "sources.{}: kind '{}' requires 'path'",
            config.name, config.kind
        ))
    })
}

/// Entities a configuration refers to, in first-mention order
pub fn configured_entities(config: &DextractConfig) -> Vec<EntityName> {
    let mut entities: Vec<EntityName> = Vec::new();
    for source in &config.sources {
        for (_, entity) in source.columns_to_entities.iter() {
            if !entities.contains(entity) {
                entities.push(entity.clone());
            }
        }
    }
    entities
}
