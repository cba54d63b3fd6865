//! Data sources
//!
//! A [`DataSource`] is one table plus the bookkeeping the pseudonymisation engine
//! needs: which columns map to which entity, which identifier-shaped columns are
//! exempt, and whether the table has already been rewritten.

use crate::adapters::azure::table::TableStorageClient;
use crate::adapters::file::{csv as csv_file, spreadsheet};
use crate::adapters::sql::SqlClient;
use crate::core::report::statistics::{summary_statistics, ColumnStatistics};
use crate::core::report::MarkdownReport;
use crate::domain::{
    DataSourceName, DextractError, EntityName, ExtractId, PseudonymisationError, Result, Table,
};
use rand::seq::index::sample;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Column name to entity name, in declaration order
///
/// Deserialises from a map (TOML table or JSON object) without losing the order the
/// entries were written in, since pseudonymisation processes columns in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping(Vec<(String, EntityName)>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entity for a column
    ///
    /// A replaced column keeps its original position.
    pub fn insert(&mut self, column: impl Into<String>, entity: EntityName) {
        let column = column.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = entity,
            None => self.0.push((column, entity)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&EntityName> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, e)| e)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityName)> {
        self.0.iter().map(|(c, e)| (c.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<C: Into<String>> FromIterator<(C, EntityName)> for ColumnMapping {
    fn from_iter<T: IntoIterator<Item = (C, EntityName)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (column, entity) in iter {
            mapping.insert(column, entity);
        }
        mapping
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, entity) in &self.0 {
            map.serialize_entry(column, entity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ColumnMappingVisitor;

        impl<'de> Visitor<'de> for ColumnMappingVisitor {
            type Value = ColumnMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to entity names")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut mapping = ColumnMapping::new();
                while let Some((column, entity)) = access.next_entry::<String, EntityName>()? {
                    mapping.insert(column, entity);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(ColumnMappingVisitor)
    }
}

/// One table of an extract together with its pseudonymisation configuration and state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    name: DataSourceName,
    description: Option<String>,
    table: Table,
    columns_to_entities: ColumnMapping,
    whitelist: BTreeSet<String>,
    is_pseudonymised: bool,
    glossary: BTreeMap<String, String>,
    parents: Vec<DataSourceName>,
    extract_id: Option<ExtractId>,
}

impl DataSource {
    /// Creates a raw (not yet pseudonymised) data source
    pub fn new(name: DataSourceName, table: Table) -> Self {
        Self {
            name,
            description: None,
            table,
            columns_to_entities: ColumnMapping::new(),
            whitelist: BTreeSet::new(),
            is_pseudonymised: false,
            glossary: BTreeMap::new(),
            parents: Vec::new(),
            extract_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_columns_to_entities(mut self, mapping: ColumnMapping) -> Self {
        self.columns_to_entities = mapping;
        self
    }

    pub fn with_whitelist<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_glossary(mut self, glossary: BTreeMap<String, String>) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn with_parents(mut self, parents: Vec<DataSourceName>) -> Self {
        self.parents = parents;
        self
    }

    /// Builds a data source from other data sources
    ///
    /// `merge` receives the parents in the given order; their names are recorded as
    /// lineage.
    pub fn from_merge<F>(name: DataSourceName, parents: &[&DataSource], merge: F) -> Result<Self>
    where
        F: FnOnce(&[&DataSource]) -> Result<Table>,
    {
        let table = merge(parents)?;
        let lineage = parents.iter().map(|p| p.name.clone()).collect();
        Ok(Self::new(name, table).with_parents(lineage))
    }

    /// Stacks the parents' rows (union of columns, missing cells null)
    pub fn concat_parents(parents: &[&DataSource]) -> Result<Table> {
        let tables: Vec<&Table> = parents.iter().map(|p| &p.table).collect();
        Ok(Table::concat(&tables))
    }

    /// Loads the result of a SQL query
    pub async fn from_sql(name: DataSourceName, client: &SqlClient, sql: &str) -> Result<Self> {
        let table = client.query_table(sql).await?;
        crate::log_source_loaded!(name, "sql", table.n_rows(), table.n_columns());
        Ok(Self::new(name, table))
    }

    /// Loads the result of the SQL query stored in a file
    pub async fn from_sql_file(
        name: DataSourceName,
        client: &SqlClient,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let sql = fs::read_to_string(path).map_err(|e| {
            DextractError::Source(format!("Failed to read SQL file {}: {}", path.display(), e))
        })?;
        Self::from_sql(name, client, &sql).await
    }

    /// Loads the entities of an Azure Table Storage query
    pub async fn from_table_storage(
        name: DataSourceName,
        client: &TableStorageClient,
        table_name: &str,
        filter: Option<&str>,
    ) -> Result<Self> {
        let table = client.query_entities(table_name, filter).await?;
        crate::log_source_loaded!(name, "table_storage", table.n_rows(), table.n_columns());
        Ok(Self::new(name, table))
    }

    /// Reads a CSV file with a header row
    pub fn from_csv(name: DataSourceName, path: impl AsRef<Path>) -> Result<Self> {
        let table = csv_file::read_table(path)?;
        crate::log_source_loaded!(name, "csv", table.n_rows(), table.n_columns());
        Ok(Self::new(name, table))
    }

    /// Reads one sheet of a workbook (xlsx, xls, ods)
    pub fn from_spreadsheet(
        name: DataSourceName,
        path: impl AsRef<Path>,
        sheet: Option<&str>,
    ) -> Result<Self> {
        let table = spreadsheet::read_table(path, sheet)?;
        crate::log_source_loaded!(name, "spreadsheet", table.n_rows(), table.n_columns());
        Ok(Self::new(name, table))
    }

    pub fn name(&self) -> &DataSourceName {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn columns_to_entities(&self) -> &ColumnMapping {
        &self.columns_to_entities
    }

    pub fn whitelist(&self) -> &BTreeSet<String> {
        &self.whitelist
    }

    pub fn is_pseudonymised(&self) -> bool {
        self.is_pseudonymised
    }

    /// One-way transition, there is no way back to raw
    pub(crate) fn mark_pseudonymised(&mut self) {
        self.is_pseudonymised = true;
    }

    pub fn glossary(&self) -> &BTreeMap<String, String> {
        &self.glossary
    }

    pub fn parents(&self) -> &[DataSourceName] {
        &self.parents
    }

    /// Id of the extract this source is registered with
    pub fn extract_id(&self) -> Option<&ExtractId> {
        self.extract_id.as_ref()
    }

    pub(crate) fn set_extract_id(&mut self, id: ExtractId) {
        self.extract_id = Some(id);
    }

    /// Merges glossary entries, overwriting existing definitions
    pub fn update_glossary<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.glossary
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Writes the table to `<dir>/<name>.csv`
    ///
    /// # Errors
    ///
    /// Returns `NotPseudonymised` if the source has not been pseudonymised, or an
    /// I/O error if the file cannot be written.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        if !self.is_pseudonymised {
            return Err(PseudonymisationError::NotPseudonymised {
                source_name: self.name.to_string(),
            }
            .into());
        }

        let path = dir.as_ref().join(format!("{}.csv", self.name));
        csv_file::write_table(&self.table, &path)?;

        tracing::info!(
            source = %self.name,
            rows = self.table.n_rows(),
            path = %path.display(),
            "Exported data source"
        );
        Ok(path)
    }

    /// Per-column summary statistics
    pub fn summary_statistics(&self) -> Vec<ColumnStatistics> {
        summary_statistics(&self.table)
    }

    /// Appends this source's section to a report
    ///
    /// The section has a level-3 heading carrying `anchor`, the description, then
    /// "Glossary", "Statistics" and "Sample" subsections. The sample is up to three
    /// random rows.
    pub fn add_to_report(&self, report: &mut MarkdownReport, anchor: &str) {
        tracing::debug!(source = %self.name, "Adding data source to report");

        report.add_heading(self.name.as_str(), 3, Some(anchor));

        if let Some(description) = &self.description {
            report.add_markdown(description);
        }

        report.add_heading("Glossary", 4, None);
        if !self.glossary.is_empty() {
            let definitions: Vec<(String, String)> = self
                .glossary
                .iter()
                .map(|(k, v)| (k.clone(), v.replace("\n\n", "<br><br>")))
                .collect();
            report.add_definitions(&definitions);
        }

        report.add_heading("Statistics", 4, None);
        report.add_table_data(&ColumnStatistics::to_table(&self.summary_statistics()));

        report.add_heading("Sample", 4, None);
        let n_rows = self.table.n_rows();
        if n_rows > 0 {
            let mut rng = rand::thread_rng();
            let mut rows = sample(&mut rng, n_rows, n_rows.min(3)).into_vec();
            rows.sort_unstable();
            report.add_table_data(&self.table.select_rows(&rows));
        }
    }
}
