//! Pseudonymisation engine
//!
//! Rewrites the identifier columns of a [`DataSource`] with surrogate ids taken from
//! the shared [`IdentifierMappingStore`].
//!
//! # Policy
//!
//! Every column whose name looks like an identifier must be accounted for, either
//! mapped to an entity in `columns_to_entities` or listed in the whitelist, and every
//! mapped column must exist in the table. A source breaking either rule is rejected
//! before anything is touched.
//!
//! # Atomicity
//!
//! The source is only marked as pseudonymised once every mapped column has been
//! rewritten. If a later column fails (e.g. a non-integer identifier), earlier
//! columns of the table and the store's mappings for their entities keep their new
//! values; the source stays unmarked and the run should be restarted from fresh data.

use super::classifier::{ColumnClassifier, IdSuffixClassifier};
use super::mapping::{coerce_identifier, IdentifierMappingStore};
use crate::core::extract::DataSource;
use crate::domain::{CellValue, EntityName, PseudonymisationError};
use serde::Serialize;
use std::collections::BTreeSet;

type PseudonymisationResult<T> = std::result::Result<T, PseudonymisationError>;

/// Outcome of pseudonymising one data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PseudonymisationReport {
    pub source: String,
    pub columns: Vec<ColumnOutcome>,
}

impl PseudonymisationReport {
    /// Cells that became missing because their value had no surrogate
    pub fn total_unmapped(&self) -> usize {
        self.columns.iter().map(|c| c.unmapped).sum()
    }
}

/// Outcome for one rewritten column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOutcome {
    pub column: String,
    pub entity: String,
    /// Distinct real ids seen for the first time
    pub new_ids: usize,
    /// Size of the entity mapping after this column
    pub mapping_size: usize,
    /// Non-missing cells without a surrogate, written as missing
    pub unmapped: usize,
}

/// Applies the identifier policy and rewrites mapped columns
pub struct PseudonymisationEngine {
    classifier: Box<dyn ColumnClassifier>,
}

impl Default for PseudonymisationEngine {
    fn default() -> Self {
        Self::with_classifier(IdSuffixClassifier)
    }
}

impl PseudonymisationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom identifier-column classifier
    pub fn with_classifier(classifier: impl ColumnClassifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
        }
    }

    /// Identifier-shaped columns of the source that are neither mapped nor whitelisted
    ///
    /// An empty set means the source satisfies the identifier policy.
    pub fn unhandled_columns(&self, source: &DataSource) -> BTreeSet<String> {
        let mapping = source.columns_to_entities();
        let whitelist = source.whitelist();

        source
            .table()
            .column_names()
            .filter(|name| self.classifier.is_identifier(name))
            .filter(|name| !mapping.contains_column(name) && !whitelist.contains(*name))
            .map(str::to_string)
            .collect()
    }

    /// Columns declared in `columns_to_entities` that the source's table does not have
    pub fn missing_mapped_columns(&self, source: &DataSource) -> Vec<String> {
        source
            .columns_to_entities()
            .columns()
            .filter(|column| source.table().column(column).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Pseudonymises a data source in place
    ///
    /// Columns are processed in the order of the source's `columns_to_entities`. For each
    /// one the entity's mapping is extended with the column's values and stored back,
    /// then every cell is replaced by its surrogate. Missing cells stay missing.
    ///
    /// # Errors
    ///
    /// - `AlreadyProcessed` if the source was pseudonymised before
    /// - `UnhandledIdentifierColumns` listing every unaccounted identifier column
    /// - `MappedColumnsMissing` listing every declared column absent from the table
    /// - `TypeConversion` if a real id cannot be coerced to an integer
    /// - `MappingCollision` if an entity mapping stops being injective
    /// - `SurrogateOverflow` if an entity has run out of surrogate ids
    pub fn pseudonymise(
        &self,
        store: &mut IdentifierMappingStore,
        source: &mut DataSource,
    ) -> PseudonymisationResult<PseudonymisationReport> {
        let source_name = source.name().to_string();

        if source.is_pseudonymised() {
            return Err(PseudonymisationError::AlreadyProcessed { source_name });
        }

        let missed = self.unhandled_columns(source);
        if !missed.is_empty() {
            return Err(PseudonymisationError::UnhandledIdentifierColumns {
                source_name,
                columns: missed.into_iter().collect(),
            });
        }

        let absent = self.missing_mapped_columns(source);
        if !absent.is_empty() {
            return Err(PseudonymisationError::MappedColumnsMissing {
                source_name,
                columns: absent,
            });
        }

        let assignments: Vec<(String, EntityName)> = source
            .columns_to_entities()
            .iter()
            .map(|(column, entity)| (column.to_string(), entity.clone()))
            .collect();

        let mut outcomes = Vec::with_capacity(assignments.len());
        for (column, entity) in &assignments {
            let outcome = self
                .pseudonymise_column(store, source, column, entity)
                .map_err(|e| e.with_column(column))?;
            outcomes.push(outcome);
        }

        source.mark_pseudonymised();

        let report = PseudonymisationReport {
            source: source_name,
            columns: outcomes,
        };
        crate::log_pseudonymisation_complete!(
            report.source,
            report.columns.len(),
            report.total_unmapped()
        );
        Ok(report)
    }

    fn pseudonymise_column(
        &self,
        store: &mut IdentifierMappingStore,
        source: &mut DataSource,
        column: &str,
        entity: &EntityName,
    ) -> PseudonymisationResult<ColumnOutcome> {
        let source_name = source.name().to_string();
        let Some(target) = source.table_mut().column_mut(column) else {
            return Err(PseudonymisationError::MappedColumnsMissing {
                source_name,
                columns: vec![column.to_string()],
            });
        };

        let before = store.mapping(entity).map_or(0, |m| m.len());
        let mapping = store.extend_mapping(entity, target.values())?;

        // Every non-missing value coerced during extension, so a cell without a
        // surrogate here is written as missing rather than rejected
        let mut unmapped = 0;
        target.map_values(|value| {
            let surrogate = coerce_identifier(entity, value)
                .ok()
                .flatten()
                .and_then(|real_id| mapping.get(real_id));
            if surrogate.is_none() && !value.is_null() {
                unmapped += 1;
            }
            surrogate.map_or(CellValue::Null, CellValue::Int)
        });

        let outcome = ColumnOutcome {
            column: column.to_string(),
            entity: entity.to_string(),
            new_ids: mapping.len() - before,
            mapping_size: mapping.len(),
            unmapped,
        };

        tracing::debug!(
            column,
            entity = %entity,
            new_ids = outcome.new_ids,
            mapping_size = outcome.mapping_size,
            "Pseudonymised column"
        );
        Ok(outcome)
    }
}
