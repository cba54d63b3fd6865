//! Identifier-mapping store
//!
//! Per-entity mapping from real integer identifiers to surrogate integer identifiers.
//! Surrogates for an entity are handed out as `max + 1, max + 2, ...` (starting at 0
//! for an entity without a mapping) in the order new real ids are first seen, and
//! an id that already has a surrogate keeps it forever. The store is cumulative: it
//! can be saved after a run and loaded as the starting point of the next one.

use crate::domain::errors::PseudonymisationError;
use crate::domain::ids::EntityName;
use crate::domain::table::CellValue;
use crate::domain::{DextractError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Real-to-surrogate mapping for a single entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMapping(BTreeMap<i64, i64>);

impl EntityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surrogate assigned to a real id
    pub fn get(&self, real_id: i64) -> Option<i64> {
        self.0.get(&real_id).copied()
    }

    pub fn contains(&self, real_id: i64) -> bool {
        self.0.contains_key(&real_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest surrogate handed out so far
    pub fn max_surrogate(&self) -> Option<i64> {
        self.0.values().copied().max()
    }

    /// (real, surrogate) pairs ordered by real id
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(real, surrogate)| (*real, *surrogate))
    }

    /// Number of distinct surrogate values
    pub fn distinct_surrogates(&self) -> usize {
        self.0.values().collect::<HashSet<_>>().len()
    }
}

impl FromIterator<(i64, i64)> for EntityMapping {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Coerces a real identifier cell to an integer
///
/// Integers pass through, floats must be whole and in range, text must parse as an
/// integer (surrounding whitespace allowed). Missing values yield `Ok(None)`.
///
/// # Errors
///
/// Returns `TypeConversion` for fractional floats, non-numeric text, booleans and dates.
pub fn coerce_identifier(
    entity: &EntityName,
    value: &CellValue,
) -> std::result::Result<Option<i64>, PseudonymisationError> {
    let conversion_error = || PseudonymisationError::TypeConversion {
        entity: entity.to_string(),
        column: None,
        value: value.to_string(),
    };

    match value {
        _ if value.is_null() => Ok(None),
        CellValue::Int(i) => Ok(Some(*i)),
        CellValue::Float(f) => {
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Some(*f as i64))
            } else {
                Err(conversion_error())
            }
        }
        CellValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| conversion_error()),
        _ => Err(conversion_error()),
    }
}

/// Extends an entity mapping with the real ids found in `real_ids`
///
/// Missing values are dropped, every other value is coerced to an integer, duplicates
/// are dropped keeping first occurrence, ids already in `existing` keep their
/// surrogate and the remaining ids receive `start, start + 1, ...` where `start` is
/// one past the largest existing surrogate (0 when `existing` is empty).
///
/// Coercion happens before de-duplication so that `5`, `5.0` and `"5"` are one id.
///
/// # Errors
///
/// - `TypeConversion` if a value cannot be represented as an integer; nothing is
///   assigned in that case
/// - `MappingCollision` if the result is not injective, which indicates a logic defect
///
/// # Examples
///
/// ```
/// use dextract::core::pseudonymise::mapping::{extend_mapping, EntityMapping};
/// use dextract::domain::{CellValue, EntityName};
///
/// let entity = EntityName::new("User").unwrap();
/// let ids = vec![CellValue::Int(5), CellValue::Int(5), CellValue::Null, CellValue::Int(7)];
///
/// let mapping = extend_mapping(&entity, &ids, EntityMapping::new()).unwrap();
/// assert_eq!(mapping.get(5), Some(0));
/// assert_eq!(mapping.get(7), Some(1));
/// assert_eq!(mapping.len(), 2);
/// ```
pub fn extend_mapping(
    entity: &EntityName,
    real_ids: &[CellValue],
    existing: EntityMapping,
) -> std::result::Result<EntityMapping, PseudonymisationError> {
    let mut seen = HashSet::new();
    let mut new_ids = Vec::new();

    for value in real_ids {
        let Some(real_id) = coerce_identifier(entity, value)? else {
            continue;
        };
        if seen.insert(real_id) && !existing.contains(real_id) {
            new_ids.push(real_id);
        }
    }

    let overflow = || PseudonymisationError::SurrogateOverflow {
        entity: entity.to_string(),
    };

    let mut next = match existing.max_surrogate() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    };

    let mut mapping = existing;
    for real_id in new_ids {
        let surrogate = next.ok_or_else(overflow)?;
        mapping.0.insert(real_id, surrogate);
        next = surrogate.checked_add(1);
    }

    let distinct = mapping.distinct_surrogates();
    if mapping.len() != distinct {
        return Err(PseudonymisationError::MappingCollision {
            entity: entity.to_string(),
            keys: mapping.len(),
            values: distinct,
        });
    }

    Ok(mapping)
}

/// Entity name to mapping, shared by every data source of an extract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierMappingStore {
    entities: BTreeMap<EntityName, EntityMapping>,
}

impl IdentifierMappingStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity's mapping, or a fresh empty one if the entity is unknown
    ///
    /// Read-only: an unknown entity is not added to the store.
    pub fn get_or_create_mapping_for_entity(&self, entity: &EntityName) -> EntityMapping {
        self.entities.get(entity).cloned().unwrap_or_default()
    }

    /// Borrowed view of an entity's mapping
    pub fn mapping(&self, entity: &EntityName) -> Option<&EntityMapping> {
        self.entities.get(entity)
    }

    /// Stores a mapping under `entity`, replacing any previous one
    pub fn insert(&mut self, entity: EntityName, mapping: EntityMapping) {
        self.entities.insert(entity, mapping);
    }

    /// Fetches, extends and stores the entity's mapping in one step
    ///
    /// On error the stored mapping is left unchanged.
    pub fn extend_mapping(
        &mut self,
        entity: &EntityName,
        real_ids: &[CellValue],
    ) -> std::result::Result<&EntityMapping, PseudonymisationError> {
        let existing = self.get_or_create_mapping_for_entity(entity);
        let extended = extend_mapping(entity, real_ids, existing)?;
        self.entities.insert(entity.clone(), extended);
        Ok(&self.entities[entity])
    }

    /// Entity names, sorted
    pub fn entities(&self) -> Vec<&EntityName> {
        self.entities.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Loads a store snapshot written by [`save`](Self::save)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DextractError::Io(format!(
                "Failed to read mapping snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        let store: Self = serde_json::from_str(&contents)?;

        for (entity, mapping) in &store.entities {
            if mapping.len() != mapping.distinct_surrogates() {
                return Err(PseudonymisationError::MappingCollision {
                    entity: entity.to_string(),
                    keys: mapping.len(),
                    values: mapping.distinct_surrogates(),
                }
                .into());
            }
        }

        tracing::info!(
            path = %path.display(),
            entities = store.len(),
            "Loaded identifier mapping snapshot"
        );
        Ok(store)
    }

    /// Writes the store as JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;

        tracing::info!(
            path = %path.display(),
            entities = self.len(),
            "Saved identifier mapping snapshot"
        );
        Ok(())
    }
}
