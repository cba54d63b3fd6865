//! Domain identifier types with validation
//!
//! Newtype wrappers for the names that key the extract's bookkeeping. Each type
//! keeps entity names, data source names and extract ids from being mixed up.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a class of real-world identifier (e.g. "User", "QuizSession")
///
/// Used as the key into the identifier-mapping store, so two columns mapped to the
/// same entity share surrogate ids.
///
/// # Examples
///
/// ```
/// use dextract::domain::ids::EntityName;
///
/// let entity = EntityName::new("QuizSession").unwrap();
/// assert_eq!(entity.as_str(), "QuizSession");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Creates a new EntityName, rejecting blank names
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Entity name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the entity name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of a data source, unique within its data extract
///
/// The name doubles as the exported CSV file stem, so path separators are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataSourceName(String);

impl DataSourceName {
    /// Creates a new DataSourceName
    ///
    /// # Errors
    ///
    /// Returns `Err` if the name is blank or contains a path separator
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Data source name cannot be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!(
                "Data source name '{}' cannot contain path separators",
                name
            ));
        }
        Ok(Self(name))
    }

    /// Returns the data source name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Random identifier stamped on a data extract when it is created
///
/// 32 characters drawn from lowercase ASCII letters and digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtractId(String);

impl ExtractId {
    /// Length of a generated id
    pub const LENGTH: usize = 32;

    const ALPHABET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    /// Generates a fresh random id
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generates an id from the given random number generator
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let index = Uniform::from(0..Self::ALPHABET.len());
        let id = (0..Self::LENGTH)
            .map(|_| Self::ALPHABET[index.sample(rng)] as char)
            .collect();
        Self(id)
    }

    /// Parses an existing id
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.len() != Self::LENGTH {
            return Err(format!(
                "Extract id must be {} characters, got {}",
                Self::LENGTH,
                id.len()
            ));
        }
        if !id.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            return Err(format!(
                "Extract id '{}' must only contain lowercase letters and digits",
                id
            ));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_string_newtype {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(EntityName);
impl_string_newtype!(DataSourceName);
impl_string_newtype!(ExtractId);
