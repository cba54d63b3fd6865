//! Identifier column classification
//!
//! Decides which column names look like they hold identifiers. The engine uses the
//! classification to refuse exporting any identifier-shaped column that the caller
//! has neither mapped to an entity nor whitelisted.

use std::collections::BTreeSet;

/// Trait for column classifiers
pub trait ColumnClassifier: Send + Sync {
    /// Returns true if the column name looks like an identifier
    fn is_identifier(&self, column_name: &str) -> bool;

    /// Returns the identifier-shaped subset of the given column names
    fn classify<'a>(&self, column_names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String>
    where
        Self: Sized,
    {
        column_names
            .into_iter()
            .filter(|name| self.is_identifier(name))
            .map(str::to_string)
            .collect()
    }
}

/// Classifies a column as an identifier when its name ends in "id", any case
///
/// "UserId", "quizID", "Sessionid" and a bare "id" all match; "Identity" and
/// "Paid_on" do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdSuffixClassifier;

impl ColumnClassifier for IdSuffixClassifier {
    fn is_identifier(&self, column_name: &str) -> bool {
        let bytes = column_name.as_bytes();
        bytes.len() >= 2 && bytes[bytes.len() - 2..].eq_ignore_ascii_case(b"id")
    }
}

/// Identifier-shaped subset of `column_names` under the default naming convention
pub fn find_id_columns<'a>(column_names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    IdSuffixClassifier.classify(column_names)
}
