//! Result type alias for dextract
//!
//! This module provides a convenient Result type alias that uses DextractError
//! as the error type.

use super::errors::DextractError;

/// Result type alias for dextract operations
///
/// # Examples
///
/// ```
/// use dextract::domain::result::Result;
/// use dextract::domain::errors::DextractError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DextractError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DextractError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{DextractError, PseudonymisationError};

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(DextractError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> std::result::Result<i32, PseudonymisationError> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
