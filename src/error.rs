//! Library error types

use thiserror::Error;

/// Errors surfaced by form construction and state seeding.
///
/// Validation failures are not errors in this sense; they travel through
/// [`ErrorMap`](crate::ErrorMap) and never abort anything.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A non-root state container was created without naming the field it
    /// binds to in its parent. Construction stops immediately.
    #[error("nested form usage without field specification")]
    NestedWithoutField,

    /// A form state was seeded from a JSON value that is not an object.
    #[error("form state must be an object, got {0}")]
    NotAnObject(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_without_field_message() {
        let err = FormError::NestedWithoutField;
        assert!(err.to_string().contains("without field"));
    }

    #[test]
    fn test_not_an_object_names_the_type() {
        let err = FormError::NotAnObject("string");
        assert!(err.to_string().contains("string"));
    }
}
