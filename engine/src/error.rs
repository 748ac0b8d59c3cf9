//! FILENAME: engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// A lookup by field name or item name matched nothing.
    #[error("field '{0}' not found")]
    FieldNotFound(String),

    /// Primary-keyed generation was requested on a table without a primary field.
    #[error("primary field is required, but not found")]
    PrimaryFieldNotFound,

    /// A conversion received data of the wrong shape (e.g. a JSON array
    /// element that is not an object).
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
}
