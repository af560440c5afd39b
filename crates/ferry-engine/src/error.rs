//! Adapter error taxonomy

use ferry_sdk::ForeignError;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors raised while declaring, implementing, boxing or unboxing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Operation needs an adapter that was never declared or not yet implemented
    #[error("Adapter for '{type_name}' is not implemented")]
    UninitializedAdapter {
        /// Native or foreign type name
        type_name: String,
    },

    /// Type has no native default representation
    #[error("Cannot instantiate abstract type '{type_name}'")]
    AbstractInstantiation {
        /// Foreign type name
        type_name: String,
    },

    /// Foreign type name has no matching native conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared foreign type
        expected: String,
        /// Observed foreign type
        got: String,
    },

    /// Foreign value lacks a declared field
    #[error("Property '{property}' not found on foreign value of type '{type_name}'")]
    PropertyNotFound {
        /// Foreign type name
        type_name: String,
        /// Field name
        property: String,
    },

    /// Error surfaced by the foreign runtime
    #[error("Foreign runtime failure: {0}")]
    ForeignRuntimeFailure(#[source] ForeignError),

    /// Rejected property declaration
    #[error("Invalid property declaration: {0}")]
    InvalidProperty(String),

    /// Foreign name or native type already bound differently
    #[error("Foreign name '{name}' is bound to {existing}, cannot bind it to {requested}")]
    ConflictingRegistration {
        /// Foreign type name
        name: String,
        /// Existing binding
        existing: String,
        /// Rejected binding
        requested: String,
    },

    /// Declaration attempted after the foreign type was realized
    #[error("Type '{type_name}' is already implemented")]
    AlreadyImplemented {
        /// Foreign type name
        type_name: String,
    },
}

impl From<ForeignError> for AdapterError {
    fn from(err: ForeignError) -> Self {
        match err {
            ForeignError::TypeMismatch { expected, got } => {
                AdapterError::TypeMismatch { expected, got }
            }
            other => AdapterError::ForeignRuntimeFailure(other),
        }
    }
}
