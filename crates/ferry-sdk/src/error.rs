//! Error types surfaced by a foreign runtime

/// Result type for foreign runtime calls
pub type AbiResult<T> = Result<T, ForeignError>;

/// Failures reported by the foreign runtime across the adapter boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForeignError {
    /// Value did not have the expected foreign type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// No type descriptor with this name or handle
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Field does not exist on the type
    #[error("Type '{type_name}' has no field '{field}'")]
    UnknownField {
        /// Owning type
        type_name: String,
        /// Field name
        field: String,
    },

    /// No function with this name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Handle does not refer to a live runtime object of the right kind
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Attempted to instantiate an abstract type
    #[error("Cannot instantiate abstract type '{0}'")]
    AbstractType(String),

    /// Attempted to chain a type beneath an ancestor that cannot be subtyped
    #[error("Type '{ancestor}' cannot be a supertype of '{name}'")]
    InvalidSupertype {
        /// Type being promoted
        name: String,
        /// Requested ancestor
        ancestor: String,
    },

    /// A foreign function raised an error
    #[error("Error in call to '{function}': {message}")]
    Call {
        /// Function name
        function: String,
        /// Message raised by the foreign side
        message: String,
    },

    /// Any other runtime failure
    #[error("{0}")]
    Runtime(String),
}

impl From<String> for ForeignError {
    fn from(s: String) -> Self {
        ForeignError::Runtime(s)
    }
}

impl From<&str> for ForeignError {
    fn from(s: &str) -> Self {
        ForeignError::Runtime(s.to_string())
    }
}
