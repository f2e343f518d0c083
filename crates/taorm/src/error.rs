//! Error types for taorm

use thiserror::Error;

/// Result type alias for taorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building, execution and row mapping.
///
/// Errors are `Clone` so a failed [`Query`](crate::Query) can carry its sticky
/// error into every context derived from it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrmError {
    /// SELECT/COUNT/INSERT without a target table
    #[error("Missing table: a target table is required")]
    MissingTable,

    /// Super-table insert without tag values
    #[error("Missing tags: super table '{0}' requires at least one tag value")]
    MissingTags(String),

    /// Placeholder count does not match the bound parameters
    #[error("Arity mismatch: placeholders({placeholders}) != params({params})")]
    ArityMismatch { placeholders: usize, params: usize },

    /// A connection could not be checked out
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution (insert/exec) failed
    #[error("Exec error: {0}")]
    Exec(String),

    /// Query execution or row iteration failed
    #[error("Query error: {0}")]
    Query(String),

    /// A column value cannot be assigned to the destination type
    #[error("Type mismatch on column '{column}': {message}")]
    TypeMismatch { column: String, message: String },

    /// Round-trip through the intermediate encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Structurally invalid builder input
    #[error("Validation error: {0}")]
    Validation(String),
}

impl OrmError {
    /// Create an arity error from the two counts.
    pub fn arity(placeholders: usize, params: usize) -> Self {
        Self::ArityMismatch {
            placeholders,
            params,
        }
    }

    /// Create a type mismatch error for a specific column.
    pub fn type_mismatch(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is an arity mismatch.
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, Self::ArityMismatch { .. })
    }

    /// Check if this error was raised while assembling SQL, before any I/O.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTable | Self::MissingTags(_) | Self::ArityMismatch { .. } | Self::Validation(_)
        )
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
