//! Error types for Casebook
//!
//! A missing record is not an error: lookups return `Option` and deletes
//! return `bool`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CasebookError>;

#[derive(Error, Debug)]
pub enum CasebookError {
    /// Missing or malformed input, rejected before storage is touched
    #[error("{0}")]
    Validation(String),

    /// A reference to a parent record that does not exist, or another
    /// constraint the storage backend refused
    #[error("{0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CasebookError {
    /// Whether the caller is at fault (maps to a 400-class response)
    pub fn is_client_error(&self) -> bool {
        matches!(self, CasebookError::Validation(_) | CasebookError::Integrity(_))
    }
}

impl From<serde_json::Error> for CasebookError {
    fn from(e: serde_json::Error) -> Self {
        CasebookError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_caller_faults_are_client_errors() {
        let errors = [
            CasebookError::Validation("name is required".to_string()),
            CasebookError::Integrity("client_id does not reference an existing client".to_string()),
            CasebookError::Database("pool timed out".to_string()),
            CasebookError::Serialization("trailing comma".to_string()),
        ];
        for err in &errors {
            let expected = match err {
                CasebookError::Validation(_) | CasebookError::Integrity(_) => true,
                CasebookError::Database(_) | CasebookError::Serialization(_) => false,
            };
            assert_eq!(err.is_client_error(), expected, "{err}");
        }
        assert_eq!(errors[0].to_string(), "name is required");
        assert_eq!(errors[2].to_string(), "Database error: pool timed out");
    }
}
