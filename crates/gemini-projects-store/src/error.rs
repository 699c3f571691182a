//! Store errors.

use thiserror::Error;

/// Errors raised by storage backends and state reducers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request referenced a project that does not exist.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// A library operation referenced a prompt that does not exist.
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// The request cannot be applied as given.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_not_found_display() {
        let err = StoreError::ProjectNotFound("proj-1".to_string());
        assert_eq!(err.to_string(), "Project not found: proj-1");
    }

    #[test]
    fn test_invalid_request_display() {
        let err = StoreError::InvalidRequest("empty name".to_string());
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_io_from() {
        let err = StoreError::from(std::io::Error::other("disk full"));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_serialization_from() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err = StoreError::from(json_err);
        assert!(err.to_string().contains("Serialization error"));
    }
}
