use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Task session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Invalid floor model: {reason}")]
    InvalidModel { reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Model source error: {0}")]
    ModelSource(String),

    #[error("Snapshot store error: {0}")]
    SnapshotStore(String),

    #[error("Floor is not running")]
    NotRunning,
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_failures_become_serialization_errors() {
        let parse = serde_json::from_str::<u32>("not a number").unwrap_err();
        let domain = DomainError::from(parse);
        assert!(matches!(domain, DomainError::SerializationError(_)));

        let app = ApplicationError::from(domain);
        assert!(matches!(app, ApplicationError::Domain(DomainError::SerializationError(_))));
        assert!(app.to_string().starts_with("Domain error: Serialization error"));
    }
}
