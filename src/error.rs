use sea_orm::DbErr;
use thiserror::Error;

/// Expected failure of a service call. Handlers never turn this into an HTTP
/// error status; it becomes the message list of an envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Persistence(#[from] DbErr),
    #[error("{0}")]
    Storage(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{entity} with id {id} was not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Messages surfaced to callers. Persistence errors are passed through
    /// verbatim.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = ServiceError::not_found("School grade", "g-1");
        assert_eq!(err.messages(), vec!["School grade with id g-1 was not found"]);
    }

    #[test]
    fn validation_keeps_every_message() {
        let err = ServiceError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.messages(), vec!["a", "b"]);
        assert_eq!(err.to_string(), "a; b");
    }

    #[test]
    fn persistence_error_text_is_not_rewrapped() {
        let err: ServiceError = DbErr::Custom("disk full".into()).into();
        assert_eq!(err.messages(), vec![DbErr::Custom("disk full".into()).to_string()]);
    }
}
