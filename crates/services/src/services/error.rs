use db::{DbErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

use super::{email::TransportError, validation::first_message};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Database(DbErr),
    #[error("{0}")]
    Unknown(String),
}

impl ServiceError {
    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            tracing::debug!(detail = %detail, "unique constraint violated");
            return Self::Conflict("Record already exists".to_string());
        }
        match err {
            DbErr::RecordNotFound(message) => Self::NotFound(message),
            other => Self::Database(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(first_message(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("Todo not found".to_string()).into();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Todo not found"));
        assert_eq!(err.to_string(), "Todo not found");
    }

    #[test]
    fn other_db_errors_stay_database_errors() {
        let err: ServiceError = DbErr::Custom("disk full".to_string()).into();
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
