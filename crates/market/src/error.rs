use thiserror::Error;

use contentmart_auth::AuthError;
use contentmart_core::DomainError;
use contentmart_storage::StorageError;

pub type MarketResult<T> = Result<T, MarketError>;

/// Facade error. Domain failures raised inside storage surface as `Domain`.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Domain(e) => Self::Domain(e),
            other => Self::Storage(other),
        }
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(StorageError::Io(err))
    }
}

impl MarketError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Domain(DomainError::Unauthorized))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Domain(DomainError::NotFound(_)) => true,
            Self::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn domain_errors_inside_storage_are_flattened() {
        let err = MarketError::from(StorageError::Domain(DomainError::conflict("taken")));

        assert!(matches!(err, MarketError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn io_not_found_counts_as_not_found() {
        let err = MarketError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));

        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
    }
}
