use std::io;

use thiserror::Error;

use contentmart_core::DomainError;

/// Failure while placing or reading package files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Raised by the storage provider and passed through untouched.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The package or upload itself is not storable.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}
