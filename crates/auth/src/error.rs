use thiserror::Error;

use crate::password::PasswordError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("username already taken: {0}")]
    DuplicateUser(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("role already exists: {0}")]
    DuplicateRole(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("membership store unavailable")]
    Unavailable,
}
