//! `contentmart-auth`: membership and role boundary.
//!
//! Decoupled from transport and from the catalog store: callers receive a
//! provider by composition and ask it who a user is and what roles they hold.

pub mod error;
pub mod membership;
pub mod password;
pub mod roles;
pub mod user;

pub use error::AuthError;
pub use membership::{InMemoryMembership, MembershipProvider, RoleProvider};
pub use password::{PasswordError, hash_password, validate_password, verify_password};
pub use roles::Role;
pub use user::User;
