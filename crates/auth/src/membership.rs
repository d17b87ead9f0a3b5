//! Membership and role providers.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{info, warn};

use contentmart_core::UserId;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::roles::Role;
use crate::user::User;

const MAX_USERNAME_LENGTH: usize = 64;

/// Account registry. Usernames are unique ignoring case.
pub trait MembershipProvider: Send + Sync {
    fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError>;

    /// `false` for an unknown user or a wrong password.
    fn validate_user(&self, username: &str, password: &str) -> bool;

    fn get_user(&self, username: &str) -> Option<User>;

    fn get_user_by_id(&self, id: UserId) -> Option<User>;

    /// Requires the current password.
    fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

/// Role assignments keyed by username.
pub trait RoleProvider: Send + Sync {
    fn create_role(&self, role: &Role) -> Result<(), AuthError>;

    /// Idempotent. The user and the role must both exist.
    fn add_user_to_role(&self, username: &str, role: &Role) -> Result<(), AuthError>;

    fn is_user_in_role(&self, username: &str, role: &Role) -> bool;

    /// Sorted by name.
    fn roles_for_user(&self, username: &str) -> Vec<Role>;
}

impl<S> MembershipProvider for Arc<S>
where
    S: MembershipProvider + ?Sized,
{
    fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        (**self).create_user(username, email, password)
    }

    fn validate_user(&self, username: &str, password: &str) -> bool {
        (**self).validate_user(username, password)
    }

    fn get_user(&self, username: &str) -> Option<User> {
        (**self).get_user(username)
    }

    fn get_user_by_id(&self, id: UserId) -> Option<User> {
        (**self).get_user_by_id(id)
    }

    fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        (**self).change_password(username, old_password, new_password)
    }
}

impl<S> RoleProvider for Arc<S>
where
    S: RoleProvider + ?Sized,
{
    fn create_role(&self, role: &Role) -> Result<(), AuthError> {
        (**self).create_role(role)
    }

    fn add_user_to_role(&self, username: &str, role: &Role) -> Result<(), AuthError> {
        (**self).add_user_to_role(username, role)
    }

    fn is_user_in_role(&self, username: &str, role: &Role) -> bool {
        (**self).is_user_in_role(username, role)
    }

    fn roles_for_user(&self, username: &str) -> Vec<Role> {
        (**self).roles_for_user(username)
    }
}

#[derive(Debug, Default)]
struct Members {
    /// Keyed by lowercased username.
    users: HashMap<String, User>,
    roles: BTreeSet<Role>,
    /// Lowercased username -> granted roles.
    grants: HashMap<String, BTreeSet<Role>>,
}

/// In-process membership store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMembership {
    inner: RwLock<Members>,
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(username: &str) -> String {
        username.trim().to_lowercase()
    }

    fn validate_username(username: &str) -> Result<(), AuthError> {
        let trimmed = username.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AuthError::InvalidUsername(username.to_string()));
        }
        Ok(())
    }
}

impl MembershipProvider for InMemoryMembership {
    fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        Self::validate_username(username)?;
        let password_hash = hash_password(password)?;

        let key = Self::key(username);
        let mut members = self.inner.write().map_err(|_| AuthError::Unavailable)?;
        if members.users.contains_key(&key) {
            return Err(AuthError::DuplicateUser(username.to_string()));
        }

        let user = User {
            id: UserId::new(),
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        members.users.insert(key, user.clone());

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    fn validate_user(&self, username: &str, password: &str) -> bool {
        let Some(user) = self.get_user(username) else {
            return false;
        };
        match verify_password(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "stored password hash is unreadable");
                false
            }
        }
    }

    fn get_user(&self, username: &str) -> Option<User> {
        let members = self.inner.read().ok()?;
        members.users.get(&Self::key(username)).cloned()
    }

    fn get_user_by_id(&self, id: UserId) -> Option<User> {
        let members = self.inner.read().ok()?;
        members.users.values().find(|u| u.id == id).cloned()
    }

    fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !self.validate_user(username, old_password) {
            return Err(AuthError::InvalidCredentials);
        }
        let password_hash = hash_password(new_password)?;

        let mut members = self.inner.write().map_err(|_| AuthError::Unavailable)?;
        let user = members
            .users
            .get_mut(&Self::key(username))
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        user.password_hash = password_hash;

        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}

impl RoleProvider for InMemoryMembership {
    fn create_role(&self, role: &Role) -> Result<(), AuthError> {
        let mut members = self.inner.write().map_err(|_| AuthError::Unavailable)?;
        if !members.roles.insert(role.clone()) {
            return Err(AuthError::DuplicateRole(role.to_string()));
        }
        info!(%role, "role created");
        Ok(())
    }

    fn add_user_to_role(&self, username: &str, role: &Role) -> Result<(), AuthError> {
        let key = Self::key(username);
        let mut members = self.inner.write().map_err(|_| AuthError::Unavailable)?;
        if !members.users.contains_key(&key) {
            return Err(AuthError::UnknownUser(username.to_string()));
        }
        if !members.roles.contains(role) {
            return Err(AuthError::UnknownRole(role.to_string()));
        }

        if members.grants.entry(key).or_default().insert(role.clone()) {
            info!(username = %username.trim(), %role, "role granted");
        }
        Ok(())
    }

    fn is_user_in_role(&self, username: &str, role: &Role) -> bool {
        self.inner
            .read()
            .map(|m| {
                m.grants
                    .get(&Self::key(username))
                    .is_some_and(|roles| roles.contains(role))
            })
            .unwrap_or(false)
    }

    fn roles_for_user(&self, username: &str) -> Vec<Role> {
        self.inner
            .read()
            .map(|m| {
                m.grants
                    .get(&Self::key(username))
                    .map(|roles| roles.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}
