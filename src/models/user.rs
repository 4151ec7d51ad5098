use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::password::PasswordEncoder;
use crate::models::error::{RepositoryError, UserError};
use crate::models::now_millis;
use crate::repository::UserRepository;

pub const MIN_USERNAME_LENGTH: usize = 5;
pub const MAX_USERNAME_LENGTH: usize = 15;
pub const MIN_PASSWORD_LENGTH: usize = 5;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Common,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Open,
    Banned,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Common => "COMMON",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(UserRole::Admin),
            "COMMON" => Ok(UserRole::Common),
            other => Err(format!("unknown user role: {}", other)),
        }
    }
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Open => "OPEN",
            UserStatus::Banned => "BANNED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OPEN" => Ok(UserStatus::Open),
            "BANNED" => Ok(UserStatus::Banned),
            other => Err(format!("unknown user status: {}", other)),
        }
    }
}

/// Read-only projection of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub username: String,
    /// Always the hashed form once the user has been registered.
    pub password: String,
    pub role: String,
    pub status: String,
    pub creation_date: String,
}

/// What an authentication layer needs to build a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuthView {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// A user account, keyed by its username.
///
/// Like [`crate::models::Task`], a user is an immutable value; transitions
/// return new instances and equality is decided by the uuid alone.
#[derive(Debug, Clone)]
pub struct User {
    uuid: Uuid,
    username: String,
    password: String,
    role: UserRole,
    status: UserStatus,
    creation_date: DateTime<Utc>,
}

impl User {
    /// Validates the username, then the password, and builds an open account.
    ///
    /// The password is kept as given; [`User::encode_password`] hashes it once
    /// the username is known to be free.
    pub fn create(username: &str, password: &str, role: UserRole) -> Result<Self, UserError> {
        let username = validate_username(username)?;
        let password = validate_password(password)?;
        Ok(Self {
            uuid: Uuid::new_v4(),
            username,
            password,
            role,
            status: UserStatus::Open,
            creation_date: now_millis(),
        })
    }

    pub(crate) fn restore(
        uuid: Uuid,
        username: String,
        password: String,
        role: UserRole,
        status: UserStatus,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid,
            username,
            password,
            role,
            status,
            creation_date,
        }
    }

    pub fn change_password(
        &self,
        new_password: &str,
        encoder: &dyn PasswordEncoder,
    ) -> Result<Self, UserError> {
        let password = validate_password(new_password)?;
        let password = encoder.encode(&password)?;
        Ok(Self {
            password,
            ..self.clone()
        })
    }

    pub fn change_status(&self, status: UserStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn encode_password(&self, encoder: &dyn PasswordEncoder) -> Result<Self, UserError> {
        let password = encoder.encode(&self.password)?;
        Ok(Self {
            password,
            ..self.clone()
        })
    }

    pub async fn is_username_unique(
        &self,
        repository: &dyn UserRepository,
    ) -> Result<bool, RepositoryError> {
        Ok(!repository.exists_by_username(&self.username).await?)
    }

    pub fn to_view(&self) -> UserView {
        UserView {
            username: self.username.clone(),
            password: self.password.clone(),
            role: self.role.to_string(),
            status: self.status.to_string(),
            creation_date: self
                .creation_date
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_auth(&self) -> UserAuthView {
        UserAuthView {
            username: self.username.clone(),
            password: self.password.clone(),
            role: self.role,
            status: self.status,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

fn validate_username(username: &str) -> Result<String, UserError> {
    let length = username.chars().count();
    if (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        Ok(username.to_string())
    } else {
        Err(UserError::WrongUsernameLength { length })
    }
}

fn validate_password(password: &str) -> Result<String, UserError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        Err(UserError::WrongPasswordLength { length })
    } else {
        Ok(password.to_string())
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}
