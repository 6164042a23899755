// src/models/user.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Account role. Evaluators review student work; students run the journey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Evaluator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "evaluator" => Ok(Role::Evaluator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A registered identity.
/// Progress entries are not embedded; they are read through `ProgressStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Display name chosen at registration.
    pub username: Option<String>,

    pub email: Option<String>,

    pub role: Role,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Username if set, otherwise email. Blank values count as absent.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.email.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    }
}

/// DTO for creating or updating a user profile.
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Username length must be between 1 and 50 characters."
    ))]
    pub username: Option<String>,

    #[validate(email(message = "Email address is malformed."))]
    pub email: Option<String>,

    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: Option<&str>, email: Option<&str>) -> User {
        let now = chrono::Utc::now();
        User {
            id: "u1".to_string(),
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            role: Role::Student,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_display_name_prefers_username() {
        assert_eq!(user(Some("ana"), Some("a@x.io")).display_name(), Some("ana"));
        assert_eq!(user(Some("  "), Some("a@x.io")).display_name(), Some("a@x.io"));
        assert_eq!(user(None, None).display_name(), None);
    }

    #[test]
    fn test_role_round_trip_through_str() {
        assert_eq!("evaluator".parse::<Role>(), Ok(Role::Evaluator));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::default().as_str(), "student");
    }
}
