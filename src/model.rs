//! Resources exchanged with the release-tracking API
//!
//! Field names follow the server's camelCase JSON. Timestamps are kept as the
//! ISO-8601 strings the server sends and only parsed for display.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment stage a release occupies (DEV, QA, UAT, PROD, ...)
///
/// Values are not restricted to a fixed set; the known stages and their order
/// come from the [`Catalog`](crate::config::Catalog).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role of a user (ADMIN, DEVELOPER, QA, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRole(String);

impl UserRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    /// Label used when choosing a release owner: `full name (username)`
    pub fn owner_label(&self) -> String {
        format!("{} ({})", self.full_name, self.username)
    }
}

/// Body for creating or updating a user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: i64,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub description: String,
    pub owner: User,
    #[serde(default)]
    pub current_environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body for creating or updating a release
///
/// The owner is embedded as a complete user object. When no owner could be
/// resolved the field is left out and the server decides.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelease {
    pub version_number: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
}

/// Record of a promote or rollback, written by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLog {
    #[serde(default)]
    pub id: Option<i64>,
    pub release: Release,
    pub environment: Environment,
    pub deployed_by: User,
    #[serde(default)]
    pub deployment_timestamp: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notes: Option<String>,
}
