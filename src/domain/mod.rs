//! Domain types for panel user accounts.
//!
//! These mirror the subset of the panel's user resource that the batch engine
//! reads and mutates. The panel is the only source of truth; nothing here is
//! cached or persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a panel user.
///
/// The wire literals are the ones accepted by the `status` query parameter of
/// `GET /api/users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    OnHold,
    Expired,
    Limited,
    Disabled,
}

impl UserStatus {
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::OnHold,
        Self::Expired,
        Self::Limited,
        Self::Disabled,
    ];

    /// The literal used on the wire and in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Expired => "expired",
            Self::Limited => "limited",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown user status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Lenient status filter: anything that is not one of the five literals
/// means "no filter" rather than an error.
#[must_use]
pub fn status_filter(raw: Option<&str>) -> Option<UserStatus> {
    raw.and_then(|s| s.parse().ok())
}

/// A panel user record.
///
/// Quantities are bytes, `expire` is a Unix timestamp in seconds and
/// `online_at` is the raw ISO-8601 string reported by the panel (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,

    pub status: UserStatus,

    #[serde(default)]
    pub data_limit: Option<i64>,

    #[serde(default)]
    pub used_traffic: Option<i64>,

    #[serde(default)]
    pub lifetime_used_traffic: Option<i64>,

    #[serde(default)]
    pub expire: Option<i64>,

    #[serde(default)]
    pub online_at: Option<String>,
}

impl User {
    /// Quota and expiry can only be recalculated when all three inputs exist.
    #[must_use]
    pub const fn quota_fields(&self) -> Option<(i64, i64)> {
        match (self.data_limit, self.expire, self.used_traffic) {
            (Some(limit), Some(expire), Some(_)) => Some((limit, expire)),
            _ => None,
        }
    }
}

/// Body of `PUT /api/user/{username}`. Absent fields are left untouched by the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserModification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_limit: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UserModification {
    #[must_use]
    pub const fn quota(data_limit: i64, expire: i64) -> Self {
        Self {
            data_limit: Some(data_limit),
            expire: Some(expire),
            status: None,
        }
    }

    #[must_use]
    pub const fn status(status: UserStatus) -> Self {
        Self {
            data_limit: None,
            expire: None,
            status: Some(status),
        }
    }
}
