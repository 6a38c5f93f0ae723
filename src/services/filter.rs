//! User selection predicates.

use crate::domain::{User, UserStatus};
use crate::units::SECONDS_PER_DAY;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Formats the panel uses for `online_at`, with and without fractional seconds.
const ONLINE_AT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Which users a job applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Exact status match; `None` matches every status.
    pub status: Option<UserStatus>,

    /// Literal, case-sensitive username prefix; empty matches everyone.
    pub prefix: String,

    /// Only used by deletion: a user must have been idle strictly longer than this.
    pub min_idle_days: u32,
}

impl FilterSpec {
    #[must_use]
    pub fn with_status(mut self, status: Option<UserStatus>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub const fn with_min_idle_days(mut self, days: u32) -> Self {
        self.min_idle_days = days;
        self
    }

    #[must_use]
    pub fn matches_status(&self, user: &User) -> bool {
        self.status.is_none_or(|status| status == user.status)
    }

    #[must_use]
    pub fn matches_prefix(&self, user: &User) -> bool {
        user.username.starts_with(&self.prefix)
    }

    /// Users that have never been online never match, whatever the threshold.
    #[must_use]
    pub fn matches_idle(&self, user: &User, clock: &ReferenceClock) -> bool {
        let Some(raw) = user.online_at.as_deref() else {
            return false;
        };

        match clock.idle_seconds(raw) {
            Some(idle) => idle > i64::from(self.min_idle_days) * SECONDS_PER_DAY,
            None => {
                warn!(username = %user.username, online_at = %raw, "Unparsable last-online timestamp");
                false
            }
        }
    }

    /// Status, prefix and idle predicates combined.
    #[must_use]
    pub fn matches(&self, user: &User, clock: &ReferenceClock) -> bool {
        self.matches_status(user) && self.matches_prefix(user) && self.matches_idle(user, clock)
    }
}

/// "Now" pinned to a reference zone, against which idle time is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    pub zone: Tz,
    pub now: DateTime<Utc>,
}

impl ReferenceClock {
    #[must_use]
    pub fn now(zone: Tz) -> Self {
        Self {
            zone,
            now: Utc::now(),
        }
    }

    #[must_use]
    pub const fn at(zone: Tz, now: DateTime<Utc>) -> Self {
        Self { zone, now }
    }

    /// Seconds elapsed since `online_at`, both sides localised to the reference zone.
    #[must_use]
    pub fn idle_seconds(&self, online_at: &str) -> Option<i64> {
        let seen = parse_online_at(online_at)?;
        let now = self.now.with_timezone(&self.zone);
        let seen = seen.with_timezone(&self.zone);
        Some((now - seen).num_seconds())
    }
}

/// Parses a panel timestamp. Naive timestamps are UTC.
#[must_use]
pub fn parse_online_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ONLINE_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
