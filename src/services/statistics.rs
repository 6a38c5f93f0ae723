//! Traffic and status totals over a user listing.

use crate::domain::{User, UserStatus};
use crate::units::{bytes_to_gib, round3};
use serde::Serialize;
use std::fmt;

/// Aggregated figures for the users matching a prefix. Traffic figures are GiB
/// rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub admin_username: String,
    pub all_users: usize,
    pub active: usize,
    pub expired: usize,
    pub limited: usize,
    pub on_hold: usize,
    pub disabled: usize,
    pub all_traffic_used: f64,
    pub all_traffic_limit: f64,
    /// `limit - used`; negative when the users are over quota.
    pub all_traffic_remaining: f64,
    pub all_time_traffic_used: f64,
}

impl StatsReport {
    #[must_use]
    pub const fn count(&self, status: UserStatus) -> usize {
        match status {
            UserStatus::Active => self.active,
            UserStatus::OnHold => self.on_hold,
            UserStatus::Expired => self.expired,
            UserStatus::Limited => self.limited,
            UserStatus::Disabled => self.disabled,
        }
    }
}

#[must_use]
pub fn summarize(admin_username: &str, users: &[User], prefix: &str) -> StatsReport {
    let mut report = StatsReport {
        admin_username: admin_username.to_string(),
        all_users: 0,
        active: 0,
        expired: 0,
        limited: 0,
        on_hold: 0,
        disabled: 0,
        all_traffic_used: 0.0,
        all_traffic_limit: 0.0,
        all_traffic_remaining: 0.0,
        all_time_traffic_used: 0.0,
    };

    let (mut used, mut limit, mut lifetime) = (0_i64, 0_i64, 0_i64);

    for user in users.iter().filter(|u| u.username.starts_with(prefix)) {
        report.all_users += 1;
        used += user.used_traffic.unwrap_or(0);
        limit += user.data_limit.unwrap_or(0);
        lifetime += user.lifetime_used_traffic.unwrap_or(0);

        let counter = match user.status {
            UserStatus::Active => &mut report.active,
            UserStatus::OnHold => &mut report.on_hold,
            UserStatus::Expired => &mut report.expired,
            UserStatus::Limited => &mut report.limited,
            UserStatus::Disabled => &mut report.disabled,
        };
        *counter += 1;
    }

    report.all_traffic_used = bytes_to_gib(used);
    report.all_traffic_limit = bytes_to_gib(limit);
    report.all_traffic_remaining = round3(report.all_traffic_limit - report.all_traffic_used);
    report.all_time_traffic_used = bytes_to_gib(lifetime);
    report
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "admin username: {}", self.admin_username)?;
        writeln!(f, "all users: {}", self.all_users)?;
        writeln!(f, "active users: {}", self.active)?;
        writeln!(f, "expired users: {}", self.expired)?;
        writeln!(f, "limited users: {}", self.limited)?;
        writeln!(f, "on_hold users: {}", self.on_hold)?;
        writeln!(f, "disabled users: {}", self.disabled)?;
        writeln!(f, "all traffic used: {} GiB", self.all_traffic_used)?;
        writeln!(f, "all traffic limited: {} GiB", self.all_traffic_limit)?;
        writeln!(f, "all traffic remaining: {} GiB", self.all_traffic_remaining)?;
        write!(f, "all time traffic used: {} GiB", self.all_time_traffic_used)
    }
}
