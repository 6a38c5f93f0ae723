//! Quota and expiry command handlers

use super::{Scope, Session};
use crate::cli::Direction;
use crate::domain::UserStatus;
use crate::services::{AdjustmentSpec, FilterSpec, Job};
use anyhow::Result;
use tracing::warn;

/// Only active users are recalculated.
fn active_users(scope: &Scope) -> FilterSpec {
    FilterSpec::default()
        .with_status(Some(UserStatus::Active))
        .with_prefix(scope.prefix.clone())
}

pub async fn cmd_traffic(
    session: &Session,
    direction: Direction,
    amount: Option<f64>,
    coefficient: Option<f64>,
    scope: &Scope,
) -> Result<()> {
    let (traffic, coefficient) = match (amount, coefficient) {
        (Some(amount), None) => (amount, 1.0),
        (None, Some(coefficient)) => (0.0, coefficient),
        _ => anyhow::bail!("Pass exactly one of --amount or --coefficient"),
    };

    let spec = AdjustmentSpec::new(direction.into(), traffic, 0, coefficient)?;
    session
        .run(scope, Job::Adjust(spec), active_users(scope))
        .await?;
    Ok(())
}

pub async fn cmd_days(
    session: &Session,
    direction: Direction,
    days: i64,
    scope: &Scope,
) -> Result<()> {
    if direction == Direction::Decrease && days > 0 {
        warn!(
            days,
            "Decrease only affects traffic; the day count is still added. Pass a negative --days to shorten expiry"
        );
    }

    let spec = AdjustmentSpec::new(direction.into(), 0.0, days, 1.0)?;
    session
        .run(scope, Job::Adjust(spec), active_users(scope))
        .await?;
    Ok(())
}
