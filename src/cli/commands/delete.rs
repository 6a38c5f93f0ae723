use super::{Scope, Session};
use crate::domain::status_filter;
use crate::services::{FilterSpec, Job};
use anyhow::Result;

pub async fn cmd_delete(
    session: &Session,
    idle_days: u32,
    status: Option<&str>,
    scope: &Scope,
) -> Result<()> {
    let filter = FilterSpec::default()
        .with_status(status_filter(status))
        .with_prefix(scope.prefix.clone())
        .with_min_idle_days(idle_days);

    session.run(scope, Job::Delete, filter).await?;
    Ok(())
}
