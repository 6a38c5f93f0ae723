use super::{Scope, Session};
use crate::cli::StatusToggle;
use crate::services::{FilterSpec, Job};
use anyhow::Result;

pub async fn cmd_status(session: &Session, toggle: StatusToggle, scope: &Scope) -> Result<()> {
    let (listed, new_status) = toggle.transition();
    let filter = FilterSpec::default()
        .with_status(Some(listed))
        .with_prefix(scope.prefix.clone());

    session.run(scope, Job::SetStatus(new_status), filter).await?;
    Ok(())
}
