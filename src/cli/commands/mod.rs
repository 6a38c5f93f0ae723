mod adjust;
mod delete;
mod init;
mod menu;
mod stats;
mod status;
mod users;

pub use adjust::{cmd_days, cmd_traffic};
pub use delete::cmd_delete;
pub use init::cmd_init;
pub use menu::{Prompter, cmd_menu};
pub use stats::cmd_stats;
pub use status::cmd_status;
pub use users::cmd_users;

use crate::clients::PanelClient;
use crate::config::Config;
use crate::services::{
    AccessContext, BatchReport, FilterSpec, Job, Outcome, PanelApi, ReferenceClock, StatsReport,
    run_job, summarize,
};
use anyhow::{Context, Result};
use chrono_tz::Tz;

/// Users covered by one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub prefix: String,
    /// `(username, password)` of another admin whose users are targeted.
    pub admin: Option<(String, String)>,
}

/// An authenticated panel session shared by the commands.
pub struct Session {
    client: PanelClient,
    access: AccessContext,
    zone: Tz,
}

impl Session {
    #[must_use]
    pub const fn new(client: PanelClient, access: AccessContext, zone: Tz) -> Self {
        Self {
            client,
            access,
            zone,
        }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        if !config.panel.has_credentials() {
            anyhow::bail!(
                "Panel credentials are not configured (use --username/--password, MARZBAN_USERNAME/MARZBAN_PASSWORD or config.toml)"
            );
        }

        let client = PanelClient::from_config(&config.panel)?;
        let access = client
            .authenticate(&config.panel.username, &config.panel.password)
            .await
            .context("Your panel information is not correct")?;

        Ok(Self::new(client, access, config.filters.zone()?))
    }

    #[must_use]
    pub const fn client(&self) -> &PanelClient {
        &self.client
    }

    /// The session's credentials, or a fresh token for the scope's admin.
    pub async fn access_for(&self, scope: &Scope) -> Result<AccessContext> {
        match &scope.admin {
            Some((username, password)) => self
                .client
                .authenticate(username, password)
                .await
                .with_context(|| format!("Admin '{username}' credentials are not correct")),
            None => Ok(self.access.clone()),
        }
    }

    #[must_use]
    pub fn clock(&self) -> ReferenceClock {
        ReferenceClock::now(self.zone)
    }

    /// Statistics over every user the scope's admin can see.
    pub async fn stats(&self, scope: &Scope) -> Result<StatsReport> {
        let access = self.access_for(scope).await?;
        let users = self
            .client
            .list_users(&access, None)
            .await
            .context("Failed to retrieve users list")?;
        Ok(summarize(access.admin(), &users, &scope.prefix))
    }

    /// Lists, filters and mutates, then prints the summary.
    pub async fn run(&self, scope: &Scope, job: Job, filter: FilterSpec) -> Result<BatchReport> {
        let access = self.access_for(scope).await?;
        println!("please wait...");

        let report = run_job(&self.client, &access, &job, &filter, &self.clock())
            .await
            .context("Failed to retrieve users list")?;

        print_report(&report);
        Ok(report)
    }
}

pub fn print_report(report: &BatchReport) {
    let failed: Vec<_> = report
        .items
        .iter()
        .filter_map(|item| match &item.outcome {
            Outcome::Failed(err) => Some((item.username.as_str(), err.as_str())),
            _ => None,
        })
        .collect();

    if !failed.is_empty() {
        println!("Failed users:");
        for (username, err) in failed {
            println!("  ✗ {username}: {err}");
        }
    }

    println!("The process is done! {report}");
}
