//! Batch mutation over a user listing.
//!
//! Users are processed strictly in listing order, one remote call at a time.
//! A failing call is recorded and the batch moves on to the next user.

use crate::domain::{User, UserModification, UserStatus};
use crate::services::calculator::AdjustmentSpec;
use crate::services::filter::{FilterSpec, ReferenceClock};
use crate::services::panel_service::{AccessContext, PanelApi, PanelError};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

/// What a batch does to each selected user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Job {
    /// Recalculate quota and expiry.
    Adjust(AdjustmentSpec),
    /// Set a new status.
    SetStatus(UserStatus),
    /// Delete users idle for longer than the filter's threshold.
    Delete,
}

impl Job {
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Adjust(_) => JobKind::Adjust,
            Self::SetStatus(_) => JobKind::SetStatus,
            Self::Delete => JobKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Adjust,
    SetStatus,
    Delete,
}

impl JobKind {
    const fn verb(self) -> &'static str {
        match self {
            Self::Adjust | Self::SetStatus => "updated",
            Self::Delete => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Quota, expiry or used traffic is not set.
    MissingFields,
    /// Username does not start with the requested prefix.
    PrefixMismatch,
    /// Not idle long enough, or never online.
    NotIdle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingFields => "missing quota, expiry or usage",
            Self::PrefixMismatch => "prefix mismatch",
            Self::NotIdle => "not idle long enough",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Updated,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub username: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-batch counts plus the per-user outcomes in processing order.
///
/// `total` counts the users a mutation was attempted for, so
/// `total == updated + failed`. A quota recalculation that overflows is a
/// failure recorded without a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub kind: JobKind,
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    #[must_use]
    pub const fn new(kind: JobKind) -> Self {
        Self {
            kind,
            total: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            items: Vec::new(),
        }
    }

    fn record(&mut self, username: &str, outcome: Outcome) {
        match &outcome {
            Outcome::Updated => {
                self.total += 1;
                self.updated += 1;
            }
            Outcome::Failed(_) => {
                self.total += 1;
                self.failed += 1;
            }
            Outcome::Skipped(_) => self.skipped += 1,
        }
        self.items.push(ItemOutcome {
            username: username.to_string(),
            outcome,
        });
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} users {} ({} skipped, {} failed)",
            self.updated,
            self.total,
            self.kind.verb(),
            self.skipped,
            self.failed
        )
    }
}

/// Applies jobs through one authenticated session.
pub struct BatchMutator<'a, P: PanelApi + ?Sized> {
    panel: &'a P,
    access: &'a AccessContext,
}

impl<'a, P: PanelApi + ?Sized> BatchMutator<'a, P> {
    #[must_use]
    pub const fn new(panel: &'a P, access: &'a AccessContext) -> Self {
        Self { panel, access }
    }

    /// Applies `job` to every user selected by `filter`.
    ///
    /// Users with a different status are not part of the batch at all. Per-user
    /// call failures become `failed` entries; nothing here returns early.
    pub async fn apply(
        &self,
        job: &Job,
        users: &[User],
        filter: &FilterSpec,
        clock: &ReferenceClock,
    ) -> BatchReport {
        let mut report = BatchReport::new(job.kind());

        for user in users.iter().filter(|u| filter.matches_status(u)) {
            let outcome = match job {
                Job::Adjust(spec) => self.adjust_one(user, filter, spec).await,
                Job::SetStatus(status) => self.set_status_one(user, filter, *status).await,
                Job::Delete => self.delete_one(user, filter, clock).await,
            };

            let Some(outcome) = outcome else {
                continue;
            };

            match &outcome {
                Outcome::Updated => {
                    info!(username = %user.username, "User {}", job.kind().verb());
                }
                Outcome::Skipped(reason) => {
                    info!(username = %user.username, reason = %reason, "Skipping user");
                }
                Outcome::Failed(err) => {
                    error!(username = %user.username, error = %err, "User was not {}", job.kind().verb());
                }
            }
            report.record(&user.username, outcome);
        }

        info!(
            total = report.total,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Batch finished"
        );
        report
    }

    async fn adjust_one(
        &self,
        user: &User,
        filter: &FilterSpec,
        spec: &AdjustmentSpec,
    ) -> Option<Outcome> {
        if !filter.matches_prefix(user) {
            return None;
        }

        let Some((data_limit, expire)) = user.quota_fields() else {
            return Some(Outcome::Skipped(SkipReason::MissingFields));
        };

        let adjusted = match spec.apply(data_limit, expire) {
            Ok(adjusted) => adjusted,
            Err(e) => return Some(Outcome::Failed(e.to_string())),
        };
        let changes = UserModification::quota(adjusted.data_limit_bytes(), adjusted.expire);
        Some(self.modify(user, &changes).await)
    }

    async fn set_status_one(
        &self,
        user: &User,
        filter: &FilterSpec,
        status: UserStatus,
    ) -> Option<Outcome> {
        if !filter.matches_prefix(user) {
            return Some(Outcome::Skipped(SkipReason::PrefixMismatch));
        }

        Some(self.modify(user, &UserModification::status(status)).await)
    }

    async fn delete_one(
        &self,
        user: &User,
        filter: &FilterSpec,
        clock: &ReferenceClock,
    ) -> Option<Outcome> {
        if !filter.matches_prefix(user) {
            return None;
        }

        if !filter.matches_idle(user, clock) {
            return Some(Outcome::Skipped(SkipReason::NotIdle));
        }

        Some(into_outcome(
            self.panel.delete_user(self.access, &user.username).await,
        ))
    }

    async fn modify(&self, user: &User, changes: &UserModification) -> Outcome {
        into_outcome(
            self.panel
                .modify_user(self.access, &user.username, changes)
                .await,
        )
    }
}

fn into_outcome(result: Result<(), PanelError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Updated,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

/// Lists the users for `filter.status` and applies `job` to them.
///
/// A failed listing aborts before any mutation.
pub async fn run_job<P: PanelApi + ?Sized>(
    panel: &P,
    access: &AccessContext,
    job: &Job,
    filter: &FilterSpec,
    clock: &ReferenceClock,
) -> Result<BatchReport, PanelError> {
    let users = panel.list_users(access, filter.status).await.map_err(|e| {
        error!(error = %e, "Failed to retrieve users list");
        e
    })?;

    Ok(BatchMutator::new(panel, access)
        .apply(job, &users, filter, clock)
        .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::calculator::Sign;
    use crate::services::fake::FakePanel;
    use crate::units::BYTES_PER_GIB;
    use chrono::{TimeZone, Utc};

    fn clock() -> ReferenceClock {
        ReferenceClock::at(
            chrono_tz::Asia::Tehran,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    fn quota_user(name: &str, limit: Option<i64>) -> User {
        User {
            username: name.to_string(),
            status: UserStatus::Active,
            data_limit: limit,
            used_traffic: Some(0),
            lifetime_used_traffic: Some(0),
            expire: Some(1_000),
            online_at: None,
        }
    }

    #[tokio::test]
    async fn test_null_limit_is_skipped_not_failed() {
        let panel = FakePanel::new(vec![quota_user("carol", None)]);
        let access = panel.session();
        let job = Job::Adjust(AdjustmentSpec::new(Sign::Plus, 1.0, 0, 1.0).unwrap());

        let report = BatchMutator::new(&panel, &access)
            .apply(&job, &panel.users(), &FilterSpec::default(), &clock())
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total, 0);
        assert!(panel.modifications().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let panel = FakePanel::new(vec![
            quota_user("a", Some(BYTES_PER_GIB)),
            quota_user("b", Some(BYTES_PER_GIB)),
            quota_user("c", Some(BYTES_PER_GIB)),
        ])
        .failing_on("b");
        let access = panel.session();
        let job = Job::Adjust(AdjustmentSpec::new(Sign::Minus, 0.5, 1, 1.0).unwrap());

        let report = BatchMutator::new(&panel, &access)
            .apply(&job, &panel.users(), &FilterSpec::default(), &clock())
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);
        let names: Vec<_> = report.items.iter().map(|i| i.username.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(matches!(report.items[1].outcome, Outcome::Failed(_)));

        let mods = panel.modifications();
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].1.data_limit, Some(BYTES_PER_GIB / 2));
        assert_eq!(mods[0].1.expire, Some(1_000 + 86_400));
    }

    #[tokio::test]
    async fn test_expiry_overflow_fails_without_call() {
        let mut far = quota_user("far", Some(BYTES_PER_GIB));
        far.expire = Some(i64::MAX - 1);
        let panel = FakePanel::new(vec![far, quota_user("near", Some(BYTES_PER_GIB))]);
        let access = panel.session();
        let job = Job::Adjust(AdjustmentSpec::new(Sign::Plus, 0.0, 1, 1.0).unwrap());

        let report = BatchMutator::new(&panel, &access)
            .apply(&job, &panel.users(), &FilterSpec::default(), &clock())
            .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
        assert!(matches!(report.items[0].outcome, Outcome::Failed(_)));
        let mods = panel.modifications();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].0, "near");
    }

    #[tokio::test]
    async fn test_status_change_skips_prefix_mismatch() {
        let panel = FakePanel::new(vec![quota_user("shop_1", None), quota_user("other", None)]);
        let access = panel.session();
        let filter = FilterSpec::default()
            .with_status(Some(UserStatus::Active))
            .with_prefix("shop_");

        let report = BatchMutator::new(&panel, &access)
            .apply(&Job::SetStatus(UserStatus::Disabled), &panel.users(), &filter, &clock())
            .await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.items[1].outcome,
            Outcome::Skipped(SkipReason::PrefixMismatch)
        );
        assert_eq!(
            panel.modifications()[0],
            ("shop_1".to_string(), UserModification::status(UserStatus::Disabled))
        );
    }

    #[tokio::test]
    async fn test_delete_skips_never_online() {
        let mut idle = quota_user("idle", None);
        idle.online_at = Some("2024-01-01T00:00:00".to_string());
        let panel = FakePanel::new(vec![idle, quota_user("never", None)]);
        let access = panel.session();
        let filter = FilterSpec::default().with_min_idle_days(30);

        let report = BatchMutator::new(&panel, &access)
            .apply(&Job::Delete, &panel.users(), &filter, &clock())
            .await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(panel.deletions(), ["idle"]);
        assert_eq!(report.to_string(), "1 of 1 users deleted (1 skipped, 0 failed)");
    }

    #[tokio::test]
    async fn test_run_job_listing_failure_mutates_nothing() {
        let panel = FakePanel::new(vec![quota_user("a", Some(1))]).failing_listing();
        let access = panel.session();

        let result = run_job(&panel, &access, &Job::Delete, &FilterSpec::default(), &clock()).await;

        assert!(matches!(result, Err(PanelError::Http { status: 500, .. })));
        assert!(panel.deletions().is_empty());
    }
}
