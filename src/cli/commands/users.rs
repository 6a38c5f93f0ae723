//! List users command handler

use super::{Scope, Session};
use crate::domain::{User, UserStatus, status_filter};
use crate::services::PanelApi;
use crate::units::format_size;
use anyhow::{Context, Result};
use chrono::DateTime;
use tracing::debug;

pub async fn cmd_users(
    session: &Session,
    status: Option<&str>,
    scope: &Scope,
    json: bool,
) -> Result<()> {
    let filter = status_filter(status);
    if filter.is_none() {
        if let Some(raw) = status {
            debug!(status = %raw, "Ignoring unknown status filter");
        }
    }

    let access = session.access_for(scope).await?;
    let users: Vec<User> = session
        .client()
        .list_users(&access, filter)
        .await
        .context("Failed to retrieve users list")?
        .into_iter()
        .filter(|u| u.username.starts_with(&scope.prefix))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in &users {
        let indicator = match user.status {
            UserStatus::Active => "🟢",
            UserStatus::OnHold => "⏸",
            UserStatus::Expired => "⌛",
            UserStatus::Limited => "🟡",
            UserStatus::Disabled => "🔴",
        };
        let used = format_size(user.used_traffic.unwrap_or(0));
        let limit = user
            .data_limit
            .map_or_else(|| "unlimited".to_string(), format_size);
        let expire = user
            .expire
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map_or_else(|| "never".to_string(), |dt| dt.format("%Y-%m-%d").to_string());
        let online = user.online_at.as_deref().unwrap_or("never");

        println!("{indicator} {} [{}]", user.username, user.status);
        println!("  Traffic: {used} / {limit} | Expires: {expire} | Last online: {online}");
    }

    Ok(())
}
