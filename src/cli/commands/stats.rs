use super::{Scope, Session};
use anyhow::Result;

pub async fn cmd_stats(session: &Session, scope: &Scope, json: bool) -> Result<()> {
    if !json {
        println!("please wait...");
    }

    let report = session.stats(scope).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{report}");
    }

    Ok(())
}
