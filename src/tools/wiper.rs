/*!
wiper - delete every user, team, database and storage bucket in a project.

Each resource type is drained page by page: list, delete everything listed,
list again until empty. An id seen twice means the server did not drop it;
the loop stops there and leaves a note instead of spinning.
*/

use std::collections::HashSet;

use super::{Action, ToolError, ToolReport, confirm_unless_auto, connect, resolve_credentials};
use crate::appwrite::Client;
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::ToolKind;
use crate::config::{self, Options};

pub struct WiperPlan {
    pub client: Client,
}

pub fn prepare(options: &Options, prompter: &mut dyn Prompter) -> Result<WiperPlan, ToolError> {
    let creds = resolve_credentials(options, prompter, config::env_value)?;
    let client = connect(options, &creds)?;
    confirm_unless_auto(
        options,
        prompter,
        &format!(
            "This permanently deletes ALL users, teams, databases and buckets in '{}'. Continue?",
            creds.project
        ),
        false,
        true,
    )?;
    Ok(WiperPlan { client })
}

/// Tracks ids already deleted for one resource type.
struct Drain {
    resource: &'static str,
    seen: HashSet<String>,
}

impl Drain {
    fn new(resource: &'static str) -> Self {
        Self {
            resource,
            seen: HashSet::new(),
        }
    }

    /// Ids from `page` not yet deleted. `None` when the page is empty or
    /// only repeats deleted ids.
    fn fresh(
        &mut self,
        page: Vec<(String, String)>,
        report: &mut ToolReport,
    ) -> Option<Vec<(String, String)>> {
        if page.is_empty() {
            return None;
        }
        let fresh: Vec<(String, String)> = page
            .into_iter()
            .filter(|(id, _)| !self.seen.contains(id))
            .collect();
        if fresh.is_empty() {
            report.note(format!(
                "some {}s are still listed after deletion; stopping",
                self.resource
            ));
            return None;
        }
        for (id, _) in &fresh {
            self.seen.insert(id.clone());
        }
        Some(fresh)
    }
}

async fn wipe_users(client: &Client, report: &mut ToolReport) -> Result<(), ToolError> {
    let mut drain = Drain::new("user");
    loop {
        let page = client.list_users().await?;
        crate::log_debug!("users: {} remaining", page.total);
        let items = page.users.into_iter().map(|u| (u.id, u.email)).collect();
        let Some(batch) = drain.fresh(items, report) else {
            return Ok(());
        };
        for (id, name) in batch {
            client.delete_user(&id).await?;
            report.record(Action::Deleted, "user", id, name);
        }
    }
}

async fn wipe_teams(client: &Client, report: &mut ToolReport) -> Result<(), ToolError> {
    let mut drain = Drain::new("team");
    loop {
        let page = client.list_teams().await?;
        crate::log_debug!("teams: {} remaining", page.total);
        let items = page.teams.into_iter().map(|t| (t.id, t.name)).collect();
        let Some(batch) = drain.fresh(items, report) else {
            return Ok(());
        };
        for (id, name) in batch {
            client.delete_team(&id).await?;
            report.record(Action::Deleted, "team", id, name);
        }
    }
}

async fn wipe_databases(client: &Client, report: &mut ToolReport) -> Result<(), ToolError> {
    let mut drain = Drain::new("database");
    loop {
        let page = client.list_databases().await?;
        crate::log_debug!("databases: {} remaining", page.total);
        let items = page.databases.into_iter().map(|d| (d.id, d.name)).collect();
        let Some(batch) = drain.fresh(items, report) else {
            return Ok(());
        };
        for (id, name) in batch {
            client.delete_database(&id).await?;
            report.record(Action::Deleted, "database", id, name);
        }
    }
}

async fn wipe_buckets(client: &Client, report: &mut ToolReport) -> Result<(), ToolError> {
    let mut drain = Drain::new("bucket");
    loop {
        let page = client.list_buckets().await?;
        crate::log_debug!("buckets: {} remaining", page.total);
        let items = page.buckets.into_iter().map(|b| (b.id, b.name)).collect();
        let Some(batch) = drain.fresh(items, report) else {
            return Ok(());
        };
        for (id, name) in batch {
            client.delete_bucket(&id).await?;
            report.record(Action::Deleted, "bucket", id, name);
        }
    }
}

pub async fn execute(plan: WiperPlan) -> Result<ToolReport, ToolError> {
    let client = &plan.client;
    let mut report = ToolReport::new(ToolKind::Wiper, client.project());

    wipe_users(client, &mut report).await?;
    wipe_teams(client, &mut report).await?;
    wipe_databases(client, &mut report).await?;
    wipe_buckets(client, &mut report).await?;

    Ok(report)
}
