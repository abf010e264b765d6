/*!
bootstrap - create the starter resources a fresh project usually needs.

  database   main
  collection main/todos  (title: string(255) required, done: boolean)
  bucket     uploads
  team       developers

Re-running is safe: resources that already exist (409) are skipped.
*/

use super::{
    Action, ToolError, ToolReport, confirm_unless_auto, connect, resolve_credentials,
    tolerate_conflict,
};
use crate::appwrite::Client;
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::ToolKind;
use crate::config::{self, Options};

pub const DATABASE_ID: &str = "main";
pub const COLLECTION_ID: &str = "todos";
pub const BUCKET_ID: &str = "uploads";
pub const TEAM_ID: &str = "developers";

pub struct BootstrapPlan {
    pub client: Client,
}

pub fn prepare(options: &Options, prompter: &mut dyn Prompter) -> Result<BootstrapPlan, ToolError> {
    let creds = resolve_credentials(options, prompter, config::env_value)?;
    let client = connect(options, &creds)?;
    confirm_unless_auto(
        options,
        prompter,
        &format!("Create starter resources in '{}'?", creds.project),
        true,
        true,
    )?;
    Ok(BootstrapPlan { client })
}

pub async fn execute(plan: BootstrapPlan) -> Result<ToolReport, ToolError> {
    let client = &plan.client;
    let mut report = ToolReport::new(ToolKind::Bootstrap, client.project());

    if let Some(db) = tolerate_conflict(
        client.create_database(DATABASE_ID, "Main").await,
        &mut report,
        "database",
        DATABASE_ID,
    )? {
        report.record(Action::Created, "database", &db.id, &db.name);
    }

    // Attributes only on a collection we just created.
    if let Some(col) = tolerate_conflict(
        client
            .create_collection(DATABASE_ID, COLLECTION_ID, "Todos")
            .await,
        &mut report,
        "collection",
        COLLECTION_ID,
    )? {
        report.record(Action::Created, "collection", &col.id, &col.name);

        client
            .create_string_attribute(DATABASE_ID, COLLECTION_ID, "title", 255, true)
            .await?;
        report.record(Action::Created, "attribute", "title", "string(255), required");

        client
            .create_boolean_attribute(DATABASE_ID, COLLECTION_ID, "done", false)
            .await?;
        report.record(Action::Created, "attribute", "done", "boolean");
    }

    if let Some(bucket) = tolerate_conflict(
        client.create_bucket(BUCKET_ID, "Uploads").await,
        &mut report,
        "bucket",
        BUCKET_ID,
    )? {
        report.record(Action::Created, "bucket", &bucket.id, &bucket.name);
    }

    if let Some(team) = tolerate_conflict(
        client.create_team(TEAM_ID, "Developers").await,
        &mut report,
        "team",
        TEAM_ID,
    )? {
        report.record(Action::Created, "team", &team.id, &team.name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::prompt::scripted::{Answer, ScriptedPrompter};
    use crate::config::{GlobalOptions, ToolOptions};
    use crate::tools::mock_api::{MockApi, Reply};

    const COLLECTION_PATH: &str = "POST /databases/main/collections";
    const STRING_ATTR: &str = "POST /databases/main/collections/todos/attributes/string";
    const BOOL_ATTR: &str = "POST /databases/main/collections/todos/attributes/boolean";

    /// `existing` lists the creation request lines that answer 409.
    fn bootstrap_api(existing: &'static [&'static str]) -> MockApi {
        MockApi::start(move |line, _| {
            if existing.iter().any(|e| *e == line) {
                return Reply::conflict();
            }
            match line {
                "POST /databases" => Reply::ok(r#"{"$id":"main","name":"Main"}"#),
                COLLECTION_PATH => Reply::ok(r#"{"$id":"todos","name":"Todos"}"#),
                STRING_ATTR | BOOL_ATTR => Reply::ok(r#"{"status":"processing"}"#),
                "POST /storage/buckets" => Reply::ok(r#"{"$id":"uploads","name":"Uploads"}"#),
                "POST /teams" => Reply::ok(r#"{"$id":"developers","name":"Developers"}"#),
                _ => Reply::error(404),
            }
        })
    }

    fn creds_options(auto: bool) -> Options {
        let mut tool = ToolOptions::new();
        tool.insert("project".into(), "demo".into());
        tool.insert("key".into(), "secret".into());
        Options::new(
            GlobalOptions {
                auto,
                ..GlobalOptions::default()
            },
            tool,
        )
    }

    #[test]
    fn prepare_asks_once_then_succeeds() {
        let mut p = ScriptedPrompter::new([Answer::Confirm(true)]);
        let plan = prepare(&creds_options(false), &mut p).unwrap();
        assert_eq!(plan.client.project(), "demo");
        assert_eq!(p.asked.len(), 1);
        assert!(p.asked[0].contains("demo"));
    }

    #[test]
    fn auto_skips_confirmation() {
        let mut p = ScriptedPrompter::new([]);
        assert!(prepare(&creds_options(true), &mut p).is_ok());
        assert!(p.asked.is_empty());
    }

    #[tokio::test]
    async fn fresh_project_gets_everything() {
        let api = bootstrap_api(&[]);
        let report = execute(BootstrapPlan {
            client: api.client(),
        })
        .await
        .unwrap();

        assert_eq!(
            api.lines(),
            vec![
                "POST /databases",
                COLLECTION_PATH,
                STRING_ATTR,
                BOOL_ATTR,
                "POST /storage/buckets",
                "POST /teams",
            ]
        );
        assert_eq!(report.count(Action::Created), 6);
        assert!(report.notes.is_empty());

        let title: serde_json::Value =
            serde_json::from_str(&api.requests()[2].body).unwrap();
        assert_eq!(title["key"], "title");
        assert_eq!(title["size"], 255);
        assert_eq!(title["required"], true);
    }

    #[tokio::test]
    async fn existing_collection_gets_no_attributes() {
        let api = bootstrap_api(&["POST /databases", COLLECTION_PATH]);
        let report = execute(BootstrapPlan {
            client: api.client(),
        })
        .await
        .unwrap();

        assert_eq!(
            api.lines(),
            vec![
                "POST /databases",
                COLLECTION_PATH,
                "POST /storage/buckets",
                "POST /teams",
            ]
        );
        assert_eq!(report.count(Action::Skipped), 2);
        assert_eq!(report.count(Action::Created), 2);
        assert_eq!(report.notes.len(), 2);
    }

    #[tokio::test]
    async fn attribute_failure_is_reported() {
        let api = MockApi::start(|line, _| match line {
            "POST /databases" => Reply::ok(r#"{"$id":"main","name":"Main"}"#),
            COLLECTION_PATH => Reply::ok(r#"{"$id":"todos","name":"Todos"}"#),
            _ => Reply::error(401),
        });
        let err = execute(BootstrapPlan {
            client: api.client(),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Api(ref e) if e.status() == Some(401)));
        assert_eq!(api.lines().last().map(String::as_str), Some(STRING_ATTR));
    }

    #[test]
    fn ids_are_valid_appwrite_ids() {
        for id in [DATABASE_ID, COLLECTION_ID, BUCKET_ID, TEAM_ID] {
            assert!(id.len() <= 36);
            assert!(
                id.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            );
        }
    }
}
