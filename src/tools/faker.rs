/*!
faker - fill a project with fake data.

For each of `--projects` rounds (default 1) a fake company name is invented,
then a team, `USERS_PER_PROJECT` users (all joined to the team) and a
database are created under that name.
*/

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{
    Action, ToolError, ToolReport, confirm_unless_auto, connect, resolve_credentials,
    tolerate_conflict,
};
use crate::appwrite::{Client, NewUser, UNIQUE_ID};
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::ToolKind;
use crate::config::{self, Options};

pub const USERS_PER_PROJECT: u32 = 5;
/// Set to a u64 to make the generated data reproducible.
pub const ENV_SEED: &str = "APPWRITE_TOOLKIT_SEED";
const PASSWORD_LEN: usize = 16;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Alan", "Radia",
    "Edsger", "Hedy", "Donald", "Katherine", "Niklaus", "Annie",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson", "Allen",
    "Turing", "Perlman", "Dijkstra", "Lamarr", "Knuth", "Johnson", "Wirth", "Easley",
];
const ADJECTIVES: &[&str] = &[
    "Silent", "Rapid", "Golden", "Crimson", "Quantum", "Lunar", "Brave", "Hidden", "Electric",
    "Northern",
];
const NOUNS: &[&str] = &[
    "Harbor", "Falcon", "Orchard", "Forge", "Signal", "Summit", "Canyon", "Beacon", "Engine",
    "Meadow",
];

/* ---- Fake data ---- */

/// Deterministic when seeded; used by the faker and its tests.
pub struct FakeData {
    rng: StdRng,
}

impl FakeData {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from `APPWRITE_TOOLKIT_SEED` when it holds a number.
    pub fn from_seed_value(seed: Option<String>) -> Self {
        match seed.and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(n) => {
                crate::log_debug!("fake data seed: {n}");
                Self::seeded(n)
            }
            None => Self::new(),
        }
    }

    fn pick(&mut self, list: &'static [&'static str]) -> &'static str {
        list.choose(&mut self.rng).copied().unwrap_or("Appwrite")
    }

    pub fn company(&mut self) -> String {
        format!("{} {}", self.pick(ADJECTIVES), self.pick(NOUNS))
    }

    pub fn user(&mut self) -> NewUser {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let suffix: u32 = self.rng.gen_range(1000..10000);
        NewUser {
            user_id: UNIQUE_ID.to_string(),
            email: format!(
                "{}.{}.{suffix}@example.com",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            password: self.password(),
            name: format!("{first} {last}"),
        }
    }

    pub fn password(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(PASSWORD_LEN)
            .map(char::from)
            .collect()
    }
}

impl Default for FakeData {
    fn default() -> Self {
        Self::new()
    }
}

/* ---- Plan ---- */

pub struct FakerPlan {
    pub client: Client,
    pub projects: u64,
    pub users_per_project: u32,
    pub data: FakeData,
}

/// `--projects` absent means one round.
pub fn project_count(options: &Options) -> Result<u64, ToolError> {
    match options.global.projects.as_deref() {
        None => Ok(1),
        Some(raw) => config::parse_project_count(raw)
            .ok_or_else(|| ToolError::InvalidProjects(raw.to_string())),
    }
}

pub fn prepare(options: &Options, prompter: &mut dyn Prompter) -> Result<FakerPlan, ToolError> {
    let projects = project_count(options)?;
    let creds = resolve_credentials(options, prompter, config::env_value)?;
    let client = connect(options, &creds)?;
    confirm_unless_auto(
        options,
        prompter,
        &format!(
            "Create fake data for {projects} project(s) ({} users each) in '{}'?",
            USERS_PER_PROJECT, creds.project
        ),
        true,
        true,
    )?;
    Ok(FakerPlan {
        client,
        projects,
        users_per_project: USERS_PER_PROJECT,
        data: FakeData::from_seed_value(config::env_value(ENV_SEED)),
    })
}

pub async fn execute(mut plan: FakerPlan) -> Result<ToolReport, ToolError> {
    let client = &plan.client;
    let mut report = ToolReport::new(ToolKind::Faker, client.project());

    for round in 1..=plan.projects {
        let company = plan.data.company();
        crate::log_info!("[{round}/{}] seeding '{company}'", plan.projects);

        let team = client.create_team(UNIQUE_ID, &company).await?;
        report.record(Action::Created, "team", &team.id, &team.name);

        for _ in 0..plan.users_per_project {
            let new_user = plan.data.user();
            let Some(user) = tolerate_conflict(
                client.create_user(&new_user).await,
                &mut report,
                "user",
                &new_user.email,
            )?
            else {
                continue;
            };
            report.record(Action::Created, "user", &user.id, &user.email);

            client
                .create_membership(&team.id, &user.id, &["member"])
                .await?;
            report.record(
                Action::Created,
                "membership",
                &user.id,
                format!("{} -> {}", user.name, team.name),
            );
        }

        let db = client.create_database(UNIQUE_ID, &company).await?;
        report.record(Action::Created, "database", &db.id, &db.name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::prompt::scripted::{Answer, ScriptedPrompter};
    use crate::config::{GlobalOptions, ToolOptions};
    use crate::tools::mock_api::{MockApi, Reply};

    fn with_projects(raw: Option<&str>) -> Options {
        Options::new(
            GlobalOptions {
                projects: raw.map(|s| s.to_string()),
                ..GlobalOptions::default()
            },
            ToolOptions::new(),
        )
    }

    #[test]
    fn project_count_defaults_to_one() {
        assert_eq!(project_count(&with_projects(None)).unwrap(), 1);
        assert_eq!(project_count(&with_projects(Some("4"))).unwrap(), 4);
        assert_eq!(
            project_count(&with_projects(Some("5000000000"))).unwrap(),
            5_000_000_000
        );
    }

    #[test]
    fn project_count_rejects_garbage() {
        let err = project_count(&with_projects(Some("abc"))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidProjects(ref v) if v == "abc"));
    }

    #[test]
    fn invalid_projects_fails_before_prompting() {
        let o = with_projects(Some("zero"));
        let mut p = ScriptedPrompter::new([Answer::Text("demo".into())]);
        assert!(prepare(&o, &mut p).is_err());
        assert!(p.asked.is_empty());
    }

    #[test]
    fn declining_confirmation_aborts() {
        let mut tool = ToolOptions::new();
        tool.insert("project".into(), "demo".into());
        tool.insert("key".into(), "secret".into());
        let o = Options::new(GlobalOptions::default(), tool);
        let mut p = ScriptedPrompter::new([Answer::Confirm(false)]);
        assert!(matches!(prepare(&o, &mut p), Err(ToolError::Aborted)));
    }

    #[test]
    fn seeded_data_is_deterministic() {
        let mut a = FakeData::seeded(7);
        let mut b = FakeData::seeded(7);
        assert_eq!(a.company(), b.company());
        let (ua, ub) = (a.user(), b.user());
        assert_eq!(ua.email, ub.email);
        assert_eq!(ua.password, ub.password);
    }

    #[test]
    fn seed_value_parsing() {
        let mut a = FakeData::from_seed_value(Some(" 99 ".into()));
        let mut b = FakeData::seeded(99);
        assert_eq!(a.company(), b.company());
        // Non-numeric seeds fall back to entropy rather than failing.
        let _ = FakeData::from_seed_value(Some("abc".into())).company();
    }

    #[test]
    fn fake_user_shape() {
        let mut data = FakeData::seeded(42);
        let user = data.user();
        assert_eq!(user.user_id, UNIQUE_ID);
        assert!(user.email.ends_with("@example.com"));
        assert_eq!(user.email, user.email.to_ascii_lowercase());
        assert_eq!(user.password.len(), PASSWORD_LEN);
        assert!(user.password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(user.name.split(' ').count(), 2);
    }

    /// Answers like Appwrite; the `conflict_on`-th user creation gets a 409.
    fn faker_api(conflict_on: usize) -> MockApi {
        let mut users = 0;
        MockApi::start(move |line, _| match line {
            "POST /teams" => Reply::ok(r#"{"$id":"t1","name":"Team"}"#),
            "POST /users" => {
                users += 1;
                if users == conflict_on {
                    Reply::conflict()
                } else {
                    Reply::ok(format!(
                        r#"{{"$id":"u{users}","name":"User {users}","email":"u{users}@example.com"}}"#
                    ))
                }
            }
            "POST /teams/t1/memberships" => Reply::ok("{}"),
            "POST /databases" => Reply::ok(r#"{"$id":"d1","name":"Db"}"#),
            _ => Reply::error(404),
        })
    }

    #[tokio::test]
    async fn execute_seeds_every_round() {
        let api = faker_api(0);
        let plan = FakerPlan {
            client: api.client(),
            projects: 2,
            users_per_project: 2,
            data: FakeData::seeded(3),
        };
        let report = execute(plan).await.unwrap();

        let round = [
            "POST /teams",
            "POST /users",
            "POST /teams/t1/memberships",
            "POST /users",
            "POST /teams/t1/memberships",
            "POST /databases",
        ];
        let expected: Vec<String> = round.iter().chain(round.iter()).map(|s| s.to_string()).collect();
        assert_eq!(api.lines(), expected);

        let resources: Vec<&str> = report.rows.iter().map(|r| r.resource).collect();
        assert_eq!(resources.iter().filter(|r| **r == "team").count(), 2);
        assert_eq!(resources.iter().filter(|r| **r == "user").count(), 4);
        assert_eq!(resources.iter().filter(|r| **r == "membership").count(), 4);
        assert_eq!(resources.iter().filter(|r| **r == "database").count(), 2);
        assert_eq!(report.count(Action::Skipped), 0);

        let membership = api
            .requests()
            .into_iter()
            .find(|r| r.line == "POST /teams/t1/memberships")
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&membership.body).unwrap();
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["roles"][0], "member");
    }

    #[tokio::test]
    async fn existing_user_is_skipped_without_membership() {
        let api = faker_api(2);
        let plan = FakerPlan {
            client: api.client(),
            projects: 1,
            users_per_project: 3,
            data: FakeData::seeded(5),
        };
        let report = execute(plan).await.unwrap();

        assert_eq!(
            api.lines(),
            vec![
                "POST /teams",
                "POST /users",
                "POST /teams/t1/memberships",
                "POST /users",
                "POST /users",
                "POST /teams/t1/memberships",
                "POST /databases",
            ]
        );
        assert_eq!(report.count(Action::Skipped), 1);
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("already exists"));
    }

    #[tokio::test]
    async fn server_error_fails_the_run() {
        let api = MockApi::start(|_, _| Reply::error(500));
        let plan = FakerPlan {
            client: api.client(),
            projects: 3,
            users_per_project: 1,
            data: FakeData::seeded(9),
        };
        let err = execute(plan).await.unwrap_err();
        assert!(matches!(err, ToolError::Api(ref e) if e.status() == Some(500)));
        assert_eq!(api.lines(), vec!["POST /teams"]);
    }

    #[test]
    fn company_has_two_words() {
        let mut data = FakeData::seeded(1);
        let name = data.company();
        let words: Vec<&str> = name.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(ADJECTIVES.contains(&words[0]));
        assert!(NOUNS.contains(&words[1]));
    }
}
