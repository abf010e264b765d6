/*!
Tool actions and the runner that drives them.

Every tool has two phases:
  prepare  (sync)   resolve credentials, ask confirmations through a `Prompter`
  execute  (async)  sequential Appwrite API calls

Failures come back as `ToolError` values; callers decide how to report them.

Submodules:
  faker      fake users / teams / databases
  bootstrap  starter database, collection, bucket, team
  wiper      delete everything in a project
*/

use anyhow::{Context, Result};
use thiserror::Error;

use crate::appwrite::{ApiError, Client};
use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::ToolKind;
use crate::config::{self, ENV_KEY, ENV_PROJECT, Options};

pub mod bootstrap;
pub mod faker;
pub mod wiper;

#[cfg(test)]
pub(crate) mod mock_api;

/* ---- Errors ---- */

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing {what}: pass --{flag}, set {env}, or add `{flag}` to the config file")]
    MissingCredential {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("aborted by user")]
    Aborted,

    #[error("invalid --projects value '{0}': must be a positive integer")]
    InvalidProjects(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl ToolError {
    /// Declining a confirmation is not a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ToolError::Aborted)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_failure() { 1 } else { 0 }
    }
}

/// Lift a prompt I/O error into the tool error space.
pub(crate) fn prompt_err(e: anyhow::Error) -> ToolError {
    ToolError::Prompt(format!("{e:#}"))
}

/* ---- Report ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Deleted,
    Skipped,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Deleted => "deleted",
            Action::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub action: Action,
    pub resource: &'static str,
    pub id: String,
    pub name: String,
}

/// What a tool run did.
#[derive(Debug, Clone)]
pub struct ToolReport {
    pub tool: ToolKind,
    pub project: String,
    pub rows: Vec<ReportRow>,
    pub notes: Vec<String>,
}

impl ToolReport {
    pub fn new(tool: ToolKind, project: impl Into<String>) -> Self {
        Self {
            tool,
            project: project.into(),
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        action: Action,
        resource: &'static str,
        id: impl Into<String>,
        name: impl Into<String>,
    ) {
        let (id, name) = (id.into(), name.into());
        crate::log_info!("{} {resource} {id} {name}", action.as_str());
        self.rows.push(ReportRow {
            action,
            resource,
            id,
            name,
        });
    }

    pub fn note(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        crate::log_debug!("note: {msg}");
        self.notes.push(msg);
    }

    pub fn count(&self, action: Action) -> usize {
        self.rows.iter().filter(|r| r.action == action).count()
    }

    pub fn render(&self, style: &StyleOptions) -> String {
        let d = self.tool.descriptor();
        let mut out = box_header(
            format!("{} {} finished", emoji("success", style), d.name).trim(),
            Some(format!(
                "project={} • created {} • deleted {} • skipped {}",
                self.project,
                self.count(Action::Created),
                self.count(Action::Deleted),
                self.count(Action::Skipped),
            )),
            style,
        );
        if self.rows.is_empty() {
            out.push('\n');
            out.push_str(&color(Role::Dim, "(nothing to do)", style));
        } else {
            let rows: Vec<Vec<String>> = self
                .rows
                .iter()
                .map(|r| {
                    vec![
                        r.action.as_str().to_string(),
                        r.resource.to_string(),
                        r.id.clone(),
                        if r.name.is_empty() { "-".into() } else { r.name.clone() },
                    ]
                })
                .collect();
            out.push('\n');
            out.push_str(&table(&["ACTION", "RESOURCE", "ID", "NAME"], &rows, style));
        }
        for n in &self.notes {
            out.push('\n');
            out.push_str(&format!("{} {n}", emoji("info", style)).trim_start().to_string());
        }
        out
    }
}

/// Keep going when a resource already exists (HTTP 409); anything else fails the run.
pub(crate) fn tolerate_conflict<T>(
    res: Result<T, ApiError>,
    report: &mut ToolReport,
    resource: &'static str,
    id: &str,
) -> Result<Option<T>, ToolError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_conflict() => {
            report.record(Action::Skipped, resource, id, "");
            report.note(format!("{resource} '{id}' already exists"));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/* ---- Credentials ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub project: String,
    pub key: String,
}

/// Tool option > environment > config file > prompt (prompt skipped with `--auto`).
pub fn resolve_credentials(
    options: &Options,
    prompter: &mut dyn Prompter,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ToolError> {
    let file = options.global.file.as_ref();

    let project = options
        .tool_value("project")
        .map(|s| s.to_string())
        .or_else(|| env(ENV_PROJECT))
        .or_else(|| file.and_then(|f| f.project.clone()));
    let project = match project {
        Some(p) => p,
        None if options.global.auto => {
            return Err(ToolError::MissingCredential {
                what: "project ID",
                flag: "project",
                env: ENV_PROJECT,
            });
        }
        None => prompter.input("Project ID").map_err(prompt_err)?,
    };
    if project.trim().is_empty() {
        return Err(ToolError::MissingCredential {
            what: "project ID",
            flag: "project",
            env: ENV_PROJECT,
        });
    }

    let key = options
        .tool_value("key")
        .map(|s| s.to_string())
        .or_else(|| env(ENV_KEY))
        .or_else(|| file.and_then(|f| f.key.clone()));
    let key = match key {
        Some(k) => k,
        None if options.global.auto => {
            return Err(ToolError::MissingCredential {
                what: "API key",
                flag: "key",
                env: ENV_KEY,
            });
        }
        None => prompter.secret("API key").map_err(prompt_err)?,
    };
    if key.trim().is_empty() {
        return Err(ToolError::MissingCredential {
            what: "API key",
            flag: "key",
            env: ENV_KEY,
        });
    }

    Ok(Credentials {
        project: project.trim().to_string(),
        key: key.trim().to_string(),
    })
}

/// Build an API client for the resolved credentials.
pub fn connect(options: &Options, creds: &Credentials) -> Result<Client, ToolError> {
    let endpoint = config::parse_endpoint(&options.global.endpoint)
        .map_err(|e| ToolError::Endpoint(format!("{e:#}")))?;
    crate::log_debug!("endpoint={} project={}", endpoint, creds.project);
    Ok(Client::new(&endpoint, &creds.project, &creds.key)?)
}

/// Ask for a yes/no unless `--auto` is set (which answers `auto_answer`).
pub(crate) fn confirm_unless_auto(
    options: &Options,
    prompter: &mut dyn Prompter,
    prompt: &str,
    default: bool,
    auto_answer: bool,
) -> Result<(), ToolError> {
    let yes = if options.global.auto {
        auto_answer
    } else {
        prompter.confirm(prompt, default).map_err(prompt_err)?
    };
    if yes { Ok(()) } else { Err(ToolError::Aborted) }
}

/* ---- Runner ---- */

/// Runs one tool to completion. The wizard and `main` only talk to this.
pub trait ToolRunner {
    fn run(
        &mut self,
        kind: ToolKind,
        options: &Options,
        prompter: &mut dyn Prompter,
    ) -> Result<ToolReport, ToolError>;
}

/// Real runner: prepares synchronously, then drives the async API work on a
/// Tokio runtime created once per process.
pub struct ApiRunner {
    rt: tokio::runtime::Runtime,
}

impl ApiRunner {
    pub fn new() -> Result<Self> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        Ok(Self { rt })
    }
}

impl ToolRunner for ApiRunner {
    fn run(
        &mut self,
        kind: ToolKind,
        options: &Options,
        prompter: &mut dyn Prompter,
    ) -> Result<ToolReport, ToolError> {
        crate::log_debug!("running tool {kind}");
        match kind {
            ToolKind::Faker => {
                let plan = faker::prepare(options, prompter)?;
                self.rt.block_on(faker::execute(plan))
            }
            ToolKind::Bootstrap => {
                let plan = bootstrap::prepare(options, prompter)?;
                self.rt.block_on(bootstrap::execute(plan))
            }
            ToolKind::Wiper => {
                let plan = wiper::prepare(options, prompter)?;
                self.rt.block_on(wiper::execute(plan))
            }
        }
    }
}
