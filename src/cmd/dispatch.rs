/*!
Command dispatcher.

  Cli                 top-level flags (derive); global, so they are accepted after a sub-command too
  register_command    one clap sub-command per registry descriptor, required options enforced by clap
  build_command       Cli + every registered tool
  try_parse_from      argv -> Parsed (clap::Error on unknown flag / missing required option)
  resolve             Parsed -> Invocation (config file + env + endpoint validation)
  run_direct          run the matched tool once, report, return the exit code

Parse failures never reach a tool: clap prints usage and exits with status 2.
*/

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use crate::cmd::format::{Role, StyleOptions, banner, color, emoji};
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::{self, REGISTRY, ToolDescriptor, ToolKind};
use crate::config::{
    self, DEFAULT_ENDPOINT, ENV_CONFIG, ENV_ENDPOINT, GlobalOptions, Options, ToolOptions,
};
use crate::tools::{ToolError, ToolRunner};

/// Appwrite Toolkit - a suite of tools to aid in the development of Appwrite.
///
/// Run without a sub-command for the interactive wizard, or pick a tool:
///   appwrite-toolkit faker     --project <ID> --key <KEY> [--projects N]
///   appwrite-toolkit bootstrap --project <ID> --key <KEY>
///   appwrite-toolkit wiper     --project <ID> --key <KEY> [--auto]
///
/// Environment:
///   APPWRITE_PROJECT / APPWRITE_KEY   stand in for --project / --key
///   APPWRITE_ENDPOINT                 default for --endpoint
///   APPWRITE_TOOLKIT_CONFIG           YAML config file path
///
/// The config file supplies the endpoint everywhere; its project and key are
/// only used by the wizard, which prompts for anything still missing.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "appwrite-toolkit",
    version,
    verbatim_doc_comment,
    about = "A suite of tools to aid in the development of Appwrite.",
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Output extra debugging (prints the parsed options)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Auto-pick default values; never prompt
    #[arg(long, global = true)]
    pub auto: bool,

    /// Appwrite endpoint [default: https://cloud.appwrite.io/v1]
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Number of fake projects the faker creates
    #[arg(long, global = true, value_name = "COUNT")]
    pub projects: Option<String>,

    /// YAML config file (endpoint / project / key)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Result of argument parsing, before settings are resolved.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub cli: Cli,
    /// Matched sub-command and its required option values.
    pub tool: Option<(ToolKind, ToolOptions)>,
}

/// What `main` should do.
#[derive(Debug, Clone)]
pub enum Invocation {
    Tool { kind: ToolKind, options: Options },
    Wizard { options: Options },
}

impl Invocation {
    pub fn options(&self) -> &Options {
        match self {
            Invocation::Tool { options, .. } | Invocation::Wizard { options } => options,
        }
    }
}

/* ---- Command construction ---- */

/// Sub-command named after `descriptor.value` with each required option mandatory.
pub fn register_command(descriptor: &ToolDescriptor) -> Command {
    descriptor
        .required_options
        .iter()
        .fold(
            Command::new(descriptor.value).about(descriptor.description),
            |cmd, opt| {
                cmd.arg(
                    Arg::new(opt.long)
                        .long(opt.long)
                        .value_name(opt.value_name)
                        .help(opt.help)
                        .env(opt.env)
                        .hide_env_values(true)
                        .required(true)
                        .action(ArgAction::Set),
                )
            },
        )
}

pub fn build_command() -> Command {
    let base = Cli::command()
        .before_help(banner(&StyleOptions::plain()))
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Output the current version")
                .action(ArgAction::Version),
        );
    REGISTRY
        .iter()
        .fold(base, |cmd, d| cmd.subcommand(register_command(d)))
}

/* ---- Parsing ---- */

pub fn try_parse_from<I, T>(argv: I) -> Result<Parsed, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = build_command();
    let matches = command.try_get_matches_from_mut(argv)?;
    let cli = Cli::from_arg_matches(&matches)?;

    let tool = match matches.subcommand() {
        None => None,
        Some((name, sub)) => {
            let descriptor = registry::find(name).ok_or_else(|| {
                command.error(ErrorKind::InvalidSubcommand, format!("unknown tool '{name}'"))
            })?;
            let mut values = ToolOptions::new();
            for opt in descriptor.required_options {
                if let Some(v) = sub.get_one::<String>(opt.long) {
                    values.insert(opt.long.to_string(), v.clone());
                }
            }
            Some((descriptor.kind, values))
        }
    };

    Ok(Parsed { cli, tool })
}

/// Parse the process arguments; on failure print usage and exit (status 2,
/// or 0 for `--help` / `--version`).
pub fn parse_args() -> Parsed {
    try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}

/* ---- Settings ---- */

/// Load the config file, resolve the endpoint, build the options object.
pub fn resolve(parsed: Parsed, env: impl Fn(&str) -> Option<String>) -> Result<Invocation> {
    let cli = parsed.cli;
    let config_path = cli
        .config
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
    let file = config::load_file_config(config_path.as_deref())?;
    let endpoint =
        config::resolve_endpoint(cli.endpoint.as_deref(), env(ENV_ENDPOINT), file.as_ref())?;

    let global = GlobalOptions {
        debug: cli.debug,
        auto: cli.auto,
        quiet: cli.quiet,
        endpoint: config::endpoint_string(&endpoint),
        projects: cli.projects,
        config: config_path,
        file,
    };
    if global.endpoint != DEFAULT_ENDPOINT {
        crate::log_debug!("using endpoint {}", global.endpoint);
    }

    Ok(match parsed.tool {
        Some((kind, tool)) => Invocation::Tool {
            kind,
            options: Options::new(global, tool),
        },
        None => Invocation::Wizard {
            options: Options::new(global, ToolOptions::new()),
        },
    })
}

/// `--debug`: print the parsed options once. Returns whether anything was printed.
pub fn emit_debug(options: &Options, out: &mut impl Write) -> Result<bool> {
    if !options.global.debug {
        return Ok(false);
    }
    writeln!(out, "{}", options.debug_dump())?;
    Ok(true)
}

/* ---- Direct invocation ---- */

/// Run one tool from its sub-command and report. Returns the exit code.
pub fn run_direct<R: ToolRunner, P: Prompter, W: Write>(
    kind: ToolKind,
    options: &Options,
    runner: &mut R,
    prompter: &mut P,
    out: &mut W,
    style: &StyleOptions,
) -> Result<i32> {
    match runner.run(kind, options, prompter) {
        Ok(report) => {
            writeln!(out, "{}", report.render(style))?;
            Ok(0)
        }
        Err(ToolError::Aborted) => {
            writeln!(
                out,
                "{}",
                color(Role::Dim, format!("{kind}: aborted, nothing changed"), style)
            )?;
            Ok(ToolError::Aborted.exit_code())
        }
        Err(e) => {
            crate::log_error!("{kind} failed: {e}");
            writeln!(
                out,
                "{} {}",
                emoji("error", style),
                color(Role::Error, format!("Error: {kind} failed: {e}"), style)
            )?;
            Ok(e.exit_code())
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */
