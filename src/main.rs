use anyhow::Result;

mod appwrite;
mod cmd;
mod config;
mod tools;
mod utils;

use cmd::Invocation;
use cmd::format::StyleOptions;
use cmd::prompt::TermPrompter;

/// Appwrite Toolkit - fake data, starter resources and project wiping for Appwrite development.
///
/// Usage:
///   appwrite-toolkit                                      interactive wizard
///   appwrite-toolkit faker     --project <ID> --key <KEY> [--projects N]
///   appwrite-toolkit bootstrap --project <ID> --key <KEY>
///   appwrite-toolkit wiper     --project <ID> --key <KEY>
///
/// Global flags:
///   --debug            print parsed options, debug logging
///   --auto             never prompt (missing credentials become errors)
///   --endpoint <URL>   API base URL (APPWRITE_ENDPOINT, config file, default cloud)
///   --projects <N>     fake project count for the faker
///   --config <PATH>    YAML config (APPWRITE_TOOLKIT_CONFIG, ./appwrite-toolkit.yaml)
///   -q / --quiet       errors only
///
/// Exit codes: 0 ok (including wizard exit / declined confirmation), 1 tool failure,
/// 2 invalid arguments or configuration.
fn main() -> Result<()> {
    let parsed = cmd::parse_args();

    // Initialize logging
    let level = utils::derive_level(parsed.cli.debug, parsed.cli.quiet);
    utils::init_logging(level);

    let invocation = match cmd::resolve(parsed, config::env_value) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(2);
        }
    };

    let mut stdout = std::io::stdout();
    cmd::emit_debug(invocation.options(), &mut stdout)?;

    let style = StyleOptions::detect();
    let mut runner = tools::ApiRunner::new()?;
    let mut prompter = TermPrompter::new();

    let code = match invocation {
        Invocation::Tool { kind, options } => cmd::run_direct(
            kind,
            &options,
            &mut runner,
            &mut prompter,
            &mut stdout,
            &style,
        )?,
        Invocation::Wizard { options } => {
            let outcome =
                cmd::Wizard::new(&options, &mut prompter, &mut runner, &mut stdout, style).run()?;
            outcome.exit_code()
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
