/*!
Command layer: everything between argv and a tool run.

Layout:
  src/cmd/
    mod.rs       (this file)
    registry.rs  ToolKind + ToolDescriptor + REGISTRY (source of truth for sub-commands and menu)
    dispatch.rs  Cli flags, sub-command construction, parsing, settings resolution, direct runs
    wizard.rs    interactive fallback loop
    prompt.rs    Prompter trait + dialoguer implementation
    format.rs    banner / box / table helpers for human output

Conventions:
  - Tool actions are reached only through `tools::ToolRunner`.
  - Anything printed for humans goes through `format.rs`; logs go through `utils::logging`.
*/

pub mod dispatch;
pub mod format;
pub mod prompt;
pub mod registry;
pub mod wizard;

pub use dispatch::{Invocation, emit_debug, parse_args, resolve, run_direct};
pub use wizard::Wizard;
