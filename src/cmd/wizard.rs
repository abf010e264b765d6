/*!
Interactive wizard: the fallback when no sub-command is given.

State machine:

  AwaitingValidation -> SelectingTool -> RunningTool -> ConfirmingContinue
                              ^                               |
                              +------------- yes -------------+
  any "Exit" / "no" / validation error -> Terminated

A failing tool does not end the session: the error is printed and the user
is still asked whether to continue. The outcome remembers every run so `main`
can pick the exit code.
*/

use anyhow::{Result, anyhow};
use std::io::Write;

use crate::cmd::format::{Role, StyleOptions, banner, color, emoji};
use crate::cmd::prompt::Prompter;
use crate::cmd::registry::{MenuChoice, ToolKind, menu_choices};
use crate::config::{Options, parse_project_count};
use crate::tools::{ToolError, ToolRunner};

pub const SELECT_PROMPT: &str = "Which tool do you want to use?";
pub const CONTINUE_PROMPT: &str = "Do you want to use another tool?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    AwaitingValidation,
    SelectingTool,
    RunningTool(ToolKind),
    ConfirmingContinue,
    Terminated,
}

/// One tool invocation made by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub kind: ToolKind,
    /// `None` on success; otherwise the rendered error.
    pub error: Option<String>,
    pub failed: bool,
}

#[derive(Debug, Default)]
pub struct WizardOutcome {
    pub runs: Vec<ToolRun>,
    pub validation_failed: bool,
}

impl WizardOutcome {
    pub fn failures(&self) -> usize {
        self.runs.iter().filter(|r| r.failed).count()
    }

    /// 1 if any tool failed, else 0. A rejected `--projects` value is not a
    /// process failure.
    pub fn exit_code(&self) -> i32 {
        if self.failures() > 0 { 1 } else { 0 }
    }
}

pub struct Wizard<'a, P: Prompter, R: ToolRunner, W: Write> {
    options: &'a Options,
    prompter: &'a mut P,
    runner: &'a mut R,
    out: &'a mut W,
    style: StyleOptions,
}

impl<'a, P: Prompter, R: ToolRunner, W: Write> Wizard<'a, P, R, W> {
    pub fn new(
        options: &'a Options,
        prompter: &'a mut P,
        runner: &'a mut R,
        out: &'a mut W,
        style: StyleOptions,
    ) -> Self {
        Self {
            options,
            prompter,
            runner,
            out,
            style,
        }
    }

    /// Drive the state machine until `Terminated`.
    pub fn run(mut self) -> Result<WizardOutcome> {
        writeln!(self.out, "{}\n", banner(&self.style))?;

        let mut outcome = WizardOutcome::default();
        let mut state = WizardState::AwaitingValidation;
        while state != WizardState::Terminated {
            crate::log_trace!("wizard state: {state:?}");
            state = self.step(state, &mut outcome)?;
        }
        crate::log_debug!(
            "wizard finished: {} run(s), {} failure(s), projects rejected={}",
            outcome.runs.len(),
            outcome.failures(),
            outcome.validation_failed
        );
        self.summarize(&outcome)?;
        Ok(outcome)
    }

    /// Recap failed runs so errors scrolled past by later tools are not lost.
    fn summarize(&mut self, outcome: &WizardOutcome) -> Result<()> {
        if outcome.failures() == 0 {
            return Ok(());
        }
        writeln!(
            self.out,
            "{}",
            color(
                Role::Error,
                format!("{} tool run(s) failed:", outcome.failures()),
                &self.style
            )
        )?;
        for run in outcome.runs.iter().filter(|r| r.failed) {
            writeln!(
                self.out,
                "  - {}: {}",
                run.kind,
                run.error.as_deref().unwrap_or("unknown error")
            )?;
        }
        Ok(())
    }

    fn step(&mut self, state: WizardState, outcome: &mut WizardOutcome) -> Result<WizardState> {
        let next = match state {
            WizardState::AwaitingValidation => self.validate(outcome)?,
            WizardState::SelectingTool => self.select()?,
            WizardState::RunningTool(kind) => {
                outcome.runs.push(self.run_tool(kind)?);
                WizardState::ConfirmingContinue
            }
            WizardState::ConfirmingContinue => {
                if self.prompter.confirm(CONTINUE_PROMPT, false)? {
                    WizardState::SelectingTool
                } else {
                    WizardState::Terminated
                }
            }
            WizardState::Terminated => WizardState::Terminated,
        };
        Ok(next)
    }

    fn validate(&mut self, outcome: &mut WizardOutcome) -> Result<WizardState> {
        let Some(raw) = self.options.global.projects.as_deref() else {
            return Ok(WizardState::SelectingTool);
        };
        match parse_project_count(raw) {
            None => {
                writeln!(
                    self.out,
                    "{}",
                    color(
                        Role::Error,
                        "Error: Projects must be a positive integer!",
                        &self.style
                    )
                )?;
                outcome.validation_failed = true;
                Ok(WizardState::Terminated)
            }
            Some(n) => {
                if n > 1 {
                    writeln!(
                        self.out,
                        "{}",
                        color(
                            Role::Warning,
                            format!("Warning: Creating {n} projects!"),
                            &self.style
                        )
                    )?;
                }
                Ok(WizardState::SelectingTool)
            }
        }
    }

    fn select(&mut self) -> Result<WizardState> {
        let choices = menu_choices();
        let labels: Vec<String> = choices.iter().map(|c| c.label()).collect();
        let idx = self.prompter.select(SELECT_PROMPT, &labels, 0)?;
        let choice = choices.get(idx).copied().ok_or_else(|| {
            anyhow!("menu selection {idx} out of range (0..{})", choices.len())
        })?;
        Ok(match choice {
            MenuChoice::Exit => WizardState::Terminated,
            MenuChoice::Tool(kind) => WizardState::RunningTool(kind),
        })
    }

    fn run_tool(&mut self, kind: ToolKind) -> Result<ToolRun> {
        let result = self.runner.run(kind, self.options, &mut *self.prompter);
        let run = match result {
            Ok(report) => {
                writeln!(self.out, "{}", report.render(&self.style))?;
                ToolRun {
                    kind,
                    error: None,
                    failed: false,
                }
            }
            Err(ToolError::Aborted) => {
                writeln!(
                    self.out,
                    "{}",
                    color(Role::Dim, format!("{kind}: aborted, nothing changed"), &self.style)
                )?;
                ToolRun {
                    kind,
                    error: Some(ToolError::Aborted.to_string()),
                    failed: false,
                }
            }
            Err(e) => {
                crate::log_debug!("{kind} failed: {e:?}");
                writeln!(
                    self.out,
                    "{} {}",
                    emoji("error", &self.style),
                    color(Role::Error, format!("Error: {kind} failed: {e}"), &self.style)
                )?;
                ToolRun {
                    kind,
                    error: Some(e.to_string()),
                    failed: true,
                }
            }
        };
        Ok(run)
    }
}

/* --------------------------------- Tests ---------------------------------- */
