/*!
Interactive prompts behind a trait so the wizard and tools can be driven by a
script in tests.

  - Prompter       select / confirm / input / secret
  - TermPrompter   dialoguer-backed implementation used by the binary
*/

use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

pub trait Prompter {
    /// Pick one of `items`; returns its index.
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    fn input(&mut self, prompt: &str) -> Result<String>;
    /// Hidden input (API keys).
    fn secret(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal prompts (stderr) via dialoguer.
pub struct TermPrompter {
    theme: ColorfulTheme,
}

impl TermPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TermPrompter {
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .context("Failed to read menu selection")
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("Failed to read confirmation")
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()
            .context("Failed to read input")
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()
            .context("Failed to read secret input")
    }
}


#[cfg(test)]
mod tests {
    use super::Prompter;
    use super::scripted::{Answer, ScriptedPrompter};

    #[test]
    fn scripted_answers_in_order() {
        let mut p = ScriptedPrompter::new([
            Answer::Select(1),
            Answer::Confirm(true),
            Answer::Text("demo".into()),
        ]);
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(p.select("pick", &items, 0).unwrap(), 1);
        assert!(p.confirm("sure?", false).unwrap());
        assert_eq!(p.input("name").unwrap(), "demo");
        assert_eq!(p.asked, vec!["pick", "sure?", "name"]);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn empty_text_takes_confirm_default() {
        let mut p = ScriptedPrompter::new([Answer::Text(String::new())]);
        assert!(!p.confirm("again?", false).unwrap());
    }

    #[test]
    fn exhausted_script_is_error() {
        let mut p = ScriptedPrompter::new([]);
        assert!(p.input("anything").is_err());
    }

    #[test]
    fn out_of_range_selection_is_error() {
        let mut p = ScriptedPrompter::new([Answer::Select(5)]);
        assert!(p.select("pick", &["only".to_string()], 0).is_err());
    }
}
