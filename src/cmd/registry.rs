/*!
Tool registry: the one list both the sub-command surface and the wizard
menu are built from.

Items:
  - ToolKind        closed set of tools (dispatch is a `match`, not a lookup table of closures)
  - RequiredOption  flag name + help for a mandatory sub-command option
  - ToolDescriptor  static record per tool
  - REGISTRY        ordered descriptors
  - find / menu_choices / MenuChoice
*/

use std::fmt;

use crate::config::{ENV_KEY, ENV_PROJECT};

/// Every tool the toolkit ships.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ToolKind {
    Faker,
    Bootstrap,
    Wiper,
}

impl ToolKind {
    pub fn descriptor(&self) -> &'static ToolDescriptor {
        match self {
            ToolKind::Faker => &REGISTRY[0],
            ToolKind::Bootstrap => &REGISTRY[1],
            ToolKind::Wiper => &REGISTRY[2],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().value)
    }
}

/// A mandatory `--<long> <VALUE>` option on a tool's sub-command. `env`
/// satisfies it when the flag is absent.
#[derive(Debug, PartialEq, Eq)]
pub struct RequiredOption {
    pub long: &'static str,
    pub value_name: &'static str,
    pub help: &'static str,
    pub env: &'static str,
}

#[derive(Debug)]
pub struct ToolDescriptor {
    /// Menu label.
    pub name: &'static str,
    /// Sub-command name and menu value. Unique across the registry.
    pub value: &'static str,
    pub description: &'static str,
    pub required_options: &'static [RequiredOption],
    pub kind: ToolKind,
}

const PROJECT_OPTION: RequiredOption = RequiredOption {
    long: "project",
    value_name: "PROJECT_ID",
    help: "Appwrite project ID",
    env: ENV_PROJECT,
};

const KEY_OPTION: RequiredOption = RequiredOption {
    long: "key",
    value_name: "API_KEY",
    help: "Appwrite API key with the scopes the tool needs",
    env: ENV_KEY,
};

pub static REGISTRY: [ToolDescriptor; 3] = [
    ToolDescriptor {
        name: "Faker",
        value: "faker",
        description: "Generate fake users, teams and databases in a project",
        required_options: &[PROJECT_OPTION, KEY_OPTION],
        kind: ToolKind::Faker,
    },
    ToolDescriptor {
        name: "Bootstrap",
        value: "bootstrap",
        description: "Create starter resources (database, collection, bucket, team)",
        required_options: &[PROJECT_OPTION, KEY_OPTION],
        kind: ToolKind::Bootstrap,
    },
    ToolDescriptor {
        name: "Wiper",
        value: "wiper",
        description: "Delete all users, teams, databases and buckets in a project",
        required_options: &[PROJECT_OPTION, KEY_OPTION],
        kind: ToolKind::Wiper,
    },
];

/// Look a descriptor up by its sub-command / menu value.
pub fn find(value: &str) -> Option<&'static ToolDescriptor> {
    REGISTRY.iter().find(|d| d.value == value)
}

/* ---- Wizard menu ---- */

/// One line of the wizard menu: a tool, or the trailing "Exit" sentinel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuChoice {
    Tool(ToolKind),
    Exit,
}

impl MenuChoice {
    pub fn label(&self) -> String {
        match self {
            MenuChoice::Tool(kind) => {
                let d = kind.descriptor();
                format!("{} - {}", d.name, d.description)
            }
            MenuChoice::Exit => "Exit".to_string(),
        }
    }
}

/// Registry entries in order, then `Exit`.
pub fn menu_choices() -> Vec<MenuChoice> {
    REGISTRY
        .iter()
        .map(|d| MenuChoice::Tool(d.kind))
        .chain(std::iter::once(MenuChoice::Exit))
        .collect()
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn values_are_unique() {
        let values: HashSet<&str> = REGISTRY.iter().map(|d| d.value).collect();
        assert_eq!(values.len(), REGISTRY.len());
    }

    #[test]
    fn kind_and_descriptor_agree() {
        for d in REGISTRY.iter() {
            assert_eq!(d.kind.descriptor().value, d.value);
        }
    }

    #[test]
    fn find_by_value() {
        assert_eq!(find("wiper").map(|d| d.kind), Some(ToolKind::Wiper));
        assert!(find("exit").is_none());
        assert!(find("Faker").is_none());
    }

    #[test]
    fn menu_ends_with_exit() {
        let menu = menu_choices();
        assert_eq!(menu.len(), REGISTRY.len() + 1);
        assert_eq!(menu.last(), Some(&MenuChoice::Exit));
        assert_eq!(menu[0], MenuChoice::Tool(ToolKind::Faker));
    }

    #[test]
    fn labels() {
        assert_eq!(MenuChoice::Exit.label(), "Exit");
        assert!(MenuChoice::Tool(ToolKind::Bootstrap).label().starts_with("Bootstrap"));
        assert_eq!(ToolKind::Faker.to_string(), "faker");
    }
}
