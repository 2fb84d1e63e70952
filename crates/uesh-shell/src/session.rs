//! One running shell instance.

use std::collections::BTreeMap;
use std::fmt;

use uesh_types::error::{Result, UeshError};
use uesh_types::kind::ShellType;

/// Identity of a session for the lifetime of its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An alias: target command plus fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub command: String,
    pub args: Vec<String>,
}

impl Alias {
    /// Parse `name=target [args...]` from alias arguments.
    pub fn parse(args: &[String]) -> Result<(String, Self)> {
        let first = args
            .first()
            .ok_or_else(|| UeshError::Parse("alias: expected name=command".to_string()))?;
        let (name, target) = first
            .split_once('=')
            .ok_or_else(|| UeshError::Parse(format!("alias: '{first}' is not name=command")))?;
        if name.is_empty() || target.is_empty() {
            return Err(UeshError::Parse(format!(
                "alias: '{first}' needs both a name and a command"
            )));
        }
        Ok((
            name.to_ascii_lowercase(),
            Self {
                command: target.to_ascii_lowercase(),
                args: args[1..].to_vec(),
            },
        ))
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A running shell: its type, aliases, variables and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSession {
    id: SessionId,
    shell_type: ShellType,
    pub aliases: BTreeMap<String, Alias>,
    pub variables: BTreeMap<String, String>,
    pub cwd: String,
}

impl ShellSession {
    pub(crate) fn new(id: SessionId, shell_type: ShellType, cwd: String) -> Self {
        Self {
            id,
            shell_type,
            aliases: BTreeMap::new(),
            variables: BTreeMap::new(),
            cwd,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn shell_type(&self) -> ShellType {
        self.shell_type
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<String>) {
        self.variables.insert(name.to_string(), value.into());
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}
