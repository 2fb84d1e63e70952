//! Command registry partitioned by shell type.
//!
//! Each shell type has a built-in table and a mod table. Lookups try the
//! mod table first, so addon commands can shadow built-ins.

use std::collections::{BTreeMap, HashMap};

use uesh_types::error::{Result, UeshError};
use uesh_types::kind::ShellType;

use crate::command::{CommandFlags, CommandInfo};

/// Which table a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Builtin,
    Mod,
}

type Partition = HashMap<ShellType, BTreeMap<String, CommandInfo>>;

/// Registry of available commands with shell-type partitions.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    builtin: Partition,
    mods: Partition,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with every built-in catalog.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry)?;
        Ok(registry)
    }

    /// Register a built-in command.
    pub fn register(&mut self, info: CommandInfo) -> Result<()> {
        insert(&mut self.builtin, info, CommandSource::Builtin)
    }

    /// Register an addon command into the mod table.
    pub fn register_mod(&mut self, info: CommandInfo) -> Result<()> {
        let (name, shell_type) = (info.name.clone(), info.shell_type);
        insert(&mut self.mods, info, CommandSource::Mod)?;
        log::info!("loaded mod command '{name}' ({shell_type})");
        Ok(())
    }

    /// Remove one addon command.
    pub fn unregister_mod(&mut self, shell_type: ShellType, name: &str) -> Result<CommandInfo> {
        let name = name.to_ascii_lowercase();
        self.mods
            .get_mut(&shell_type)
            .and_then(|table| table.remove(&name))
            .inspect(|_| log::info!("unloaded mod command '{name}' ({shell_type})"))
            .ok_or_else(|| {
                UeshError::Registry(format!("no mod command '{name}' for the {shell_type} shell"))
            })
    }

    /// Remove several addon commands, returning how many existed.
    pub fn remove_mod_commands<'n>(
        &mut self,
        shell_type: ShellType,
        names: impl IntoIterator<Item = &'n str>,
    ) -> usize {
        names
            .into_iter()
            .filter(|name| self.unregister_mod(shell_type, name).is_ok())
            .count()
    }

    /// Resolve a command, mod table first.
    pub fn lookup(&self, shell_type: ShellType, name: &str) -> Option<(&CommandInfo, CommandSource)> {
        let name = name.to_ascii_lowercase();
        if let Some(info) = self.mods.get(&shell_type).and_then(|t| t.get(&name)) {
            return Some((info, CommandSource::Mod));
        }
        self.builtin
            .get(&shell_type)
            .and_then(|t| t.get(&name))
            .map(|info| (info, CommandSource::Builtin))
    }

    pub fn contains(&self, shell_type: ShellType, name: &str) -> bool {
        self.lookup(shell_type, name).is_some()
    }

    /// Commands visible in `shell_type`, sorted by name, mod entries
    /// shadowing built-ins. Obsolete commands are left out.
    pub fn list(&self, shell_type: ShellType) -> Vec<&CommandInfo> {
        let mut merged: BTreeMap<&str, &CommandInfo> = BTreeMap::new();
        for partition in [&self.builtin, &self.mods] {
            if let Some(table) = partition.get(&shell_type) {
                for (name, info) in table {
                    merged.insert(name.as_str(), info);
                }
            }
        }
        merged
            .into_values()
            .filter(|info| !info.has(CommandFlags::OBSOLETE))
            .collect()
    }

    /// Command names in `shell_type` starting with `partial`.
    pub fn completions(&self, shell_type: ShellType, partial: &str) -> Vec<String> {
        let lower = partial.to_ascii_lowercase();
        self.list(shell_type)
            .into_iter()
            .filter(|info| info.name.starts_with(&lower))
            .map(|info| info.name.clone())
            .collect()
    }

    /// Number of commands registered for `shell_type` across both tables.
    pub fn len(&self, shell_type: ShellType) -> usize {
        self.list(shell_type).len()
    }
}

fn insert(partition: &mut Partition, info: CommandInfo, source: CommandSource) -> Result<()> {
    if info.name.is_empty() || info.name.chars().any(char::is_whitespace) {
        return Err(UeshError::Registry(format!("invalid command name '{}'", info.name)));
    }
    info.args.validate(&info.name)?;
    let table = partition.entry(info.shell_type).or_default();
    if table.contains_key(&info.name) {
        let kind = match source {
            CommandSource::Builtin => "built-in",
            CommandSource::Mod => "mod",
        };
        return Err(UeshError::Registry(format!(
            "{kind} command '{}' already registered for the {} shell",
            info.name, info.shell_type
        )));
    }
    table.insert(info.name.clone(), info);
    Ok(())
}
