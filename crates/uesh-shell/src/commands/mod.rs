//! Built-in command catalogs.
//!
//! Each catalog is a list of `(name, description, args, handler, flags)`
//! rows registered into one shell-type partition.

mod common;
mod hex;
mod json;
mod main_shell;
mod text;

use uesh_editor::Scope;
use uesh_editor::position::parse_position;
use uesh_types::error::Result;
use uesh_types::kind::ShellType;

use crate::argument::ArgumentSpec;
use crate::command::{BuiltinFn, CommandFlags, CommandInfo};
use crate::parser::ParsedCommandLine;
use crate::registry::CommandRegistry;

/// One catalog row.
pub(crate) struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub args: ArgumentSpec,
    pub handler: BuiltinFn,
    pub flags: CommandFlags,
}

impl Builtin {
    pub(crate) fn new(
        name: &'static str,
        description: &'static str,
        args: ArgumentSpec,
        handler: BuiltinFn,
    ) -> Self {
        Self {
            name,
            description,
            args,
            handler,
            flags: CommandFlags::empty(),
        }
    }

    pub(crate) fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }
}

fn register_catalog(
    registry: &mut CommandRegistry,
    shell_type: ShellType,
    catalog: Vec<Builtin>,
) -> Result<()> {
    for b in catalog {
        registry.register(
            CommandInfo::builtin(b.name, shell_type, b.description, b.args, b.handler)
                .with_flags(b.flags),
        )?;
    }
    Ok(())
}

/// Register every built-in catalog.
pub fn register_builtins(registry: &mut CommandRegistry) -> Result<()> {
    for shell in [
        ShellType::Main,
        ShellType::TextEditor,
        ShellType::JsonEditor,
        ShellType::HexEditor,
    ] {
        register_catalog(registry, shell, common::catalog())?;
    }
    register_catalog(registry, ShellType::Main, main_shell::catalog())?;
    register_catalog(registry, ShellType::TextEditor, text::catalog())?;
    register_catalog(registry, ShellType::JsonEditor, json::catalog())?;
    register_catalog(registry, ShellType::HexEditor, hex::catalog())?;
    log::debug!("built-in commands registered");
    Ok(())
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Required 1-based position at `index`.
pub(crate) fn position_arg(line: &ParsedCommandLine, index: usize, unit: &str) -> Result<usize> {
    parse_position(line.arg(index).unwrap_or_default(), unit)
}

/// Optional 1-based position at `index`.
pub(crate) fn optional_position(
    line: &ParsedCommandLine,
    index: usize,
    unit: &str,
) -> Result<Option<usize>> {
    line.arg(index).map(|a| parse_position(a, unit)).transpose()
}

/// Scope from optional `[start] [end]` arguments beginning at `index`.
pub(crate) fn scope_from(line: &ParsedCommandLine, index: usize, unit: &str) -> Result<Scope> {
    Ok(Scope::from_bounds(
        optional_position(line, index, unit)?,
        optional_position(line, index + 1, unit)?,
    ))
}

/// `all` or a single 1-based position.
pub(crate) fn unit_or_all(text: &str, unit: &str) -> Result<Scope> {
    if text.eq_ignore_ascii_case("all") {
        Ok(Scope::All)
    } else {
        parse_position(text, unit).map(Scope::Unit)
    }
}

/// `save [-clear]`: whether the live content is emptied after writing.
pub(crate) fn clear_after_save(line: &ParsedCommandLine) -> bool {
    line.has_switch("clear")
}

/// Plural suffix for counts in messages.
pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
