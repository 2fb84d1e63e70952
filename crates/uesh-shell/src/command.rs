//! Command definitions: flags, handlers and the context they run in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bitflags::bitflags;
use uesh_editor::EditorSet;
use uesh_types::config::UserConfig;
use uesh_types::error::Result;
use uesh_types::kind::ShellType;

use crate::argument::ArgumentSpec;
use crate::input::InputSource;
use crate::parser::ParsedCommandLine;
use crate::registry::CommandRegistry;
use crate::session::ShellSession;

bitflags! {
    /// Behavior flags checked by the dispatcher.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: u8 {
        /// Administrator only.
        const STRICT          = 1 << 0;
        /// Result may be stored into a session variable with `-set=NAME`.
        const SETTING_VARIABLE = 1 << 1;
        /// Refused while maintenance mode is active.
        const NO_MAINTENANCE  = 1 << 2;
        /// Kept for compatibility; hidden from `help`.
        const OBSOLETE        = 1 << 3;
    }
}

/// A shell transition requested by a handler, applied after it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellSignal {
    /// Push a new session of this type.
    Enter(ShellType),
    /// Pop the active session.
    Exit,
    /// Execute a script file line by line.
    RunScript(PathBuf),
    /// Toggle maintenance mode.
    SetMaintenance(bool),
}

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    /// The active session.
    pub session: &'a mut ShellSession,
    pub editors: &'a mut EditorSet,
    /// Read-only view of the registry, for `help`.
    pub registry: &'a CommandRegistry,
    pub input: &'a mut dyn InputSource,
    pub user: &'a UserConfig,
    pub hostname: &'a str,
    /// Directory a bare `cd` returns to.
    pub home: &'a Path,
    pub maintenance: bool,
    /// Lines to show the user.
    pub output: Vec<String>,
    pub signals: Vec<ShellSignal>,
    /// Result of a `SETTING_VARIABLE` command.
    pub variable_output: Option<String>,
}

impl CommandContext<'_> {
    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn signal(&mut self, signal: ShellSignal) {
        self.signals.push(signal);
    }

    /// Resolve a user-typed path against the session's working directory.
    pub fn resolve_path(&self, input: &str) -> PathBuf {
        let path = Path::new(input);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.session.cwd).join(path)
        }
    }
}

/// Signature of a built-in command.
pub type BuiltinFn = fn(&ParsedCommandLine, &mut CommandContext<'_>) -> Result<i32>;

/// A command registered at runtime by an addon.
pub trait AddonCommand: Send + Sync {
    fn execute(&self, line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32>;
}

impl<F> AddonCommand for F
where
    F: Fn(&ParsedCommandLine, &mut CommandContext<'_>) -> Result<i32> + Send + Sync,
{
    fn execute(&self, line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
        self(line, ctx)
    }
}

/// How a command runs.
#[derive(Clone)]
pub enum CommandHandler {
    Builtin(BuiltinFn),
    Addon(Arc<dyn AddonCommand>),
}

impl CommandHandler {
    pub fn invoke(&self, line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
        match self {
            Self::Builtin(f) => f(line, ctx),
            Self::Addon(cmd) => cmd.execute(line, ctx),
        }
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(_) => f.write_str("Builtin"),
            Self::Addon(_) => f.write_str("Addon"),
        }
    }
}

/// A command bound to a shell type.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub name: String,
    pub shell_type: ShellType,
    pub description: String,
    pub args: ArgumentSpec,
    pub handler: CommandHandler,
    pub flags: CommandFlags,
}

impl CommandInfo {
    pub fn builtin(
        name: &str,
        shell_type: ShellType,
        description: &str,
        args: ArgumentSpec,
        handler: BuiltinFn,
    ) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            shell_type,
            description: description.to_string(),
            args,
            handler: CommandHandler::Builtin(handler),
            flags: CommandFlags::empty(),
        }
    }

    pub fn addon(
        name: &str,
        shell_type: ShellType,
        description: &str,
        args: ArgumentSpec,
        handler: impl AddonCommand + 'static,
    ) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            shell_type,
            description: description.to_string(),
            args,
            handler: CommandHandler::Addon(Arc::new(handler)),
            flags: CommandFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn has(&self, flag: CommandFlags) -> bool {
        self.flags.contains(flag)
    }
}
