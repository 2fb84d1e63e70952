//! Command interpreter for UESH.
//!
//! Input lines are split into `;`-separated segments, tokenized with
//! `$variable` substitution, and dispatched through a [`CommandRegistry`]
//! partitioned by shell type. Handlers run against a [`CommandContext`] and
//! request shell transitions through [`ShellSignal`]s, which the
//! [`ShellEnvironment`] applies to its [`ShellStack`].

pub mod argument;
pub mod command;
mod commands;
pub mod dispatcher;
pub mod environment;
pub mod input;
pub mod parser;
pub mod registry;
pub mod session;
pub mod stack;

pub use argument::ArgumentSpec;
pub use command::{AddonCommand, CommandContext, CommandFlags, CommandHandler, CommandInfo, ShellSignal};
pub use commands::register_builtins;
pub use dispatcher::{DispatchOutcome, dispatch};
pub use environment::{CommandReport, LineReport, ShellEnvironment};
pub use input::{InputSource, ScriptedInput};
pub use parser::{ParsedCommandLine, parse_line};
pub use registry::{CommandRegistry, CommandSource};
pub use session::{Alias, SessionId, ShellSession};
pub use stack::{PopOutcome, SessionState, ShellStack};
