//! Error types for UESH.

use std::io;

/// Errors produced by the UESH shell and editors.
#[derive(Debug, thiserror::Error)]
pub enum UeshError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}: not available while maintenance mode is active")]
    MaintenanceRestricted(String),

    #[error("{0}: permission denied (administrator required)")]
    PermissionDenied(String),

    #[error("{command}: not enough arguments")]
    InsufficientArguments {
        command: String,
        /// Usage variants, already prefixed with the command name.
        usages: Vec<String>,
    },

    #[error("{command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fatal: {0}")]
    Fatal(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, UeshError>;

/// Fault classification, independent of the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    UnknownCommand,
    MaintenanceRestricted,
    PermissionDenied,
    InsufficientArguments,
    CommandFailed,
    Io,
    OutOfRange,
    InvalidState,
    Parse,
    InvalidPattern,
    Registry,
    Config,
    Fatal,
}

impl FaultKind {
    /// Synthetic exit code reported for this fault class. Zero is reserved
    /// for success and never returned here.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::CommandFailed => 1,
            Self::InsufficientArguments => 2,
            Self::Parse => 3,
            Self::InvalidPattern => 4,
            Self::OutOfRange => 5,
            Self::InvalidState => 6,
            Self::Io => 7,
            Self::Config => 8,
            Self::Registry => 9,
            Self::MaintenanceRestricted => 125,
            Self::PermissionDenied => 126,
            Self::UnknownCommand => 127,
            Self::Fatal => 255,
        }
    }
}

impl UeshError {
    /// Classify this error.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::UnknownCommand(_) => FaultKind::UnknownCommand,
            Self::MaintenanceRestricted(_) => FaultKind::MaintenanceRestricted,
            Self::PermissionDenied(_) => FaultKind::PermissionDenied,
            Self::InsufficientArguments { .. } => FaultKind::InsufficientArguments,
            Self::CommandFailed { .. } => FaultKind::CommandFailed,
            Self::Io(_) => FaultKind::Io,
            Self::OutOfRange(_) => FaultKind::OutOfRange,
            Self::InvalidState(_) => FaultKind::InvalidState,
            Self::Parse(_) => FaultKind::Parse,
            Self::InvalidPattern(_) => FaultKind::InvalidPattern,
            Self::Registry(_) => FaultKind::Registry,
            Self::Config(_) | Self::TomlParse(_) => FaultKind::Config,
            Self::Json(_) => FaultKind::Io,
            Self::Fatal(_) => FaultKind::Fatal,
        }
    }

    /// Exit code for this error (see [`FaultKind::exit_code`]).
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Whether this error must abort the interactive loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Wrap a handler-internal fault for `command`, keeping its message.
    pub fn command_failed(command: &str, inner: &UeshError) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            message: inner.to_string(),
        }
    }
}
