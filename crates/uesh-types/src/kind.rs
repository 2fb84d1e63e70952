//! Shell-type and editor-kind tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UeshError;

/// The three editor flavours sharing one buffer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Text,
    Json,
    Hex,
}

impl EditorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Hex => "hex",
        }
    }

    /// The shell type an open editor of this kind runs under.
    pub fn shell_type(self) -> ShellType {
        match self {
            Self::Text => ShellType::TextEditor,
            Self::Json => ShellType::JsonEditor,
            Self::Hex => ShellType::HexEditor,
        }
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag selecting a command partition and session flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// The root UESH shell (also used for explicitly nested shells).
    Main,
    TextEditor,
    JsonEditor,
    HexEditor,
    Ftp,
    Ssh,
    Sftp,
    Mail,
    Rss,
}

impl ShellType {
    /// Every shell type, in partition order.
    pub const ALL: [ShellType; 9] = [
        Self::Main,
        Self::TextEditor,
        Self::JsonEditor,
        Self::HexEditor,
        Self::Ftp,
        Self::Ssh,
        Self::Sftp,
        Self::Mail,
        Self::Rss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::TextEditor => "text",
            Self::JsonEditor => "json",
            Self::HexEditor => "hex",
            Self::Ftp => "ftp",
            Self::Ssh => "ssh",
            Self::Sftp => "sftp",
            Self::Mail => "mail",
            Self::Rss => "rss",
        }
    }

    /// The editor kind backing this shell type, if it is an editor shell.
    pub fn editor_kind(self) -> Option<EditorKind> {
        match self {
            Self::TextEditor => Some(EditorKind::Text),
            Self::JsonEditor => Some(EditorKind::Json),
            Self::HexEditor => Some(EditorKind::Hex),
            _ => None,
        }
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellType {
    type Err = UeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| UeshError::Parse(format!("unknown shell type: {s}")))
    }
}
