//! Foundation types for UESH.
//!
//! This crate holds the pieces every other UESH crate agrees on: the fault
//! taxonomy and its exit codes, the shell-type and editor-kind tags, and the
//! TOML configuration model.

pub mod config;
pub mod error;
pub mod kind;

pub use config::{EditorSettings, UeshConfig, UserConfig};
pub use error::{FaultKind, Result, UeshError};
pub use kind::{EditorKind, ShellType};
