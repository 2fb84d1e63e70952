//! Expected argument shape of a command.

use uesh_types::error::{Result, UeshError};

/// Usage variants plus the positional-argument minimum enforced before a
/// handler runs.
///
/// Usage strings describe the arguments only, e.g. `"<word> <line>"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentSpec {
    usages: Vec<String>,
    required: bool,
    min_required: usize,
}

impl ArgumentSpec {
    /// A command that takes no arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Arguments are accepted but never required.
    pub fn optional<I, S>(usages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usages: usages.into_iter().map(Into::into).collect(),
            required: false,
            min_required: 0,
        }
    }

    /// At least `min` positional arguments are required.
    pub fn required<I, S>(min: usize, usages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usages: usages.into_iter().map(Into::into).collect(),
            required: true,
            min_required: min,
        }
    }

    pub fn usages(&self) -> &[String] {
        &self.usages
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn min_required(&self) -> usize {
        self.min_required
    }

    /// Check that the minimum does not exceed the token count of the
    /// shortest usage variant.
    pub fn validate(&self, command: &str) -> Result<()> {
        if !self.required {
            return Ok(());
        }
        let shortest = self
            .usages
            .iter()
            .map(|u| u.split_whitespace().count())
            .min()
            .ok_or_else(|| {
                UeshError::Registry(format!("{command}: required arguments need a usage string"))
            })?;
        if self.min_required > shortest {
            return Err(UeshError::Registry(format!(
                "{command}: requires {} arguments but its shortest usage has {shortest}",
                self.min_required
            )));
        }
        Ok(())
    }

    /// Whether `count` positional arguments pass the gate.
    pub fn accepts(&self, count: usize) -> bool {
        !self.required || count >= self.min_required
    }
}
