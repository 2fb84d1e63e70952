//! Resolve a parsed line to a command, run the gates, invoke the handler.

use uesh_types::error::UeshError;

use crate::command::{CommandContext, CommandFlags};
use crate::parser::ParsedCommandLine;
use crate::registry::CommandRegistry;

/// Switch naming the session variable a `SETTING_VARIABLE` command writes.
pub const SET_SWITCH: &str = "set";

/// Exit code and fault of one dispatch.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub exit_code: i32,
    pub fault: Option<UeshError>,
}

impl DispatchOutcome {
    fn ok(exit_code: i32) -> Self {
        Self {
            exit_code,
            fault: None,
        }
    }

    fn fault(fault: UeshError) -> Self {
        Self {
            exit_code: fault.exit_code(),
            fault: Some(fault),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.fault.is_none()
    }
}

/// Expand one level of session alias into `parsed`.
pub fn expand_alias(mut parsed: ParsedCommandLine, ctx: &CommandContext<'_>) -> ParsedCommandLine {
    if let Some(alias) = ctx.session.aliases.get(&parsed.command) {
        log::debug!("alias '{}' -> '{alias}'", parsed.command);
        parsed.command = alias.command.clone();
        parsed.args.splice(0..0, alias.args.iter().cloned());
    }
    parsed
}

/// Dispatch `parsed` in the context's active session.
///
/// Validation failures are reported before any handler runs. A handler
/// error becomes a `CommandFailed` fault; it never escapes this function.
pub fn dispatch(
    registry: &CommandRegistry,
    parsed: ParsedCommandLine,
    ctx: &mut CommandContext<'_>,
) -> DispatchOutcome {
    let parsed = expand_alias(parsed, ctx);
    let shell_type = ctx.session.shell_type();

    let Some((info, source)) = registry.lookup(shell_type, &parsed.command) else {
        log::debug!("unknown command '{}' in the {shell_type} shell", parsed.command);
        return DispatchOutcome::fault(UeshError::UnknownCommand(parsed.command));
    };
    if info.has(CommandFlags::NO_MAINTENANCE) && ctx.maintenance {
        return DispatchOutcome::fault(UeshError::MaintenanceRestricted(info.name.clone()));
    }
    if info.has(CommandFlags::STRICT) && !ctx.user.admin {
        return DispatchOutcome::fault(UeshError::PermissionDenied(info.name.clone()));
    }
    if !info.args.accepts(parsed.args.len()) {
        return DispatchOutcome::fault(UeshError::InsufficientArguments {
            command: info.name.clone(),
            usages: info
                .args
                .usages()
                .iter()
                .map(|u| format!("{} {u}", info.name))
                .collect(),
        });
    }
    if info.has(CommandFlags::OBSOLETE) {
        log::warn!("'{}' is obsolete", info.name);
    }

    log::debug!("dispatching '{}' ({source:?}, {shell_type})", parsed.raw);
    ctx.variable_output = None;
    match info.handler.invoke(&parsed, ctx) {
        Ok(code) => {
            store_variable_output(&parsed, info.has(CommandFlags::SETTING_VARIABLE), ctx);
            DispatchOutcome::ok(code)
        },
        Err(e) if e.is_fatal() => DispatchOutcome::fault(e),
        Err(e) => {
            log::debug!("'{}' failed: {e}", info.name);
            DispatchOutcome::fault(UeshError::command_failed(&info.name, &e))
        },
    }
}

fn store_variable_output(parsed: &ParsedCommandLine, setting: bool, ctx: &mut CommandContext<'_>) {
    let Some(target) = parsed.switch_value(SET_SWITCH) else {
        return;
    };
    if !setting {
        log::debug!("'{}' does not set variables; -set ignored", parsed.command);
        return;
    }
    if let Some(value) = ctx.variable_output.take() {
        ctx.session.set_variable(target, value);
    }
}
