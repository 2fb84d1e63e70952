//! Commands available in every shell: help, aliases and variables.

use uesh_types::error::{Result, UeshError};

use super::Builtin;
use crate::argument::ArgumentSpec;
use crate::command::{CommandContext, CommandFlags};
use crate::parser::ParsedCommandLine;
use crate::session::Alias;

pub(crate) fn catalog() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "help",
            "List commands or describe one",
            ArgumentSpec::optional(["[command]"]),
            help,
        ),
        Builtin::new(
            "alias",
            "List aliases or define one",
            ArgumentSpec::optional(["[name=command [args...]]"]),
            alias,
        ),
        Builtin::new(
            "unalias",
            "Remove an alias",
            ArgumentSpec::required(1, ["<name>"]),
            unalias,
        ),
        Builtin::new(
            "set",
            "Set a session variable",
            ArgumentSpec::required(1, ["<var> [value...]"]),
            set,
        ),
        Builtin::new(
            "unset",
            "Remove a session variable",
            ArgumentSpec::required(1, ["<var>"]),
            unset,
        ),
        Builtin::new("vars", "List session variables", ArgumentSpec::none(), vars),
        Builtin::new(
            "echo",
            "Print text",
            ArgumentSpec::optional(["[text...]"]),
            echo,
        )
        .flags(CommandFlags::SETTING_VARIABLE),
    ]
}

fn help(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let shell_type = ctx.session.shell_type();
    if let Some(name) = line.arg(0) {
        let (info, _) = ctx
            .registry
            .lookup(shell_type, name)
            .ok_or_else(|| UeshError::UnknownCommand(name.to_string()))?;
        let mut lines = vec![format!("{} - {}", info.name, info.description)];
        if info.args.usages().is_empty() {
            lines.push(format!("usage: {}", info.name));
        }
        for usage in info.args.usages() {
            lines.push(format!("usage: {} {usage}", info.name));
        }
        if info.has(CommandFlags::STRICT) {
            lines.push("requires administrator rights".to_string());
        }
        ctx.output.extend(lines);
        return Ok(0);
    }

    let listing: Vec<String> = ctx
        .registry
        .list(shell_type)
        .into_iter()
        .map(|info| format!("  {:<20} {}", info.name, info.description))
        .collect();
    ctx.print(format!("Commands ({shell_type} shell):"));
    ctx.output.extend(listing);
    Ok(0)
}

fn alias(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    if line.args.is_empty() {
        let listing: Vec<String> = ctx
            .session
            .aliases
            .iter()
            .map(|(name, alias)| format!("{name}={alias}"))
            .collect();
        if listing.is_empty() {
            ctx.print("no aliases defined");
        }
        ctx.output.extend(listing);
        return Ok(0);
    }
    let (name, alias) = Alias::parse(&line.args)?;
    ctx.session.aliases.insert(name, alias);
    Ok(0)
}

fn unalias(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let name = line.arg(0).unwrap_or_default().to_ascii_lowercase();
    ctx.session
        .aliases
        .remove(&name)
        .ok_or_else(|| UeshError::InvalidState(format!("no alias '{name}'")))?;
    Ok(0)
}

fn set(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let name = line.arg(0).unwrap_or_default();
    ctx.session.set_variable(name, line.rest(1));
    Ok(0)
}

fn unset(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let name = line.arg(0).unwrap_or_default();
    ctx.session
        .variables
        .remove(name)
        .ok_or_else(|| UeshError::InvalidState(format!("no variable '{name}'")))?;
    Ok(0)
}

fn vars(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let listing: Vec<String> = ctx
        .session
        .variables
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    ctx.output.extend(listing);
    Ok(0)
}

fn echo(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let text = line.rest(0);
    ctx.print(text.clone());
    ctx.variable_output = Some(text);
    Ok(0)
}
