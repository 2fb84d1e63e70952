//! Main shell commands: prompts, navigation, editors, nesting and scripts.

use std::fs;
use std::path::PathBuf;

use uesh_types::error::{Result, UeshError};
use uesh_types::kind::{EditorKind, ShellType};

use super::Builtin;
use crate::argument::ArgumentSpec;
use crate::command::{CommandContext, CommandFlags, ShellSignal};
use crate::parser::ParsedCommandLine;

pub(crate) fn catalog() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "input",
            "Ask a question and store the answer",
            ArgumentSpec::required(2, ["<var> <question...>"]),
            input,
        ),
        Builtin::new(
            "choice",
            "Ask for one of several answers",
            ArgumentSpec::required(3, ["<var> <a/b/c> <question...>"]),
            choice,
        ),
        Builtin::new(
            "select",
            "Pick an option by number",
            ArgumentSpec::required(3, ["<var> <a/b/c> <question...>"]),
            select,
        ),
        Builtin::new(
            "cd",
            "Change the working directory",
            ArgumentSpec::optional(["[dir]"]),
            cd,
        ),
        Builtin::new("pwd", "Print the working directory", ArgumentSpec::none(), pwd)
            .flags(CommandFlags::SETTING_VARIABLE),
        Builtin::new("whoami", "Print the current user", ArgumentSpec::none(), whoami)
            .flags(CommandFlags::SETTING_VARIABLE),
        Builtin::new(
            "edit",
            "Open a file in the text editor",
            ArgumentSpec::required(1, ["<file>"]),
            edit_text,
        )
        .flags(CommandFlags::NO_MAINTENANCE),
        Builtin::new(
            "jsonedit",
            "Open a file in the JSON editor",
            ArgumentSpec::required(1, ["<file>"]),
            edit_json,
        )
        .flags(CommandFlags::NO_MAINTENANCE),
        Builtin::new(
            "hexedit",
            "Open a file in the hex editor",
            ArgumentSpec::required(1, ["<file>"]),
            edit_hex,
        )
        .flags(CommandFlags::NO_MAINTENANCE),
        Builtin::new("shell", "Start a nested shell", ArgumentSpec::none(), shell),
        Builtin::new(
            "run",
            "Execute a script file",
            ArgumentSpec::required(1, ["<script>"]),
            run,
        ),
        Builtin::new(
            "maintenance",
            "Turn maintenance mode on or off",
            ArgumentSpec::required(1, ["<on|off>"]),
            maintenance,
        )
        .flags(CommandFlags::STRICT),
        Builtin::new("exit", "Leave this shell", ArgumentSpec::none(), exit),
    ]
}

/// Read one answer, failing when the input is exhausted.
fn ask(ctx: &mut CommandContext<'_>, prompt: &str) -> Result<String> {
    ctx.input
        .read_line(prompt)?
        .map(|s| s.trim().to_string())
        .ok_or_else(|| UeshError::InvalidState("input closed before an answer was given".to_string()))
}

fn options(spec: &str) -> Result<Vec<&str>> {
    let options: Vec<&str> = spec.split('/').filter(|o| !o.is_empty()).collect();
    if options.len() < 2 {
        return Err(UeshError::Parse(format!(
            "'{spec}': give at least two options separated by '/'"
        )));
    }
    Ok(options)
}

fn input(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let var = line.arg(0).unwrap_or_default();
    let answer = ask(ctx, &format!("{} ", line.rest(1)))?;
    ctx.session.set_variable(var, answer);
    Ok(0)
}

fn choice(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let var = line.arg(0).unwrap_or_default();
    let spec = line.arg(1).unwrap_or_default();
    let options = options(spec)?;
    let prompt = format!("{} [{spec}] ", line.rest(2));
    loop {
        let answer = ask(ctx, &prompt)?;
        if let Some(picked) = options.iter().find(|o| o.eq_ignore_ascii_case(&answer)) {
            ctx.session.set_variable(var, *picked);
            return Ok(0);
        }
        ctx.print(format!("'{answer}' is not one of {spec}"));
    }
}

fn select(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let var = line.arg(0).unwrap_or_default();
    let options = options(line.arg(1).unwrap_or_default())?;
    let numbered: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}) {o}", i + 1))
        .collect();
    let prompt = format!("{} ({}) ", line.rest(2), numbered.join(", "));
    loop {
        let answer = ask(ctx, &prompt)?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => {
                ctx.session.set_variable(var, options[n - 1]);
                return Ok(0);
            },
            _ => ctx.print(format!("enter a number from 1 to {}", options.len())),
        }
    }
}

fn cd(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let target = match line.arg(0) {
        Some(dir) => ctx.resolve_path(dir),
        None => ctx.home.to_path_buf(),
    };
    let target = fs::canonicalize(&target)?;
    if !target.is_dir() {
        return Err(UeshError::InvalidState(format!(
            "{} is not a directory",
            target.display()
        )));
    }
    ctx.session.cwd = target.display().to_string();
    Ok(0)
}

fn pwd(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let cwd = ctx.session.cwd.clone();
    ctx.print(cwd.clone());
    ctx.variable_output = Some(cwd);
    Ok(0)
}

fn whoami(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let name = ctx.user.name.clone();
    ctx.print(name.clone());
    ctx.variable_output = Some(name);
    Ok(0)
}

/// Open `file` in the editor of `kind` and enter its shell. A missing file
/// is created empty.
fn open_editor(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>, kind: EditorKind) -> Result<i32> {
    let path: PathBuf = ctx.resolve_path(line.arg(0).unwrap_or_default());
    if !path.exists() {
        fs::File::create(&path)?;
        log::info!("created {}", path.display());
    }
    match kind {
        EditorKind::Text => ctx.editors.text.open(&path)?,
        EditorKind::Json => ctx.editors.json.open(&path)?,
        EditorKind::Hex => ctx.editors.hex.open(&path)?,
    }
    ctx.print(format!("editing {} ({kind})", path.display()));
    ctx.signal(ShellSignal::Enter(kind.shell_type()));
    Ok(0)
}

fn edit_text(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    open_editor(line, ctx, EditorKind::Text)
}

fn edit_json(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    open_editor(line, ctx, EditorKind::Json)
}

fn edit_hex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    open_editor(line, ctx, EditorKind::Hex)
}

fn shell(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    ctx.signal(ShellSignal::Enter(ShellType::Main));
    Ok(0)
}

fn run(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let path = ctx.resolve_path(line.arg(0).unwrap_or_default());
    if !fs::metadata(&path)?.is_file() {
        return Err(UeshError::InvalidState(format!("{} is not a file", path.display())));
    }
    ctx.signal(ShellSignal::RunScript(path));
    Ok(0)
}

fn maintenance(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let on = match line.arg(0).unwrap_or_default().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        other => return Err(UeshError::Parse(format!("expected on or off, got '{other}'"))),
    };
    ctx.signal(ShellSignal::SetMaintenance(on));
    ctx.print(format!("maintenance mode {}", if on { "on" } else { "off" }));
    Ok(0)
}

fn exit(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    ctx.signal(ShellSignal::Exit);
    Ok(0)
}
