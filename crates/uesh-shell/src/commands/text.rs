//! Text editor commands.

use uesh_editor::{Pattern, Scope, TextBuffer};
use uesh_types::error::{Result, UeshError};

use super::{Builtin, clear_after_save, plural, position_arg, scope_from, unit_or_all};
use crate::argument::ArgumentSpec;
use crate::command::{CommandContext, ShellSignal};
use crate::parser::ParsedCommandLine;

/// Line that ends an `addlines` block.
pub(crate) const END_OF_INPUT: &str = "EOF";

pub(crate) fn catalog() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "print",
            "Print lines",
            ArgumentSpec::optional(["[line] [end]"]),
            print,
        ),
        Builtin::new(
            "addline",
            "Append a line",
            ArgumentSpec::optional(["[text...]"]),
            add_line,
        ),
        Builtin::new(
            "addlines",
            "Append lines until EOF",
            ArgumentSpec::none(),
            add_lines,
        ),
        Builtin::new(
            "editline",
            "Replace the text of a line",
            ArgumentSpec::required(1, ["<line> [text...]"]),
            edit_line,
        ),
        Builtin::new(
            "delline",
            "Delete a line or range of lines",
            ArgumentSpec::required(1, ["<line> [end]"]),
            delete_line,
        ),
        Builtin::new(
            "delword",
            "Delete a word from a line",
            ArgumentSpec::required(2, ["<word> <line>"]),
            delete_word,
        ),
        Builtin::new(
            "delcharnum",
            "Delete the character at a column of a line",
            ArgumentSpec::required(2, ["<char> <line>"]),
            delete_char,
        ),
        Builtin::new("clear", "Empty the buffer", ArgumentSpec::none(), clear),
        Builtin::new(
            "querychar",
            "Find a character",
            ArgumentSpec::required(2, ["<char> <line|all>"]),
            query_char,
        ),
        Builtin::new(
            "queryword",
            "Find a word (case-insensitive)",
            ArgumentSpec::required(2, ["<word> <line|all>"]),
            query_word,
        ),
        Builtin::new(
            "querywordregex",
            "Find a regular expression",
            ArgumentSpec::required(2, ["<regex> <line|all>"]),
            query_word_regex,
        ),
        Builtin::new(
            "replace",
            "Replace text everywhere",
            ArgumentSpec::required(2, ["<from> <with>"]),
            replace,
        ),
        Builtin::new(
            "replaceinline",
            "Replace text in a line or range",
            ArgumentSpec::required(3, ["<from> <with> <line> [end]"]),
            replace_in_line,
        ),
        Builtin::new(
            "replaceregex",
            "Replace a regular expression everywhere",
            ArgumentSpec::required(2, ["<regex> <with>"]),
            replace_regex,
        ),
        Builtin::new(
            "replaceinlineregex",
            "Replace a regular expression in a line or range",
            ArgumentSpec::required(3, ["<regex> <with> <line> [end]"]),
            replace_in_line_regex,
        ),
        Builtin::new(
            "save",
            "Save the file; -clear empties the buffer afterwards",
            ArgumentSpec::optional(["[-clear]"]),
            save,
        ),
        Builtin::new("exit", "Save and leave the editor", ArgumentSpec::none(), exit),
        Builtin::new(
            "exitnosave",
            "Leave the editor without saving",
            ArgumentSpec::none(),
            exit_no_save,
        ),
    ]
}

fn buffer<'c>(ctx: &'c CommandContext<'_>) -> &'c TextBuffer {
    &ctx.editors.text
}

fn print(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let scope = scope_from(line, 0, "line")?;
    let lines = buffer(ctx).lines(scope)?;
    let width = lines.last().map_or(1, |(n, _)| n.to_string().len());
    ctx.output
        .extend(lines.into_iter().map(|(n, text)| format!("{n:>width$}: {text}")));
    Ok(0)
}

fn add_line(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let n = buffer(ctx).add_line(&line.rest(0))?;
    ctx.print(format!("line {n} added"));
    Ok(0)
}

fn add_lines(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let mut lines = Vec::new();
    while let Some(text) = ctx.input.read_line("... ")? {
        if text == END_OF_INPUT {
            break;
        }
        lines.push(text);
    }
    let added = buffer(ctx).add_lines(lines)?;
    ctx.print(format!("{added} line{} added", plural(added)));
    Ok(0)
}

fn edit_line(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let n = position_arg(line, 0, "line")?;
    buffer(ctx).edit_line(n, &line.rest(1))?;
    Ok(0)
}

fn delete_line(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    match scope_from(line, 0, "line")? {
        Scope::Range(start, end) => {
            let removed = buffer(ctx).delete_lines(start, end)?;
            ctx.print(format!("{removed} line{} deleted", plural(removed)));
        },
        Scope::Unit(n) => {
            buffer(ctx).delete_line(n)?;
            ctx.print(format!("line {n} deleted"));
        },
        Scope::All => return Err(UeshError::Parse("a line number is required".to_string())),
    }
    Ok(0)
}

fn delete_word(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let word = line.arg(0).unwrap_or_default();
    let n = position_arg(line, 1, "line")?;
    let removed = buffer(ctx).delete_word(word, n)?;
    ctx.print(format!("{removed} occurrence{} removed", plural(removed)));
    Ok(0)
}

fn delete_char(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let column = position_arg(line, 0, "character")?;
    let n = position_arg(line, 1, "line")?;
    let ch = buffer(ctx).delete_char(column, n)?;
    ctx.print(format!("deleted '{ch}'"));
    Ok(0)
}

fn clear(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    buffer(ctx).clear()?;
    Ok(0)
}

/// Run a query and print one row per matching line.
fn query(ctx: &mut CommandContext<'_>, pattern: &Pattern, scope_arg: &str) -> Result<i32> {
    let scope = unit_or_all(scope_arg, "line")?;
    let found = buffer(ctx).query(pattern, scope)?;
    let rows: Vec<String> = found
        .iter()
        .map(|m| {
            let columns: Vec<String> = m.columns().iter().map(usize::to_string).collect();
            format!("line {} (column {}): {}", m.number(), columns.join(", "), m.line)
        })
        .collect();
    if rows.is_empty() {
        ctx.print(format!("no matches for '{}'", pattern.text));
        return Ok(1);
    }
    ctx.output.extend(rows);
    Ok(0)
}

fn query_char(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let text = line.arg(0).unwrap_or_default();
    let mut chars = text.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return Err(UeshError::Parse(format!("'{text}' is not a single character")));
    };
    query(ctx, &Pattern::literal(ch), line.arg(1).unwrap_or_default())
}

fn query_word(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::literal(line.arg(0).unwrap_or_default());
    query(ctx, &pattern, line.arg(1).unwrap_or_default())
}

fn query_word_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::regex(line.arg(0).unwrap_or_default());
    query(ctx, &pattern, line.arg(1).unwrap_or_default())
}

fn replace_with(
    line: &ParsedCommandLine,
    ctx: &mut CommandContext<'_>,
    pattern: Pattern,
    scope: Scope,
) -> Result<i32> {
    let with = line.arg(1).unwrap_or_default();
    let count = buffer(ctx).replace(&pattern, with, scope)?;
    ctx.print(format!("{count} replacement{}", plural(count)));
    Ok(0)
}

fn replace(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::literal(line.arg(0).unwrap_or_default());
    replace_with(line, ctx, pattern, Scope::All)
}

fn replace_in_line(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::literal(line.arg(0).unwrap_or_default());
    let scope = scope_from(line, 2, "line")?;
    replace_with(line, ctx, pattern, scope)
}

fn replace_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::regex(line.arg(0).unwrap_or_default());
    replace_with(line, ctx, pattern, Scope::All)
}

fn replace_in_line_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = Pattern::regex(line.arg(0).unwrap_or_default());
    let scope = scope_from(line, 2, "line")?;
    replace_with(line, ctx, pattern, scope)
}

fn save(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let clear = clear_after_save(line);
    buffer(ctx).save(clear)?;
    ctx.print(if clear { "saved and cleared" } else { "saved" });
    Ok(0)
}

fn exit(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    buffer(ctx).save(false)?;
    ctx.signal(ShellSignal::Exit);
    Ok(0)
}

fn exit_no_save(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    if buffer(ctx).is_dirty() {
        ctx.print("unsaved changes discarded");
    }
    ctx.signal(ShellSignal::Exit);
    Ok(0)
}
