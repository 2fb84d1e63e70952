//! JSON editor commands. Tokens are addressed by JSON Pointer.

use serde_json::{Map, Value};
use uesh_editor::json::parse_value;
use uesh_editor::{JsonBuffer, JsonFormat, Pattern};
use uesh_types::error::Result;

use super::{Builtin, clear_after_save, plural};
use crate::argument::ArgumentSpec;
use crate::command::{CommandContext, ShellSignal};
use crate::parser::ParsedCommandLine;

pub(crate) fn catalog() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "print",
            "Print the document or a token",
            ArgumentSpec::optional(["[pointer]"]),
            print,
        ),
        Builtin::new(
            "addproperty",
            "Add a property to an object",
            ArgumentSpec::required(3, ["<parent> <key> <value...>"]),
            add_property,
        ),
        Builtin::new(
            "addobject",
            "Add an empty object property",
            ArgumentSpec::required(2, ["<parent> <key>"]),
            add_object,
        ),
        Builtin::new(
            "addarray",
            "Add an array property",
            ArgumentSpec::required(2, ["<parent> <key> [values...]"]),
            add_array,
        ),
        Builtin::new(
            "additem",
            "Append an item to an array",
            ArgumentSpec::required(2, ["<array> <value...>"]),
            add_item,
        ),
        Builtin::new(
            "setvalue",
            "Overwrite a token",
            ArgumentSpec::required(2, ["<pointer> <value...>"]),
            set_value,
        ),
        Builtin::new(
            "rmtoken",
            "Remove a token",
            ArgumentSpec::required(1, ["<pointer>"]),
            remove_token,
        ),
        Builtin::new(
            "query",
            "Find keys or values containing text",
            ArgumentSpec::required(1, ["<text> [pointer]"]),
            query,
        ),
        Builtin::new(
            "queryregex",
            "Find keys or values matching a regular expression",
            ArgumentSpec::required(1, ["<regex> [pointer]"]),
            query_regex,
        ),
        Builtin::new(
            "replace",
            "Replace text in string values",
            ArgumentSpec::required(2, ["<from> <with> [pointer]"]),
            replace,
        ),
        Builtin::new(
            "replaceregex",
            "Replace a regular expression in string values",
            ArgumentSpec::required(2, ["<regex> <with> [pointer]"]),
            replace_regex,
        ),
        Builtin::new("minify", "Write compact JSON on save", ArgumentSpec::none(), minify),
        Builtin::new("beautify", "Write indented JSON on save", ArgumentSpec::none(), beautify),
        Builtin::new("clear", "Empty the document", ArgumentSpec::none(), clear),
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

fn buffer<'c>(ctx: &'c CommandContext<'_>) -> &'c JsonBuffer {
    &ctx.editors.json
}

fn print(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let rendered = buffer(ctx).render(line.arg(0).unwrap_or_default())?;
    ctx.output.extend(rendered.lines().map(str::to_string));
    Ok(0)
}

fn add_property(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let (parent, key) = (line.arg(0).unwrap_or_default(), line.arg(1).unwrap_or_default());
    buffer(ctx).add_property(parent, key, parse_value(&line.rest(2)))?;
    Ok(0)
}

fn add_object(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let (parent, key) = (line.arg(0).unwrap_or_default(), line.arg(1).unwrap_or_default());
    buffer(ctx).add_property(parent, key, Value::Object(Map::new()))?;
    Ok(0)
}

fn add_array(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let (parent, key) = (line.arg(0).unwrap_or_default(), line.arg(1).unwrap_or_default());
    let items = line.args.iter().skip(2).map(|a| parse_value(a)).collect();
    buffer(ctx).add_property(parent, key, Value::Array(items))?;
    Ok(0)
}

fn add_item(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let array = line.arg(0).unwrap_or_default();
    let n = buffer(ctx).add_item(array, parse_value(&line.rest(1)))?;
    ctx.print(format!("item {n} added"));
    Ok(0)
}

fn set_value(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pointer = line.arg(0).unwrap_or_default();
    buffer(ctx).set_value(pointer, parse_value(&line.rest(1)))?;
    Ok(0)
}

fn remove_token(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let removed = buffer(ctx).remove(line.arg(0).unwrap_or_default())?;
    ctx.print(format!("removed {removed}"));
    Ok(0)
}

fn run_query(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>, pattern: Pattern) -> Result<i32> {
    let found = buffer(ctx).query(&pattern, line.arg(1).unwrap_or_default())?;
    let rows: Vec<String> = found
        .iter()
        .map(|m| {
            let pointer = if m.pointer.is_empty() { "(root)" } else { m.pointer.as_str() };
            format!("{pointer}: {}", m.value)
        })
        .collect();
    if rows.is_empty() {
        ctx.print(format!("no matches for '{}'", pattern.text));
        return Ok(1);
    }
    ctx.output.extend(rows);
    Ok(0)
}

fn query(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    run_query(line, ctx, Pattern::literal(line.arg(0).unwrap_or_default()))
}

fn query_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    run_query(line, ctx, Pattern::regex(line.arg(0).unwrap_or_default()))
}

fn run_replace(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>, pattern: Pattern) -> Result<i32> {
    let with = line.arg(1).unwrap_or_default();
    let pointer = line.arg(2).unwrap_or_default();
    let count = buffer(ctx).replace(&pattern, with, pointer)?;
    ctx.print(format!("{count} replacement{}", plural(count)));
    Ok(0)
}

fn replace(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    run_replace(line, ctx, Pattern::literal(line.arg(0).unwrap_or_default()))
}

fn replace_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    run_replace(line, ctx, Pattern::regex(line.arg(0).unwrap_or_default()))
}

fn minify(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    buffer(ctx).set_format(JsonFormat::Compact);
    ctx.print("output format: compact");
    Ok(0)
}

fn beautify(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    buffer(ctx).set_format(JsonFormat::Indented);
    ctx.print("output format: indented");
    Ok(0)
}

fn clear(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    buffer(ctx).clear()?;
    Ok(0)
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
