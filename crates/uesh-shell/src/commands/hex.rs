//! Hex editor commands.

use uesh_editor::hex::{dump, parse_byte, parse_bytes};
use uesh_editor::{BytePattern, HexBuffer, Scope};
use uesh_types::error::Result;

use super::text::END_OF_INPUT;
use super::{Builtin, clear_after_save, optional_position, plural, position_arg, scope_from};
use crate::argument::ArgumentSpec;
use crate::command::{CommandContext, ShellSignal};
use crate::parser::ParsedCommandLine;

pub(crate) fn catalog() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "print",
            "Print bytes as a hex dump",
            ArgumentSpec::optional(["[start] [end]"]),
            print,
        ),
        Builtin::new(
            "addbyte",
            "Append a byte",
            ArgumentSpec::required(1, ["<byte>"]),
            add_byte,
        ),
        Builtin::new(
            "addbytes",
            "Append hex bytes until EOF",
            ArgumentSpec::none(),
            add_bytes,
        ),
        Builtin::new(
            "delbyte",
            "Delete a byte",
            ArgumentSpec::required(1, ["<n>"]),
            delete_byte,
        ),
        Builtin::new(
            "delbytes",
            "Delete a range of bytes",
            ArgumentSpec::required(1, ["<start> [end]"]),
            delete_bytes,
        ),
        Builtin::new(
            "querybyte",
            "Find a byte",
            ArgumentSpec::required(1, ["<byte> [start] [end]"]),
            query_byte,
        ),
        Builtin::new(
            "replace",
            "Replace a byte sequence",
            ArgumentSpec::required(2, ["<from> <with> [start] [end]"]),
            replace,
        ),
        Builtin::new(
            "replaceregex",
            "Replace bytes matching a regex",
            ArgumentSpec::required(2, ["<regex> <with> [start] [end]"]),
            replace_regex,
        ),
        Builtin::new("clear", "Empty the buffer", ArgumentSpec::none(), clear),
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

fn buffer<'c>(ctx: &'c CommandContext<'_>) -> &'c HexBuffer {
    &ctx.editors.hex
}

fn print(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let scope = scope_from(line, 0, "byte")?;
    let (first, bytes) = buffer(ctx).slice(scope)?;
    ctx.output.extend(dump(&bytes, first));
    Ok(0)
}

fn add_byte(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let byte = parse_byte(line.arg(0).unwrap_or_default())?;
    let n = buffer(ctx).add_byte(byte)?;
    ctx.print(format!("byte {n} added"));
    Ok(0)
}

fn add_bytes(_line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let mut bytes = Vec::new();
    while let Some(text) = ctx.input.read_line("... ")? {
        if text.trim() == END_OF_INPUT {
            break;
        }
        if !text.trim().is_empty() {
            bytes.extend(parse_bytes(&text)?);
        }
    }
    let added = buffer(ctx).add_bytes(&bytes)?;
    ctx.print(format!("{added} byte{} added", plural(added)));
    Ok(0)
}

fn delete_byte(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let n = position_arg(line, 0, "byte")?;
    let byte = buffer(ctx).delete_byte(n)?;
    ctx.print(format!("deleted {byte:02X}"));
    Ok(0)
}

/// Without an end, deletes through the last byte.
fn delete_bytes(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let start = position_arg(line, 0, "byte")?;
    let end = match optional_position(line, 1, "byte")? {
        Some(end) => end,
        None => buffer(ctx).byte_count()?,
    };
    let removed = buffer(ctx).delete_bytes(start, end)?;
    ctx.print(format!("{removed} byte{} deleted", plural(removed)));
    Ok(0)
}

fn query_byte(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let byte = parse_byte(line.arg(0).unwrap_or_default())?;
    let scope = scope_from(line, 1, "byte")?;
    let found = buffer(ctx).query(&BytePattern::Bytes(vec![byte]), scope)?;
    let positions: Vec<String> = found.iter().map(|m| m.number().to_string()).collect();
    if positions.is_empty() {
        ctx.print(format!("no {byte:02X} bytes found"));
        return Ok(1);
    }
    ctx.print(format!(
        "{byte:02X} found at position{} {}",
        plural(positions.len()),
        positions.join(", ")
    ));
    Ok(0)
}

fn replace(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let from = parse_bytes(line.arg(0).unwrap_or_default())?;
    replace_with(line, ctx, BytePattern::Bytes(from))
}

fn replace_regex(line: &ParsedCommandLine, ctx: &mut CommandContext<'_>) -> Result<i32> {
    let pattern = BytePattern::Regex(line.arg(0).unwrap_or_default().to_string());
    replace_with(line, ctx, pattern)
}

fn replace_with(
    line: &ParsedCommandLine,
    ctx: &mut CommandContext<'_>,
    pattern: BytePattern,
) -> Result<i32> {
    let with = parse_bytes(line.arg(1).unwrap_or_default())?;
    let scope: Scope = scope_from(line, 2, "byte")?;
    let count = buffer(ctx).replace(&pattern, &with, scope)?;
    ctx.print(format!("{count} replacement{}", plural(count)));
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
