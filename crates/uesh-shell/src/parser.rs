//! Command-line tokenizer and parser.
//!
//! A raw line is split on `;` into segments (respecting quotes), and each
//! segment is tokenized with `$name` / `${name}` substitution from the
//! session's variables. Unquoted `-name` and `-name=value` tokens become
//! switches; everything else stays positional in original order.

use std::collections::BTreeMap;

use uesh_types::error::{Result, UeshError};

/// One command invocation produced from a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommandLine {
    /// Lower-cased command name.
    pub command: String,
    /// Positional arguments in original order.
    pub args: Vec<String>,
    /// Switch name to optional value.
    pub switches: BTreeMap<String, Option<String>>,
    /// The segment text as typed, before substitution.
    pub raw: String,
}

impl ParsedCommandLine {
    /// Build a line directly from a command and its arguments.
    pub fn new<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let raw = std::iter::once(command.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            command: command.to_ascii_lowercase(),
            args,
            switches: BTreeMap::new(),
            raw,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Positional arguments from `from` onward, joined with single spaces.
    pub fn rest(&self, from: usize) -> String {
        self.args.get(from..).map(|a| a.join(" ")).unwrap_or_default()
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.contains_key(name)
    }

    /// Value of a `-name=value` switch.
    pub fn switch_value(&self, name: &str) -> Option<&str> {
        self.switches.get(name).and_then(|v| v.as_deref())
    }
}

/// Split a raw line into command segments on unquoted `;`.
///
/// Fails with a parse error on an unterminated quote anywhere in the line.
pub fn split_segments(input: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            current.push(ch);
            if ch == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            current.push(ch);
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(next) = chars.next()
            {
                current.push(next);
            }
            continue;
        }
        match ch {
            '\'' => {
                in_single = true;
                current.push(ch);
            },
            '"' => {
                in_double = true;
                current.push(ch);
            },
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            },
            ';' => push_segment(&mut segments, &mut current),
            _ => current.push(ch),
        }
    }

    if in_single {
        return Err(UeshError::Parse("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(UeshError::Parse("unterminated double quote".to_string()));
    }
    push_segment(&mut segments, &mut current);
    Ok(segments)
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let segment = current.trim();
    if !segment.is_empty() {
        segments.push(segment.to_string());
    }
    current.clear();
}

/// A token plus whether any part of it was quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Tokenize one segment, substituting variables outside single quotes.
///
/// A token that is empty after substitution and was not quoted is dropped,
/// so a line made only of undefined variables parses to nothing.
fn tokenize(input: &str, vars: &BTreeMap<String, String>) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => match chars.peek().copied() {
                    Some(next @ ('"' | '\\' | '$')) => {
                        chars.next();
                        current.push(next);
                    },
                    _ => current.push('\\'),
                },
                '$' => substitute(&mut chars, vars, &mut current),
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    quoted = true;
                },
                '"' => {
                    in_double = true;
                    quoted = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                '$' => substitute(&mut chars, vars, &mut current),
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        tokens.push(Token {
                            text: std::mem::take(&mut current),
                            quoted,
                        });
                    }
                    quoted = false;
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single || in_double {
        return Err(UeshError::Parse("unterminated quote".to_string()));
    }
    if !current.is_empty() || quoted {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }
    Ok(tokens)
}

/// Expand the variable reference following a `$`.
fn substitute(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    vars: &BTreeMap<String, String>,
    out: &mut String,
) {
    let mut name = String::new();
    if chars.peek() == Some(&'{') {
        let mut lookahead = chars.clone();
        lookahead.next();
        let mut braced = String::new();
        while let Some(c) = lookahead.next() {
            if c == '}' {
                *chars = lookahead;
                out.push_str(vars.get(&braced).map(String::as_str).unwrap_or_default());
                return;
            }
            braced.push(c);
        }
        // No closing brace: keep the text as typed.
        out.push('$');
        return;
    }
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        out.push('$');
    } else {
        out.push_str(vars.get(&name).map(String::as_str).unwrap_or_default());
    }
}

/// Parse `-name` or `-name=value`.
fn as_switch(token: &Token) -> Option<(String, Option<String>)> {
    if token.quoted {
        return None;
    }
    let body = token.text.strip_prefix('-')?;
    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let (name, value) = match body.split_once('=') {
        Some((n, v)) => (n, Some(v.to_string())),
        None => (body, None),
    };
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .then(|| (name.to_ascii_lowercase(), value))
}

/// Parse one segment. Returns `None` when nothing remains after
/// substitution.
pub fn parse_segment(segment: &str, vars: &BTreeMap<String, String>) -> Result<Option<ParsedCommandLine>> {
    let tokens = tokenize(segment, vars)?;
    let mut tokens = tokens.into_iter();
    let Some(first) = tokens.next() else {
        return Ok(None);
    };

    let mut parsed = ParsedCommandLine {
        command: first.text.to_ascii_lowercase(),
        raw: segment.to_string(),
        ..ParsedCommandLine::default()
    };
    let mut switches_done = false;
    for token in tokens {
        if !switches_done && !token.quoted && token.text == "--" {
            switches_done = true;
            continue;
        }
        match as_switch(&token).filter(|_| !switches_done) {
            Some((name, value)) => {
                parsed.switches.insert(name, value);
            },
            None => parsed.args.push(token.text),
        }
    }
    Ok(Some(parsed))
}

/// Parse a full raw line into its command invocations, substituting all
/// segments against the same variable table.
pub fn parse_line(input: &str, vars: &BTreeMap<String, String>) -> Result<Vec<ParsedCommandLine>> {
    let mut parsed = Vec::new();
    for segment in split_segments(input)? {
        if let Some(line) = parse_segment(&segment, vars)? {
            parsed.push(line);
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn one(input: &str) -> ParsedCommandLine {
        parse_segment(input, &BTreeMap::new()).unwrap().unwrap()
    }

    #[test]
    fn simple_command_and_args() {
        let p = one("AddLine hello world");
        assert_eq!(p.command, "addline");
        assert_eq!(p.args, vec!["hello", "world"]);
        assert_eq!(p.raw, "AddLine hello world");
    }

    #[test]
    fn double_quotes_group_and_strip() {
        let p = one(r#"addline "hello   world" x"#);
        assert_eq!(p.args, vec!["hello   world", "x"]);
    }

    #[test]
    fn single_quotes_are_literal() {
        let p = parse_segment("echo '$x'", &vars(&[("x", "1")])).unwrap().unwrap();
        assert_eq!(p.args, vec!["$x"]);
    }

    #[test]
    fn backslash_escapes_outside_quotes() {
        let p = one(r"echo a\ b");
        assert_eq!(p.args, vec!["a b"]);
    }

    #[test]
    fn variables_substitute() {
        let v = vars(&[("name", "joe"), ("n", "2")]);
        let p = parse_segment("echo $name ${n}x \"hi $name\"", &v).unwrap().unwrap();
        assert_eq!(p.args, vec!["joe", "2x", "hi joe"]);
    }

    #[test]
    fn undefined_variable_is_empty() {
        let p = parse_segment("echo a$missing b", &BTreeMap::new()).unwrap().unwrap();
        assert_eq!(p.args, vec!["a", "b"]);
    }

    #[test]
    fn substituted_value_with_spaces_stays_one_token() {
        let v = vars(&[("s", "two words")]);
        let p = parse_segment("addline $s", &v).unwrap().unwrap();
        assert_eq!(p.args, vec!["two words"]);
    }

    #[test]
    fn empty_after_substitution_is_none() {
        assert!(parse_segment("$nothing", &BTreeMap::new()).unwrap().is_none());
        assert!(parse_segment("   ", &BTreeMap::new()).unwrap().is_none());
    }

    #[test]
    fn quoted_empty_string_is_an_argument() {
        let p = one(r#"set x """#);
        assert_eq!(p.args, vec!["x", ""]);
    }

    #[test]
    fn switches_extracted_anywhere() {
        let p = one("echo -set=out hello -Loud world");
        assert_eq!(p.args, vec!["hello", "world"]);
        assert_eq!(p.switch_value("set"), Some("out"));
        assert!(p.has_switch("loud"));
        assert_eq!(p.switches.get("loud"), Some(&None));
    }

    #[test]
    fn negative_numbers_and_quoted_dashes_are_positional() {
        let p = one(r#"echo -5 "-x" -"#);
        assert_eq!(p.args, vec!["-5", "-x", "-"]);
        assert!(p.switches.is_empty());
    }

    #[test]
    fn double_dash_ends_switches() {
        let p = one("addline -a -- -b");
        assert!(p.has_switch("a"));
        assert_eq!(p.args, vec!["-b"]);
    }

    #[test]
    fn segments_split_on_unquoted_semicolon() {
        let segs = split_segments(r#"set a 1; echo "x;y" ;; echo 'p;q'"#).unwrap();
        assert_eq!(segs, vec!["set a 1", r#"echo "x;y""#, "echo 'p;q'"]);
    }

    #[test]
    fn unterminated_quotes_fail() {
        assert!(matches!(split_segments("echo \"abc"), Err(UeshError::Parse(_))));
        assert!(matches!(split_segments("echo 'abc"), Err(UeshError::Parse(_))));
    }

    #[test]
    fn parse_line_yields_every_command() {
        let lines = parse_line("a 1; b; ; c -x", &BTreeMap::new()).unwrap();
        let names: Vec<_> = lines.iter().map(|l| l.command.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(lines[2].has_switch("x"));
    }

    #[test]
    fn unclosed_brace_is_kept() {
        let p = one("echo ${abc");
        assert_eq!(p.args, vec!["${abc"]);
    }

    #[test]
    fn rest_joins_from_index() {
        let p = one("editline 2 new text here");
        assert_eq!(p.rest(1), "new text here");
        assert_eq!(p.rest(9), "");
    }

    proptest! {
        #[test]
        fn plain_words_round_trip(words in prop::collection::vec("[a-z0-9]{1,8}", 1..8)) {
            let line = words.join(" ");
            let p = parse_segment(&line, &BTreeMap::new()).unwrap().unwrap();
            prop_assert_eq!(&p.command, &words[0]);
            prop_assert_eq!(&p.args[..], &words[1..]);
        }

        #[test]
        fn tokenizer_never_panics(input in ".{0,64}") {
            let _ = parse_line(&input, &BTreeMap::new());
        }
    }
}
