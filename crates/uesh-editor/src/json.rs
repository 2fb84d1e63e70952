//! JSON editor buffer: a `serde_json` token tree addressed by JSON Pointer.

use regex::{NoExpand, Regex};
use serde_json::{Map, Value};
use uesh_types::error::{Result, UeshError};
use uesh_types::kind::EditorKind;

use crate::buffer::{BufferContent, EditorBuffer};
use crate::query::{MatchMode, Pattern};

/// Buffer holding a JSON document.
pub type JsonBuffer = EditorBuffer<Value>;

/// Serialization style used when saving a JSON buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    #[default]
    Indented,
    Compact,
}

impl BufferContent for Value {
    type Format = JsonFormat;
    const KIND: EditorKind = EditorKind::Json;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode(&self, format: &JsonFormat) -> Result<Vec<u8>> {
        Ok(match format {
            JsonFormat::Indented => serde_json::to_vec_pretty(self)?,
            JsonFormat::Compact => serde_json::to_vec(self)?,
        })
    }

    fn empty() -> Self {
        Value::Object(Map::new())
    }
}

/// Parse a user-typed value: valid JSON is taken as-is, anything else is a
/// string.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Escape an object key for use as a JSON Pointer segment.
pub fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Split a pointer into its parent pointer and unescaped last segment.
fn split_pointer(pointer: &str) -> Result<(&str, String)> {
    let (parent, last) = pointer
        .rsplit_once('/')
        .ok_or_else(|| UeshError::InvalidState("the root token cannot be removed".to_string()))?;
    Ok((parent, last.replace("~1", "/").replace("~0", "~")))
}

/// RFC 6901: `""` is the root and `"/"` names the empty-string key.
fn normalize_pointer(pointer: &str) -> Result<&str> {
    match pointer {
        "" => Ok(""),
        p if p.starts_with('/') => Ok(p),
        p => Err(UeshError::Parse(format!(
            "JSON pointer must start with '/': {p}"
        ))),
    }
}

fn no_token(pointer: &str) -> UeshError {
    UeshError::OutOfRange(format!("no token at '{pointer}'"))
}

fn token_mut<'a>(root: &'a mut Value, pointer: &str) -> Result<&'a mut Value> {
    root.pointer_mut(pointer).ok_or_else(|| no_token(pointer))
}

/// Text a scalar token is matched against; containers have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// One token matched by a [`JsonQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonMatch<'a> {
    /// JSON Pointer of the token.
    pub pointer: String,
    pub value: &'a Value,
}

/// Depth-first walk over every token below a root, yielding pointers.
struct TokenWalk<'a> {
    stack: Vec<(String, Option<String>, &'a Value)>,
}

impl<'a> Iterator for TokenWalk<'a> {
    /// (pointer, key within the parent object, value)
    type Item = (String, Option<String>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let (pointer, key, value) = self.stack.pop()?;
        match value {
            Value::Object(map) => {
                for (k, v) in map.iter().rev() {
                    self.stack
                        .push((format!("{pointer}/{}", escape_segment(k)), Some(k.clone()), v));
                }
            },
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate().rev() {
                    self.stack.push((format!("{pointer}/{i}"), None, v));
                }
            },
            _ => {},
        }
        Some((pointer, key, value))
    }
}

/// Read-only result of a JSON query over a snapshot of the scoped subtree.
#[derive(Debug, Clone)]
pub struct JsonQuery {
    base: String,
    root: Value,
    matcher: Regex,
}

impl JsonQuery {
    /// Tokens whose object key or scalar value matches, in document order.
    pub fn iter(&self) -> impl Iterator<Item = JsonMatch<'_>> + '_ {
        let walk = TokenWalk {
            stack: vec![(self.base.clone(), None, &self.root)],
        };
        walk.filter_map(move |(pointer, key, value)| {
            let key_hit = key.as_deref().is_some_and(|k| self.matcher.is_match(k));
            let value_hit = scalar_text(value).is_some_and(|t| self.matcher.is_match(&t));
            (key_hit || value_hit).then_some(JsonMatch { pointer, value })
        })
    }

    pub fn pointers(&self) -> Vec<String> {
        self.iter().map(|m| m.pointer).collect()
    }
}

impl EditorBuffer<Value> {
    /// A copy of the token at `pointer` (`""` is the root).
    pub fn token(&self, pointer: &str) -> Result<Value> {
        let pointer = normalize_pointer(pointer)?;
        self.read(|root| root.pointer(pointer).cloned().ok_or_else(|| no_token(pointer)))?
    }

    /// Render the token at `pointer` in the buffer's current format.
    pub fn render(&self, pointer: &str) -> Result<String> {
        let token = self.token(pointer)?;
        let bytes = token.encode(&self.format())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Add `key: value` to the object at `parent`.
    pub fn add_property(&self, parent: &str, key: &str, value: Value) -> Result<()> {
        let parent = normalize_pointer(parent)?;
        self.mutate(|root| {
            let Value::Object(map) = token_mut(root, parent)? else {
                return Err(UeshError::InvalidState(format!(
                    "token at '{parent}' is not an object"
                )));
            };
            if map.contains_key(key) {
                return Err(UeshError::InvalidState(format!(
                    "property '{key}' already exists at '{parent}'"
                )));
            }
            map.insert(key.to_string(), value);
            Ok(())
        })
    }

    /// Append `value` to the array at `pointer`, returning its 1-based position.
    pub fn add_item(&self, pointer: &str, value: Value) -> Result<usize> {
        let pointer = normalize_pointer(pointer)?;
        self.mutate(|root| {
            let Value::Array(items) = token_mut(root, pointer)? else {
                return Err(UeshError::InvalidState(format!(
                    "token at '{pointer}' is not an array"
                )));
            };
            items.push(value);
            Ok(items.len())
        })
    }

    /// Overwrite the token at `pointer`.
    pub fn set_value(&self, pointer: &str, value: Value) -> Result<()> {
        let pointer = normalize_pointer(pointer)?;
        self.mutate(|root| {
            *token_mut(root, pointer)? = value;
            Ok(())
        })
    }

    /// Remove the token at `pointer`, returning it.
    pub fn remove(&self, pointer: &str) -> Result<Value> {
        let pointer = normalize_pointer(pointer)?;
        let (parent, last) = split_pointer(pointer)?;
        self.mutate(|root| match token_mut(root, parent)? {
            Value::Object(map) => map.remove(&last).ok_or_else(|| no_token(pointer)),
            Value::Array(items) => {
                let index: usize = last.parse().map_err(|_| no_token(pointer))?;
                if index >= items.len() {
                    return Err(no_token(pointer));
                }
                Ok(items.remove(index))
            },
            _ => Err(no_token(pointer)),
        })
    }

    /// Search keys and scalar values below `pointer`. Literal matching is
    /// case-sensitive.
    pub fn query(&self, pattern: &Pattern, pointer: &str) -> Result<JsonQuery> {
        let matcher = pattern.compile(false)?;
        let root = self.token(pointer)?;
        Ok(JsonQuery {
            base: normalize_pointer(pointer)?.to_string(),
            root,
            matcher,
        })
    }

    /// Replace matches inside string values below `pointer`, returning the
    /// number of replacements.
    pub fn replace(&self, pattern: &Pattern, with: &str, pointer: &str) -> Result<usize> {
        let matcher = pattern.compile(false)?;
        let pointer = normalize_pointer(pointer)?;
        self.mutate(|root| {
            let scope = token_mut(root, pointer)?;
            Ok(replace_strings(scope, &matcher, pattern.mode, with))
        })
    }
}

fn replace_strings(value: &mut Value, matcher: &Regex, mode: MatchMode, with: &str) -> usize {
    match value {
        Value::String(s) => {
            let count = matcher.find_iter(s.as_str()).count();
            if count > 0 {
                *s = match mode {
                    MatchMode::Literal => matcher.replace_all(s.as_str(), NoExpand(with)).into_owned(),
                    MatchMode::Regex => matcher.replace_all(s.as_str(), with).into_owned(),
                };
            }
            count
        },
        Value::Array(items) => items
            .iter_mut()
            .map(|v| replace_strings(v, matcher, mode, with))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|v| replace_strings(v, matcher, mode, with))
            .sum(),
        _ => 0,
    }
}
