//! Typed option values and coercion of raw tokens into them.

use crate::error::ParseError;
use crate::reference::RefTuple;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// A fixed allow-list for an enumerated option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choices {
    /// Allowed string values. The empty string may be one of them.
    Strings(Vec<String>),
    /// Allowed integer values.
    Integers(Vec<i64>),
}

impl Choices {
    /// Build a string allow-list.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Choices::Strings(values.into_iter().map(Into::into).collect())
    }

    /// Build an integer allow-list.
    pub fn integers<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Choices::Integers(values.into_iter().collect())
    }

    /// Check whether an already coerced value is a member of the set.
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Choices::Strings(allowed), Value::Str(s)) => allowed.iter().any(|a| a == s),
            (Choices::Integers(allowed), Value::Int(i)) => allowed.contains(i),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Choices::Strings(v) => v.len(),
            Choices::Integers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The allowed values joined with ", ", in declaration order.
    pub fn display_list(&self) -> String {
        match self {
            Choices::Strings(v) => v.join(", "),
            Choices::Integers(v) => v
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// First value that appears more than once, if any.
    pub(crate) fn first_duplicate(&self) -> Option<String> {
        let rendered: Vec<String> = match self {
            Choices::Strings(v) => v.clone(),
            Choices::Integers(v) => v.iter().map(|i| i.to_string()).collect(),
        };
        let mut seen = std::collections::HashSet::new();
        rendered.into_iter().find(|value| !seen.insert(value.clone()))
    }
}

/// The declared type of a single option value.
///
/// Multi-valued options use the same element type; accumulation is
/// controlled by the `multiple` modifier on the option itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueType {
    /// Any string, including the empty string.
    #[default]
    String,
    /// Signed 64-bit base-10 integer.
    Integer,
    /// 64-bit floating-point number.
    Float,
    /// A path whose contents are loaded through a [`ResourceLoader`].
    File,
    /// A string or integer restricted to a fixed set of values.
    OneOf(Choices),
}

impl ValueType {
    /// Type name shown in help text.
    pub fn help_name(&self) -> &'static str {
        match self {
            ValueType::String | ValueType::OneOf(Choices::Strings(_)) => "string",
            ValueType::Integer | ValueType::Float | ValueType::OneOf(Choices::Integers(_)) => {
                "number"
            }
            ValueType::File => "file",
        }
    }

    pub fn choices(&self) -> Option<&Choices> {
        match self {
            ValueType::OneOf(choices) => Some(choices),
            _ => None,
        }
    }
}

/// A loaded file: the path it was read from and its raw contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileData {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_contents")]
    pub contents: Vec<u8>,
}

impl FileData {
    /// The contents decoded as UTF-8, replacing invalid sequences.
    pub fn contents_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

fn serialize_contents<S>(contents: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(contents))
}

/// Loads the resource named by a file-typed option.
pub trait ResourceLoader {
    fn load(&self, path: &str) -> io::Result<FileData>;
}

/// Reads files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl ResourceLoader for FsLoader {
    fn load(&self, path: &str) -> io::Result<FileData> {
        let contents = std::fs::read(path)?;
        Ok(FileData {
            path: PathBuf::from(path),
            contents,
        })
    }
}

impl<F> ResourceLoader for F
where
    F: Fn(&str) -> io::Result<FileData>,
{
    fn load(&self, path: &str) -> io::Result<FileData> {
        self(path)
    }
}

/// A parsed option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    File(FileData),
    /// An option value bundled with snapshots of the options it references.
    Tuple(RefTuple),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileData> {
        match self {
            Value::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&RefTuple> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::File(file) => write!(f, "{}", file.path.display()),
            Value::Tuple(tuple) => write!(f, "{}", tuple.value()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Coerce one raw token into a value of the given type.
///
/// `option` is the schema name used in error messages.
pub fn coerce(
    option: &str,
    raw: &str,
    value_type: &ValueType,
    loader: &dyn ResourceLoader,
) -> Result<Value, ParseError> {
    match value_type {
        ValueType::String => Ok(Value::Str(raw.to_string())),
        ValueType::Integer => parse_integer(option, raw).map(Value::Int),
        ValueType::Float => parse_float(option, raw).map(Value::Float),
        ValueType::File => loader
            .load(raw)
            .map(Value::File)
            .map_err(|e| ParseError::ResourceUnavailable {
                option: option.to_string(),
                path: raw.to_string(),
                reason: e.to_string(),
            }),
        ValueType::OneOf(choices) => {
            let value = match choices {
                Choices::Strings(_) => Value::Str(raw.to_string()),
                Choices::Integers(_) => Value::Int(parse_integer(option, raw)?),
            };
            if choices.contains(&value) {
                Ok(value)
            } else {
                Err(ParseError::InvalidValue {
                    option: option.to_string(),
                    value: raw.to_string(),
                })
            }
        }
    }
}

fn parse_integer(option: &str, raw: &str) -> Result<i64, ParseError> {
    raw.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
        option: option.to_string(),
        value: raw.to_string(),
        expected: "integer",
    })
}

fn parse_float(option: &str, raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        option: option.to_string(),
        value: raw.to_string(),
        expected: "floating-point number",
    })
}
