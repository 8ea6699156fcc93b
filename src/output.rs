//! Rendering a parse result for shell scripts or as JSON, and persisting it
//! to a temporary file the caller can source or read.

use crate::result::{ParseResult, Slot};
use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Heredoc delimiter for help output.
const HELP_DELIMITER: &str = "CLOPTS_HELP";

/// Quote a string as a single shell word.
///
/// Single quotes keep every character literal, including newlines, `$` and
/// `!`; an embedded `'` closes the quote, emits an escaped quote and reopens.
fn quote_shell_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Convert an option name to a valid shell variable name.
///
/// Leading dashes are dropped, the rest is upper-cased and anything that
/// is not alphanumeric becomes an underscore.
fn to_shell_var_name(name: &str) -> String {
    name.trim_start_matches('-')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn shell_array<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let items: Vec<String> = values
        .into_iter()
        .map(|value| quote_shell_value(&value.to_string()))
        .collect();
    format!("({})", items.join(" "))
}

/// Render shell assignments for every flag and value option.
///
/// Flags become `true`/`false` and multiple options become bash arrays.
/// Arrays cannot be exported, so they are plain assignments. Absent single
/// values are `unset`, so nothing leaks in from the caller's environment.
/// If the schema has a stop sentinel, the tokens after it are written as
/// `<prefix>UNPROCESSED`.
pub fn render_shell(result: &ParseResult<'_>, prefix: &str) -> String {
    let mut output = String::new();

    for spec in result.schema().iter() {
        if !(spec.is_flag() || spec.holds_value()) {
            continue;
        }
        let var_name = format!("{}{}", prefix, to_shell_var_name(spec.name()));
        match result.get(spec.name()) {
            Ok(Slot::Flag(found)) => {
                output.push_str(&format!("export {}='{}'\n", var_name, found));
            }
            Ok(Slot::Value(Some(value))) => {
                output.push_str(&format!(
                    "export {}={}\n",
                    var_name,
                    quote_shell_value(&value.to_string())
                ));
            }
            Ok(Slot::Value(None)) => {
                output.push_str(&format!("unset {}\n", var_name));
            }
            Ok(Slot::Values(values)) => {
                output.push_str(&format!("{}={}\n", var_name, shell_array(values)));
            }
            Err(_) => {}
        }
    }

    if result.schema().has_stop_parsing() {
        output.push_str(&format!(
            "{}UNPROCESSED={}\n",
            prefix,
            shell_array(result.unprocessed())
        ));
    }

    output
}

#[derive(Serialize)]
struct JsonDocument<'r> {
    program: &'r str,
    options: IndexMap<&'r str, Slot<'r>>,
    unprocessed: &'r [String],
}

/// Render the result as a JSON object.
///
/// `options` maps every flag and value option, in declaration order, to its
/// state: a boolean, a value or `null`, or an array. File values carry their
/// path and contents, and referencing options carry their snapshots.
pub fn render_json(result: &ParseResult<'_>) -> Result<String> {
    let mut options = IndexMap::new();
    for spec in result.schema().iter() {
        if spec.is_flag() || spec.holds_value() {
            options.insert(spec.name(), result.get(spec.name())?);
        }
    }

    let document = JsonDocument {
        program: result.program(),
        options,
        unprocessed: result.unprocessed(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Shell code that prints `message` to stderr and exits 1 when sourced.
pub fn render_error(program: &str, message: &str) -> String {
    format!(
        "printf '%s\\n' {} >&2\nexit 1\n",
        quote_shell_value(&format!("{}: {}", program, message))
    )
}

/// Shell code that prints the help text and exits 0 when sourced.
pub fn render_help_output(help_text: &str) -> String {
    format!(
        "cat <<'{delimiter}'\n{text}{delimiter}\nexit 0\n",
        delimiter = HELP_DELIMITER,
        text = help_text
    )
}

/// Write content to a temporary file and return its path.
///
/// The file persists after the process exits.
pub fn write_temp(content: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    let path = file.into_temp_path().keep()?;
    Ok(path)
}
