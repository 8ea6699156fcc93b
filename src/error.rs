//! Runtime parse errors and the policy that decides whether parsing goes on.

use crate::help::{render_help, render_usage};
use crate::schema::{OptionKind, Schema};
use thiserror::Error;

/// Errors caused by the argument vector being parsed.
///
/// Mistakes in the schema itself are reported separately through
/// [`SchemaError`](crate::schema::SchemaError) and never reach a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized option: \"{0}\"")]
    UnrecognizedOption(String),

    #[error("Missing argument for option \"{0}\"")]
    MissingArgument(String),

    #[error("Duplicate option: \"{0}\"")]
    DuplicateOption(String),

    #[error("{}", number_message(.expected, .value))]
    InvalidNumber {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid value for option '{option}': '{value}'")]
    InvalidValue { option: String, value: String },

    #[error("Could not read file \"{path}\": {reason}")]
    ResourceUnavailable {
        option: String,
        path: String,
        reason: String,
    },

    #[error("Option \"{0}\" is required")]
    MissingRequiredOption(String),
}

fn number_message(expected: &str, value: &str) -> String {
    if value.is_empty() {
        format!("Expected {}, got empty string", expected)
    } else {
        format!("{} does not appear to be a valid {}", value, expected)
    }
}

/// What the parser should do after an error was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep parsing; the offending option stays unset.
    Continue,
    /// Stop; the parse attempt has failed.
    Abort,
}

/// Information available to a policy besides the error itself.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    /// Element 0 of the argument vector.
    pub program: &'a str,
    pub schema: &'a Schema,
}

/// Decides how each runtime error is handled.
///
/// Every input-dependent error is funneled through exactly one call to
/// [`ErrorPolicy::on_error`]. Closures taking a `&ParseError` implement this
/// trait directly.
pub trait ErrorPolicy {
    fn on_error(&mut self, error: &ParseError, context: &ErrorContext<'_>) -> Disposition;
}

impl<F> ErrorPolicy for F
where
    F: FnMut(&ParseError) -> Disposition,
{
    fn on_error(&mut self, error: &ParseError, _context: &ErrorContext<'_>) -> Disposition {
        self(error)
    }
}

/// Aborts on the first error without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl ErrorPolicy for FailFast {
    fn on_error(&mut self, _error: &ParseError, _context: &ErrorContext<'_>) -> Disposition {
        Disposition::Abort
    }
}

/// Prints the error to stderr, shows usage and exits with status 1.
///
/// Usage goes to the schema's custom help handler if it has one, and to
/// stderr otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitOnError;

impl ErrorPolicy for ExitOnError {
    fn on_error(&mut self, error: &ParseError, context: &ErrorContext<'_>) -> Disposition {
        if context.program.is_empty() {
            eprintln!("{}", error);
        } else {
            eprintln!("{}: {}", context.program, error);
        }
        show_usage(context);
        std::process::exit(1)
    }
}

/// Returns `true` if a custom help handler was invoked.
fn show_usage(context: &ErrorContext<'_>) -> bool {
    let handler = context.schema.iter().find_map(|spec| match spec.kind() {
        OptionKind::Help(Some(handler)) => Some(handler),
        _ => None,
    });
    match handler {
        Some(handler) => {
            handler(context.program, &render_help(context.schema));
            true
        }
        None => {
            eprint!("{}", render_usage(context.program, context.schema));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ParseError::UnrecognizedOption("--nope".to_string()).to_string(),
            "Unrecognized option: \"--nope\""
        );
        assert_eq!(
            ParseError::MissingArgument("--out".to_string()).to_string(),
            "Missing argument for option \"--out\""
        );
        assert_eq!(
            ParseError::DuplicateOption("--out=x".to_string()).to_string(),
            "Duplicate option: \"--out=x\""
        );
        assert_eq!(
            ParseError::MissingRequiredOption("input".to_string()).to_string(),
            "Option \"input\" is required"
        );
    }

    #[test]
    fn test_invalid_number_messages() {
        let empty = ParseError::InvalidNumber {
            option: "--n".to_string(),
            value: String::new(),
            expected: "floating-point number",
        };
        assert_eq!(
            empty.to_string(),
            "Expected floating-point number, got empty string"
        );

        let garbage = ParseError::InvalidNumber {
            option: "--n".to_string(),
            value: "x1".to_string(),
            expected: "integer",
        };
        assert_eq!(garbage.to_string(), "x1 does not appear to be a valid integer");
    }

    #[test]
    fn test_closure_policy() {
        let schema = Schema::builder().build().unwrap();
        let context = ErrorContext {
            program: "prog",
            schema: &schema,
        };
        let mut seen = Vec::new();
        let mut policy = |e: &ParseError| {
            seen.push(e.to_string());
            Disposition::Continue
        };
        let disposition = policy.on_error(
            &ParseError::UnrecognizedOption("x".to_string()),
            &context,
        );
        assert_eq!(disposition, Disposition::Continue);
        assert_eq!(seen, vec!["Unrecognized option: \"x\"".to_string()]);
    }

    #[test]
    fn test_usage_goes_to_custom_help_handler() {
        use crate::schema::OptionSpec;
        use std::sync::{Arc, Mutex};

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let schema = Schema::builder()
            .option(OptionSpec::flag("--all", "Everything"))
            .option(OptionSpec::help_with(Arc::new(move |program: &str, help: &str| {
                sink.lock().unwrap().push((program.to_string(), help.to_string()));
            })))
            .build()
            .unwrap();
        let context = ErrorContext {
            program: "prog",
            schema: &schema,
        };

        assert!(show_usage(&context));
        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("prog".to_string(), render_help(&schema)));
    }

    #[test]
    fn test_usage_without_custom_help_handler() {
        use crate::schema::OptionSpec;

        let plain = Schema::builder()
            .option(OptionSpec::flag("--all", "Everything"))
            .build()
            .unwrap();
        assert!(!show_usage(&ErrorContext {
            program: "prog",
            schema: &plain,
        }));

        let builtin = Schema::builder().option(OptionSpec::help()).build().unwrap();
        assert!(!show_usage(&ErrorContext {
            program: "prog",
            schema: &builtin,
        }));
    }

    #[test]
    fn test_fail_fast_aborts() {
        let schema = Schema::builder().build().unwrap();
        let context = ErrorContext {
            program: "prog",
            schema: &schema,
        };
        assert_eq!(
            FailFast.on_error(&ParseError::MissingArgument("--x".to_string()), &context),
            Disposition::Abort
        );
    }
}
