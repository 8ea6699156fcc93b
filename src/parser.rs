//! Tokenizing and matching an argument vector against a schema.

use crate::error::{Disposition, ErrorContext, ErrorPolicy, ExitOnError, ParseError};
use crate::help::render_help;
use crate::reference::capture;
use crate::result::ParseResult;
use crate::schema::{default_help_handler, OptionKind, Schema};
use crate::store::Store;
use crate::value::{coerce, FsLoader, ResourceLoader};
use std::any::Any;
use tracing::{debug, trace};

/// A configured parse of one argument vector.
///
/// Element 0 of the arguments is the program name and is never matched.
/// [`Parse::run`] consumes the value, so the state it builds is used for
/// exactly one parse.
pub struct Parse<'s, 'c> {
    schema: &'s Schema,
    args: Vec<String>,
    policy: Box<dyn ErrorPolicy + 'c>,
    loader: &'c dyn ResourceLoader,
    context: Option<&'c mut dyn Any>,
}

impl<'s, 'c> Parse<'s, 'c> {
    pub fn new<I, S>(schema: &'s Schema, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schema,
            args: args.into_iter().map(Into::into).collect(),
            policy: Box::new(ExitOnError),
            loader: &FsLoader,
            context: None,
        }
    }

    /// Replace the default [`ExitOnError`] policy.
    pub fn policy(mut self, policy: impl ErrorPolicy + 'c) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Loader used for file-typed options. Defaults to [`FsLoader`].
    pub fn loader(mut self, loader: &'c dyn ResourceLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Context handed to every callback option.
    pub fn context(mut self, context: &'c mut dyn Any) -> Self {
        self.context = Some(context);
        self
    }

    /// Run the parse.
    ///
    /// Returns the error the policy aborted on, if any. Errors the policy
    /// chose to continue past leave the affected options unset.
    pub fn run(self) -> Result<ParseResult<'s>, ParseError> {
        let mut state = ParseState {
            schema: self.schema,
            store: Store::for_schema(self.schema),
            args: self.args,
            cursor: 1,
            policy: self.policy,
            loader: self.loader,
            context: self.context,
            aborted: None,
            unprocessed: Vec::new(),
        };
        state.parse();

        match state.aborted {
            Some(error) => Err(error),
            None => {
                let program = state.args.into_iter().next().unwrap_or_default();
                Ok(ParseResult::new(
                    state.schema,
                    program,
                    state.store,
                    state.unprocessed,
                ))
            }
        }
    }
}

/// Mutable state of a single parse.
struct ParseState<'s, 'c> {
    schema: &'s Schema,
    store: Store,
    args: Vec<String>,
    cursor: usize,
    policy: Box<dyn ErrorPolicy + 'c>,
    loader: &'c dyn ResourceLoader,
    context: Option<&'c mut dyn Any>,
    aborted: Option<ParseError>,
    unprocessed: Vec<String>,
}

impl ParseState<'_, '_> {
    fn parse(&mut self) {
        while self.cursor < self.args.len() {
            let token = self.args[self.cursor].clone();

            if let Some(index) = self.stop_sentinel(&token) {
                self.store.mark_found(index);
                self.unprocessed = self.args[self.cursor + 1..].to_vec();
                debug!(
                    sentinel = %token,
                    unprocessed = self.unprocessed.len(),
                    "stop sentinel reached"
                );
                break;
            }

            if !self.handle_named(&token) && !self.handle_positional(&token) {
                self.report(ParseError::UnrecognizedOption(token));
            }

            if self.aborted.is_some() {
                return;
            }
            self.cursor += 1;
        }

        self.validate_required();
    }

    fn stop_sentinel(&self, token: &str) -> Option<usize> {
        self.schema
            .iter()
            .position(|spec| spec.is_stop_parsing() && spec.name() == token)
    }

    /// Try every non-positional option in declaration order; first match wins.
    ///
    /// Returns `true` if the token belonged to an option, even when handling
    /// it raised an error.
    fn handle_named(&mut self, token: &str) -> bool {
        let schema = self.schema;
        for (index, spec) in schema.iter().enumerate() {
            if spec.is_positional() || spec.is_stop_parsing() {
                continue;
            }
            let name = spec.name();
            if !token.starts_with(name) {
                continue;
            }

            if !spec.takes_argument() {
                // `--verbose` must not claim `--verbose-extra`
                if token != name {
                    continue;
                }
                self.dispatch(index, token, token, None);
                return true;
            }

            if token.len() > name.len() {
                let rest = &token[name.len()..];
                let (matched, value) = if let Some(value) = rest.strip_prefix('=') {
                    (&token[..=name.len()], value)
                } else if spec.is_short() {
                    (name, rest)
                } else {
                    continue;
                };
                self.dispatch(index, token, matched, Some(value.to_string()));
                return true;
            }

            if self.cursor + 1 >= self.args.len() {
                self.report(ParseError::MissingArgument(token.to_string()));
                return true;
            }
            self.cursor += 1;
            let value = self.args[self.cursor].clone();
            self.dispatch(index, token, token, Some(value));
            return true;
        }
        false
    }

    /// Give the token to the first positional that can still take a value.
    fn handle_positional(&mut self, token: &str) -> bool {
        let schema = self.schema;
        for (index, spec) in schema.iter().enumerate() {
            if !spec.is_positional() {
                continue;
            }
            if !spec.is_multiple() && self.store.is_found(index) {
                continue;
            }
            self.dispatch(index, token, spec.name(), Some(token.to_string()));
            return true;
        }
        false
    }

    /// Apply one match. `token` is the argument that named the option,
    /// `matched` the name as written in it and `raw` the value, if any.
    fn dispatch(&mut self, index: usize, token: &str, matched: &str, raw: Option<String>) {
        let schema = self.schema;
        let spec = schema.spec_at(index);
        trace!(option = spec.name(), matched, value = ?raw, "matched option");

        match spec.kind() {
            OptionKind::Callback { callback, .. } => {
                self.store.mark_found(index);
                let mut unit = ();
                let context: &mut dyn Any = match self.context.as_deref_mut() {
                    Some(context) => context,
                    None => &mut unit,
                };
                callback(context, matched, raw.as_deref());
            }
            OptionKind::Help(handler) => {
                self.store.mark_found(index);
                let program = self.args.first().map(String::as_str).unwrap_or_default();
                let help = render_help(schema);
                match handler {
                    Some(handler) => handler(program, &help),
                    None => default_help_handler(program, &help),
                }
            }
            OptionKind::Flag => {
                if self.store.is_found(index) && !spec.is_overridable() {
                    self.report(ParseError::DuplicateOption(token.to_string()));
                    return;
                }
                self.store.mark_found(index);
            }
            OptionKind::StopParsing => {}
            OptionKind::Value { .. } | OptionKind::Positional => {
                if self.store.is_found(index) && !spec.is_multiple() && !spec.is_overridable() {
                    self.report(ParseError::DuplicateOption(token.to_string()));
                    return;
                }

                let raw = raw.unwrap_or_default();
                match coerce(spec.name(), &raw, spec.value_type(), self.loader) {
                    Ok(value) => {
                        let value = capture(schema, &self.store, spec, value);
                        self.store.write(index, value);
                    }
                    Err(error) => self.report(error),
                }
            }
        }
    }

    /// Required options that were never matched.
    fn validate_required(&mut self) {
        let schema = self.schema;
        for (index, spec) in schema.iter().enumerate() {
            if spec.is_required() && !self.store.is_found(index) {
                self.report(ParseError::MissingRequiredOption(spec.name().to_string()));
                if self.aborted.is_some() {
                    return;
                }
            }
        }
    }

    /// Route an error through the policy.
    fn report(&mut self, error: ParseError) {
        let context = ErrorContext {
            program: self.args.first().map(String::as_str).unwrap_or_default(),
            schema: self.schema,
        };
        let disposition = self.policy.on_error(&error, &context);
        debug!(%error, ?disposition, "parse error");
        if disposition == Disposition::Abort && self.aborted.is_none() {
            self.aborted = Some(error);
        }
    }
}
