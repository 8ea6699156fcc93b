//! Option declarations and the validated, immutable schema built from them.

use crate::error::{ExitOnError, FailFast, ParseError};
use crate::parser::Parse;
use crate::result::ParseResult;
use crate::value::ValueType;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Name of the stop sentinel when none is given.
pub const DEFAULT_STOP_SENTINEL: &str = "--";

/// Name of the built-in help option.
pub const HELP_OPTION: &str = "--help";

const HELP_DESCRIPTION: &str = "Print this help information";

/// Errors in the schema itself. These indicate a programming mistake rather
/// than bad user input and are detected before any argument is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("option name may not be empty")]
    EmptyName,

    #[error("duplicate option name: {0}")]
    DuplicateName(String),

    #[error("option '{option}' starts with the name of short option '{short}'")]
    ShortPrefix { short: String, option: String },

    #[error("only one positional option may be multiple: '{0}' and '{1}'")]
    MultiplePositionals(String, String),

    #[error("'{modifier}' cannot be used on {kind} '{option}'")]
    InvalidModifier {
        option: String,
        modifier: &'static str,
        kind: &'static str,
    },

    #[error("option '{option}' references unknown option '{target}'")]
    UnknownReference { option: String, target: String },

    #[error("option '{option}' references '{target}', which itself has references")]
    ChainedReference { option: String, target: String },

    #[error("option '{option}' cannot reference {kind} '{target}'")]
    InvalidReferenceTarget {
        option: String,
        target: String,
        kind: &'static str,
    },

    #[error("'choices' on option '{0}' is empty: must have at least one valid value")]
    EmptyChoices(String),

    #[error("'choices' on option '{0}' has duplicate value: {1}")]
    DuplicateChoice(String, String),

    #[error("there is no option with the name '{0}'")]
    UnknownOptionName(String),

    #[error("option '{option}' does not hold {expected}")]
    KindMismatch {
        option: String,
        expected: &'static str,
    },
}

/// Callback bound to an option: (context, matched name, value if any).
pub type CallbackFn = Arc<dyn Fn(&mut dyn Any, &str, Option<&str>) + Send + Sync>;

/// Handler invoked by the help option with (program name, rendered help).
pub type HelpHandler = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Whether a callback option consumes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    NoArg,
    WithArg,
}

/// What kind of option a spec declares.
#[derive(Clone)]
pub enum OptionKind {
    /// Presence is the value.
    Flag,
    /// Takes a value as `name=value` or `name value`. Short options also
    /// accept the value glued to the name (`-fPATH`).
    Value { short: bool },
    /// Matched by position rather than by name.
    Positional,
    Callback { arity: Arity, callback: CallbackFn },
    /// Renders the help text and hands it to the handler; `None` prints
    /// usage to stdout and exits 0.
    Help(Option<HelpHandler>),
    /// Ends the parse; every remaining token is left unprocessed.
    StopParsing,
}

impl OptionKind {
    fn describe(&self) -> &'static str {
        match self {
            OptionKind::Flag => "flag",
            OptionKind::Value { .. } => "option",
            OptionKind::Positional => "positional option",
            OptionKind::Callback { .. } => "callback option",
            OptionKind::Help(_) => "help option",
            OptionKind::StopParsing => "stop-parsing option",
        }
    }
}

impl fmt::Debug for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Flag => f.write_str("Flag"),
            OptionKind::Value { short } => f.debug_struct("Value").field("short", short).finish(),
            OptionKind::Positional => f.write_str("Positional"),
            OptionKind::Callback { arity, .. } => {
                f.debug_struct("Callback").field("arity", arity).finish()
            }
            OptionKind::Help(_) => f.write_str("Help"),
            OptionKind::StopParsing => f.write_str("StopParsing"),
        }
    }
}

pub(crate) fn default_help_handler(program: &str, help: &str) {
    if program.is_empty() {
        print!("Usage: {}", help);
    } else {
        print!("Usage: {} {}", program, help);
    }
    std::process::exit(0)
}

/// Declaration of one recognized option.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    name: String,
    description: String,
    kind: OptionKind,
    value_type: ValueType,
    required: bool,
    overridable: bool,
    multiple: bool,
    references: Vec<String>,
}

impl OptionSpec {
    fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            value_type: ValueType::String,
            required: false,
            overridable: false,
            multiple: false,
            references: Vec::new(),
        }
    }

    /// A boolean flag such as `--verbose`.
    pub fn flag(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, OptionKind::Flag)
    }

    /// A value-taking option such as `--output file.txt`.
    pub fn value(
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let mut spec = Self::new(name, description, OptionKind::Value { short: false });
        spec.value_type = value_type;
        spec
    }

    /// A value-taking option whose value may follow the name directly,
    /// e.g. `-fPATH`.
    pub fn short(
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let mut spec = Self::new(name, description, OptionKind::Value { short: true });
        spec.value_type = value_type;
        spec
    }

    /// A positional option. Positionals are required unless made
    /// [`optional`](Self::optional).
    pub fn positional(
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let mut spec = Self::new(name, description, OptionKind::Positional);
        spec.value_type = value_type;
        spec.required = true;
        spec
    }

    /// An option that invokes `handler` with (context, name) when matched.
    pub fn callback<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut dyn Any, &str) + Send + Sync + 'static,
    {
        let callback: CallbackFn =
            Arc::new(move |ctx: &mut dyn Any, name: &str, _: Option<&str>| handler(ctx, name));
        Self::new(
            name,
            description,
            OptionKind::Callback {
                arity: Arity::NoArg,
                callback,
            },
        )
    }

    /// An option that invokes `handler` with (context, name, value).
    pub fn callback_with_arg<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut dyn Any, &str, &str) + Send + Sync + 'static,
    {
        let callback: CallbackFn =
            Arc::new(move |ctx: &mut dyn Any, name: &str, value: Option<&str>| {
                handler(ctx, name, value.unwrap_or_default())
            });
        Self::new(
            name,
            description,
            OptionKind::Callback {
                arity: Arity::WithArg,
                callback,
            },
        )
    }

    /// A stop sentinel with a custom name.
    pub fn stop_parsing(name: impl Into<String>) -> Self {
        Self::new(
            name,
            "Stop parsing command-line arguments",
            OptionKind::StopParsing,
        )
    }

    /// The `--` stop sentinel.
    pub fn stop_parsing_default() -> Self {
        Self::stop_parsing(DEFAULT_STOP_SENTINEL)
    }

    /// The built-in `--help` option; prints usage to stdout and exits 0.
    pub fn help() -> Self {
        Self::new(HELP_OPTION, HELP_DESCRIPTION, OptionKind::Help(None))
    }

    /// The built-in `--help` option with a custom handler.
    pub fn help_with(handler: HelpHandler) -> Self {
        Self::new(HELP_OPTION, HELP_DESCRIPTION, OptionKind::Help(Some(handler)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Later occurrences replace earlier ones instead of raising an error.
    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }

    /// Occurrences accumulate into an ordered sequence.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Snapshot the named options each time this option is matched.
    pub fn references<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn reference_names(&self) -> &[String] {
        &self.references
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.kind, OptionKind::Positional)
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, OptionKind::Flag)
    }

    pub fn is_short(&self) -> bool {
        matches!(self.kind, OptionKind::Value { short: true })
    }

    pub fn is_stop_parsing(&self) -> bool {
        matches!(self.kind, OptionKind::StopParsing)
    }

    /// Whether this option stores a coerced value (as opposed to a found-bit).
    pub fn holds_value(&self) -> bool {
        matches!(self.kind, OptionKind::Value { .. } | OptionKind::Positional)
    }

    /// Whether a named match of this option consumes a value.
    pub fn takes_argument(&self) -> bool {
        matches!(
            self.kind,
            OptionKind::Value { .. }
                | OptionKind::Positional
                | OptionKind::Callback {
                    arity: Arity::WithArg,
                    ..
                }
        )
    }

    fn invalid(&self, modifier: &'static str) -> SchemaError {
        SchemaError::InvalidModifier {
            option: self.name.clone(),
            modifier,
            kind: self.kind.describe(),
        }
    }

    /// Checks that only depend on this spec.
    fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName);
        }

        match self.kind {
            OptionKind::Flag => {
                if self.required {
                    return Err(self.invalid("required"));
                }
                if self.multiple {
                    return Err(self.invalid("multiple"));
                }
            }
            OptionKind::Value { .. } => {
                if self.multiple && self.overridable {
                    return Err(self.invalid("overridable"));
                }
            }
            OptionKind::Positional => {
                if self.overridable {
                    return Err(self.invalid("overridable"));
                }
            }
            OptionKind::Callback { .. } => {
                if self.multiple {
                    return Err(self.invalid("multiple"));
                }
                if self.overridable {
                    return Err(self.invalid("overridable"));
                }
            }
            OptionKind::Help(_) | OptionKind::StopParsing => {
                if self.required {
                    return Err(self.invalid("required"));
                }
                if self.multiple {
                    return Err(self.invalid("multiple"));
                }
                if self.overridable {
                    return Err(self.invalid("overridable"));
                }
            }
        }

        if !self.references.is_empty() && !self.holds_value() {
            return Err(self.invalid("references"));
        }

        if self.holds_value() {
            if let Some(choices) = self.value_type.choices() {
                if choices.is_empty() {
                    return Err(SchemaError::EmptyChoices(self.name.clone()));
                }
                if let Some(dup) = choices.first_duplicate() {
                    return Err(SchemaError::DuplicateChoice(self.name.clone(), dup));
                }
            }
        }

        Ok(())
    }
}

/// Handle to an option, resolved against a schema before any input is read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionKey {
    index: usize,
    name: String,
}

impl OptionKey {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Anything that names an option in a schema.
pub trait Lookup {
    fn resolve(&self, schema: &Schema) -> Result<usize, SchemaError>;
}

impl Lookup for str {
    fn resolve(&self, schema: &Schema) -> Result<usize, SchemaError> {
        schema
            .index_of(self)
            .ok_or_else(|| SchemaError::UnknownOptionName(self.to_string()))
    }
}

impl Lookup for String {
    fn resolve(&self, schema: &Schema) -> Result<usize, SchemaError> {
        self.as_str().resolve(schema)
    }
}

impl Lookup for OptionKey {
    fn resolve(&self, schema: &Schema) -> Result<usize, SchemaError> {
        match schema.options.get_index(self.index) {
            Some((name, _)) if *name == self.name => Ok(self.index),
            _ => Err(SchemaError::UnknownOptionName(self.name.clone())),
        }
    }
}

impl<T: Lookup + ?Sized> Lookup for &T {
    fn resolve(&self, schema: &Schema) -> Result<usize, SchemaError> {
        (**self).resolve(schema)
    }
}

/// Collects option declarations; [`SchemaBuilder::build`] validates them.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: Vec<OptionSpec>,
}

impl SchemaBuilder {
    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    pub fn options<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        self.options.extend(specs);
        self
    }

    /// Validate every declaration and freeze them into a [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut options = IndexMap::with_capacity(self.options.len());
        for spec in self.options {
            spec.validate()?;
            if options.contains_key(spec.name()) {
                return Err(SchemaError::DuplicateName(spec.name.clone()));
            }
            options.insert(spec.name.clone(), spec);
        }

        let schema = Schema { options };
        schema.validate_short_prefixes()?;
        schema.validate_multiple_positionals()?;
        schema.validate_references()?;
        Ok(schema)
    }
}

/// An immutable, validated set of options.
///
/// Lookup by name is O(1); iteration follows declaration order. A schema can
/// be shared freely between concurrent parses.
#[derive(Debug, Clone)]
pub struct Schema {
    options: IndexMap<String, OptionSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.values()
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.options.get_index_of(name)
    }

    pub(crate) fn spec_at(&self, index: usize) -> &OptionSpec {
        &self.options[index]
    }

    /// Resolve `name` to a key, failing if the schema has no such option.
    pub fn key(&self, name: &str) -> Result<OptionKey, SchemaError> {
        let index = name.resolve(self)?;
        Ok(OptionKey {
            index,
            name: name.to_string(),
        })
    }

    pub fn has_stop_parsing(&self) -> bool {
        self.iter().any(OptionSpec::is_stop_parsing)
    }

    /// Start configuring a parse of `args`. Element 0 is the program name.
    ///
    /// Errors are handled by [`ExitOnError`] unless another policy is set.
    pub fn parse<'c, I, S>(&self, args: I) -> Parse<'_, 'c>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Parse::new(self, args)
    }

    /// Parse `args`, returning the first error instead of exiting.
    pub fn try_parse<I, S>(&self, args: I) -> Result<ParseResult<'_>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Parse::new(self, args).policy(FailFast).run()
    }

    /// Parse `args`; on error print usage and exit the process.
    pub fn parse_or_exit<I, S>(&self, args: I) -> ParseResult<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match Parse::new(self, args).policy(ExitOnError).run() {
            Ok(result) => result,
            // ExitOnError never lets an error through
            Err(_) => std::process::exit(1),
        }
    }

    fn validate_short_prefixes(&self) -> Result<(), SchemaError> {
        for short in self.iter().filter(|s| s.is_short()) {
            for other in self.iter() {
                if other.name() != short.name()
                    && !other.is_stop_parsing()
                    && other.name().starts_with(short.name())
                {
                    return Err(SchemaError::ShortPrefix {
                        short: short.name.clone(),
                        option: other.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_multiple_positionals(&self) -> Result<(), SchemaError> {
        let mut first: Option<&OptionSpec> = None;
        for spec in self.iter().filter(|s| s.is_positional() && s.is_multiple()) {
            if let Some(prev) = first {
                return Err(SchemaError::MultiplePositionals(
                    prev.name.clone(),
                    spec.name.clone(),
                ));
            }
            first = Some(spec);
        }
        Ok(())
    }

    fn validate_references(&self) -> Result<(), SchemaError> {
        for spec in self.iter() {
            let mut seen = HashSet::new();
            for target in &spec.references {
                if !seen.insert(target) {
                    return Err(SchemaError::InvalidModifier {
                        option: spec.name.clone(),
                        modifier: "references",
                        kind: spec.kind.describe(),
                    });
                }
                let referenced =
                    self.get(target)
                        .ok_or_else(|| SchemaError::UnknownReference {
                            option: spec.name.clone(),
                            target: target.clone(),
                        })?;
                if !referenced.references.is_empty() {
                    return Err(SchemaError::ChainedReference {
                        option: spec.name.clone(),
                        target: target.clone(),
                    });
                }
                if !(referenced.is_flag() || referenced.holds_value()) {
                    return Err(SchemaError::InvalidReferenceTarget {
                        option: spec.name.clone(),
                        target: target.clone(),
                        kind: referenced.kind.describe(),
                    });
                }
            }
        }
        Ok(())
    }
}
