//! JSON schema descriptions, for building a [`Schema`] without Rust code.

use crate::schema::{HelpHandler, OptionSpec, Schema, SchemaError};
use crate::value::{Choices, ValueType};
use serde::Deserialize;
use thiserror::Error;

/// Prefix for output variable names when the description sets none.
pub const DEFAULT_PREFIX: &str = "CLOPTS_";

/// Errors that can occur while loading a schema description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("'choices' on option '{0}' do not match its type '{1}'")]
    ChoicesTypeMismatch(String, &'static str),
}

/// How an option is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptionKindConfig {
    /// A boolean flag (e.g., --verbose)
    Flag,
    /// An option that takes a value (e.g., --output file.txt)
    #[default]
    Value,
    /// A value option whose value may be glued to the name (e.g., -Ipath)
    Short,
    /// A positional argument
    Positional,
    /// A stop-parsing sentinel (e.g., --)
    Stop,
}

/// Type of the values an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeConfig {
    String,
    Integer,
    Float,
    File,
}

impl TypeConfig {
    fn as_str(self) -> &'static str {
        match self {
            TypeConfig::String => "string",
            TypeConfig::Integer => "integer",
            TypeConfig::Float => "float",
            TypeConfig::File => "file",
        }
    }
}

/// Allowed values; integers if every entry is a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChoicesConfig {
    Integers(Vec<i64>),
    Strings(Vec<String>),
}

/// Configuration for a single option.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionConfig {
    /// The name as written on the command line, e.g. `--output` or `-I`
    pub name: String,
    #[serde(default)]
    pub kind: OptionKindConfig,
    /// Value type; inferred from `choices` if omitted, else `string`
    #[serde(rename = "type")]
    pub value_type: Option<TypeConfig>,
    pub choices: Option<ChoicesConfig>,
    /// Defaults to true for positionals and false otherwise
    pub required: Option<bool>,
    #[serde(default)]
    pub overridable: bool,
    #[serde(default)]
    pub multiple: bool,
    /// Options whose state is captured alongside every value of this one
    #[serde(default)]
    pub references: Vec<String>,
    /// Help text for this option
    pub help: Option<String>,
}

impl OptionConfig {
    fn resolved_type(&self) -> Result<ValueType, ConfigError> {
        let mismatch =
            |ty: TypeConfig| ConfigError::ChoicesTypeMismatch(self.name.clone(), ty.as_str());

        Ok(match (&self.choices, self.value_type) {
            (None, None) | (None, Some(TypeConfig::String)) => ValueType::String,
            (None, Some(TypeConfig::Integer)) => ValueType::Integer,
            (None, Some(TypeConfig::Float)) => ValueType::Float,
            (None, Some(TypeConfig::File)) => ValueType::File,
            (Some(ChoicesConfig::Strings(values)), None | Some(TypeConfig::String)) => {
                ValueType::OneOf(Choices::Strings(values.clone()))
            }
            (Some(ChoicesConfig::Integers(values)), None | Some(TypeConfig::Integer)) => {
                ValueType::OneOf(Choices::Integers(values.clone()))
            }
            // An empty list deserializes as integers; let the schema report it.
            (Some(ChoicesConfig::Integers(values)), Some(TypeConfig::String))
                if values.is_empty() =>
            {
                ValueType::OneOf(Choices::Strings(Vec::new()))
            }
            (Some(_), Some(ty)) => return Err(mismatch(ty)),
        })
    }

    fn to_spec(&self) -> Result<OptionSpec, ConfigError> {
        let help = self.help.clone().unwrap_or_default();

        let mut spec = match self.kind {
            OptionKindConfig::Flag => OptionSpec::flag(&self.name, help),
            OptionKindConfig::Value => OptionSpec::value(&self.name, help, self.resolved_type()?),
            OptionKindConfig::Short => OptionSpec::short(&self.name, help, self.resolved_type()?),
            OptionKindConfig::Positional => {
                OptionSpec::positional(&self.name, help, self.resolved_type()?)
            }
            OptionKindConfig::Stop => OptionSpec::stop_parsing(&self.name),
        };

        match self.required {
            Some(true) => spec = spec.required(),
            Some(false) => spec = spec.optional(),
            None => {}
        }
        if self.overridable {
            spec = spec.overridable();
        }
        if self.multiple {
            spec = spec.multiple();
        }
        if !self.references.is_empty() {
            spec = spec.references(self.references.iter().cloned());
        }
        Ok(spec)
    }
}

/// Top-level schema description.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Program name, used as element 0 of the parsed arguments
    pub name: Option<String>,
    /// Description printed above the generated help
    pub description: Option<String>,
    /// Output variable prefix (default: "CLOPTS_")
    pub prefix: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
    /// Add the built-in `--help` option
    #[serde(default)]
    pub help: bool,
}

impl SchemaConfig {
    /// Parse a JSON string into a SchemaConfig.
    pub fn from_json(json: &str) -> Result<SchemaConfig, ConfigError> {
        let config: SchemaConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// The program name, falling back to `fallback`.
    pub fn program<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// Get the effective prefix, using the default if none is set.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    /// Build a validated schema; the help option, if enabled, prints and exits.
    pub fn to_schema(&self) -> Result<Schema, ConfigError> {
        self.build(OptionSpec::help)
    }

    /// Build a validated schema whose help option calls `handler`.
    pub fn to_schema_with_help(&self, handler: HelpHandler) -> Result<Schema, ConfigError> {
        self.build(move || OptionSpec::help_with(handler))
    }

    fn build(&self, help: impl FnOnce() -> OptionSpec) -> Result<Schema, ConfigError> {
        let specs = self
            .options
            .iter()
            .map(OptionConfig::to_spec)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Schema::builder().options(specs);
        if self.help {
            builder = builder.option(help());
        }
        Ok(builder.build()?)
    }
}
