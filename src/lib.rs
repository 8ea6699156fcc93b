//! clopts - declarative command-line option parsing.
//!
//! A [`Schema`] declares the options a program accepts: flags, typed value
//! options, positionals, callbacks and stop sentinels. Parsing an argument
//! vector against it yields a [`ParseResult`] with typed access to every
//! option, and every runtime error goes through a single [`ErrorPolicy`].
//!
//! ```
//! use clopts::{OptionSpec, Schema, ValueType};
//!
//! let schema = Schema::builder()
//!     .option(OptionSpec::flag("--verbose", "Print more"))
//!     .option(OptionSpec::value("--count", "How many", ValueType::Integer))
//!     .build()
//!     .unwrap();
//!
//! let result = schema.try_parse(["prog", "--count=3", "--verbose"]).unwrap();
//! assert_eq!(result.get_as::<i64>("--count").unwrap(), Some(3));
//! assert!(result.flag("--verbose").unwrap());
//! ```

pub mod config;
pub mod error;
pub mod help;
pub mod output;
pub mod parser;
pub mod reference;
pub mod result;
pub mod schema;
mod store;
pub mod value;

pub use config::{ConfigError, OptionConfig, SchemaConfig};
pub use error::{Disposition, ErrorContext, ErrorPolicy, ExitOnError, FailFast, ParseError};
pub use help::{render_help, render_usage};
pub use output::{render_error, render_help_output, render_json, render_shell, write_temp};
pub use parser::Parse;
pub use reference::{RefTuple, Snapshot};
pub use result::{FromValue, ParseResult, Slot};
pub use schema::{
    Arity, CallbackFn, HelpHandler, Lookup, OptionKey, OptionKind, OptionSpec, Schema,
    SchemaBuilder, SchemaError, DEFAULT_STOP_SENTINEL, HELP_OPTION,
};
pub use value::{coerce, Choices, FileData, FsLoader, ResourceLoader, Value, ValueType};
