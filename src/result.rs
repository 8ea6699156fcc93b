//! Read-only view over a finished parse.

use crate::reference::RefTuple;
use crate::schema::{Lookup, OptionSpec, Schema, SchemaError};
use crate::store::{Cell, Store};
use crate::value::{Choices, FileData, Value, ValueType};
use serde::Serialize;

/// What an option holds after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Slot<'r> {
    /// Flags, callbacks, help and sentinels: whether they were matched.
    Flag(bool),
    /// Single-valued options: the value, or `None` if absent.
    Value(Option<&'r Value>),
    /// Multiple options: every value in occurrence order, possibly empty.
    Values(&'r [Value]),
}

/// Conversion from a stored value into a concrete Rust type.
pub trait FromValue: Sized {
    /// Used in mismatch errors, e.g. "an integer".
    const EXPECTED: &'static str;

    /// Whether options declared like `spec` store values of this type.
    fn matches(spec: &OptionSpec) -> bool;

    fn from_value(value: &Value) -> Option<Self>;
}

fn plain(spec: &OptionSpec) -> bool {
    spec.reference_names().is_empty()
}

impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn matches(spec: &OptionSpec) -> bool {
        plain(spec)
            && matches!(
                spec.value_type(),
                ValueType::String | ValueType::OneOf(Choices::Strings(_))
            )
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn matches(spec: &OptionSpec) -> bool {
        plain(spec)
            && matches!(
                spec.value_type(),
                ValueType::Integer | ValueType::OneOf(Choices::Integers(_))
            )
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a floating-point number";

    fn matches(spec: &OptionSpec) -> bool {
        plain(spec) && matches!(spec.value_type(), ValueType::Float)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for FileData {
    const EXPECTED: &'static str = "a file";

    fn matches(spec: &OptionSpec) -> bool {
        plain(spec) && matches!(spec.value_type(), ValueType::File)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_file().cloned()
    }
}

impl FromValue for RefTuple {
    const EXPECTED: &'static str = "a reference tuple";

    fn matches(spec: &OptionSpec) -> bool {
        !plain(spec)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_tuple().cloned()
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "a value";

    fn matches(_spec: &OptionSpec) -> bool {
        true
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// The outcome of a successful parse. Never mutated after it is returned.
#[derive(Debug, Clone)]
pub struct ParseResult<'s> {
    schema: &'s Schema,
    program: String,
    store: Store,
    unprocessed: Vec<String>,
}

impl PartialEq for ParseResult<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.program == other.program
            && self.store == other.store
            && self.unprocessed == other.unprocessed
    }
}

impl<'s> ParseResult<'s> {
    pub(crate) fn new(
        schema: &'s Schema,
        program: String,
        store: Store,
        unprocessed: Vec<String>,
    ) -> Self {
        Self {
            schema,
            program,
            store,
            unprocessed,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Element 0 of the parsed argument vector.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get(&self, name: impl Lookup) -> Result<Slot<'_>, SchemaError> {
        let index = name.resolve(self.schema)?;
        Ok(self.slot(index))
    }

    fn slot(&self, index: usize) -> Slot<'_> {
        match self.store.cell(index) {
            Cell::Unit => Slot::Flag(self.store.is_found(index)),
            Cell::Single(value) => Slot::Value(value.as_ref()),
            Cell::Multiple(values) => Slot::Values(values),
        }
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> SchemaError {
        SchemaError::KindMismatch {
            option: self.schema.spec_at(index).name().to_string(),
            expected,
        }
    }

    /// Whether the option was matched at least once.
    pub fn is_found(&self, name: impl Lookup) -> Result<bool, SchemaError> {
        let index = name.resolve(self.schema)?;
        Ok(self.store.is_found(index))
    }

    /// The found-state of a flag (or callback, help or sentinel).
    pub fn flag(&self, name: impl Lookup) -> Result<bool, SchemaError> {
        let index = name.resolve(self.schema)?;
        match self.slot(index) {
            Slot::Flag(found) => Ok(found),
            _ => Err(self.mismatch(index, "a found-state")),
        }
    }

    /// The value of a single-valued option, `None` if it was absent.
    pub fn value(&self, name: impl Lookup) -> Result<Option<&Value>, SchemaError> {
        let index = name.resolve(self.schema)?;
        match self.slot(index) {
            Slot::Value(value) => Ok(value),
            _ => Err(self.mismatch(index, "a single value")),
        }
    }

    /// The accumulated values of a multiple option.
    pub fn values(&self, name: impl Lookup) -> Result<&[Value], SchemaError> {
        let index = name.resolve(self.schema)?;
        match self.slot(index) {
            Slot::Values(values) => Ok(values),
            _ => Err(self.mismatch(index, "a sequence of values")),
        }
    }

    /// The value of a single-valued option converted to `T`.
    ///
    /// Asking for a type the option is not declared with is an error even
    /// when the option is absent.
    pub fn get_as<T: FromValue>(&self, name: impl Lookup) -> Result<Option<T>, SchemaError> {
        let index = name.resolve(self.schema)?;
        if !T::matches(self.schema.spec_at(index)) {
            return Err(self.mismatch(index, T::EXPECTED));
        }
        match self.slot(index) {
            Slot::Value(value) => Ok(value.and_then(T::from_value)),
            _ => Err(self.mismatch(index, "a single value")),
        }
    }

    /// Like [`get_as`](Self::get_as), falling back to `default` when absent.
    pub fn get_or<T: FromValue>(&self, name: impl Lookup, default: T) -> Result<T, SchemaError> {
        Ok(self.get_as(name)?.unwrap_or(default))
    }

    /// Every value of a multiple option converted to `T`.
    pub fn get_all<T: FromValue>(&self, name: impl Lookup) -> Result<Vec<T>, SchemaError> {
        let index = name.resolve(self.schema)?;
        if !T::matches(self.schema.spec_at(index)) {
            return Err(self.mismatch(index, T::EXPECTED));
        }
        match self.slot(index) {
            Slot::Values(values) => Ok(values.iter().filter_map(T::from_value).collect()),
            _ => Err(self.mismatch(index, "a sequence of values")),
        }
    }

    /// Tokens after the stop sentinel, empty if none was reached.
    pub fn unprocessed(&self) -> &[String] {
        &self.unprocessed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OptionSpec;

    fn schema() -> Schema {
        Schema::builder()
            .option(OptionSpec::flag("--flag", ""))
            .option(OptionSpec::value("--num", "", ValueType::Integer))
            .option(OptionSpec::value("--name", "", ValueType::String))
            .option(OptionSpec::value("--tags", "", ValueType::String).multiple())
            .build()
            .unwrap()
    }

    fn result(schema: &Schema) -> ParseResult<'_> {
        let mut store = Store::for_schema(schema);
        store.mark_found(0);
        store.write(1, Value::Int(5));
        store.write(3, Value::from("a"));
        ParseResult::new(schema, "prog".to_string(), store, vec![])
    }

    #[test]
    fn test_get_slots() {
        let schema = schema();
        let result = result(&schema);
        assert_eq!(result.get("--flag").unwrap(), Slot::Flag(true));
        assert_eq!(result.get("--num").unwrap(), Slot::Value(Some(&Value::Int(5))));
        assert_eq!(result.get("--name").unwrap(), Slot::Value(None));
        assert_eq!(
            result.get("--tags").unwrap(),
            Slot::Values(&[Value::from("a")])
        );
    }

    #[test]
    fn test_unknown_name() {
        let schema = schema();
        let result = result(&schema);
        assert_eq!(
            result.get("--missing"),
            Err(SchemaError::UnknownOptionName("--missing".to_string()))
        );
    }

    #[test]
    fn test_typed_getters() {
        let schema = schema();
        let result = result(&schema);
        assert_eq!(result.get_as::<i64>("--num").unwrap(), Some(5));
        assert_eq!(result.get_or("--name", "anon".to_string()).unwrap(), "anon");
        assert_eq!(result.get_or("--num", 0i64).unwrap(), 5);
        assert_eq!(result.get_all::<String>("--tags").unwrap(), vec!["a"]);
        assert!(result.flag("--flag").unwrap());
    }

    #[test]
    fn test_type_mismatch_is_independent_of_input() {
        let schema = schema();
        let result = result(&schema);
        assert!(matches!(
            result.get_as::<String>("--num"),
            Err(SchemaError::KindMismatch { .. })
        ));
        // absent, but still the wrong type
        assert!(matches!(
            result.get_as::<i64>("--name"),
            Err(SchemaError::KindMismatch { .. })
        ));
        assert!(matches!(
            result.values("--num"),
            Err(SchemaError::KindMismatch { .. })
        ));
        assert!(matches!(
            result.flag("--tags"),
            Err(SchemaError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_lookup_by_key() {
        let schema = schema();
        let key = schema.key("--num").unwrap();
        let result = result(&schema);
        assert_eq!(result.value(&key).unwrap(), Some(&Value::Int(5)));
    }
}
