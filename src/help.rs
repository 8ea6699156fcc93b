//! Help text generation from a schema.

use crate::schema::{Arity, OptionKind, OptionSpec, Schema};

/// Type label printed after an option's name, if it takes an argument.
fn type_label(spec: &OptionSpec) -> Option<String> {
    match spec.kind() {
        OptionKind::Value { .. } | OptionKind::Positional => {
            let base = spec.value_type().help_name();
            if spec.is_multiple() {
                Some(format!("{}s", base))
            } else {
                Some(base.to_string())
            }
        }
        OptionKind::Callback {
            arity: Arity::WithArg,
            ..
        } => Some("arg".to_string()),
        _ => None,
    }
}

/// `name : type` for options, `<name> : type` for positionals.
fn entry_label(spec: &OptionSpec) -> String {
    let mut label = if spec.is_positional() {
        format!("<{}>", spec.name())
    } else {
        spec.name().to_string()
    };
    if let Some(ty) = type_label(spec) {
        label.push_str(" : ");
        label.push_str(&ty);
    }
    label
}

fn sorted_by_name<'a>(specs: impl Iterator<Item = &'a OptionSpec>) -> Vec<&'a OptionSpec> {
    let mut specs: Vec<_> = specs.collect();
    specs.sort_by(|a, b| a.name().cmp(b.name()));
    specs
}

/// Render the help message for a schema.
///
/// The first line lists positionals in the order they must appear; the
/// sections below list every option sorted by name with its description
/// aligned in a single column.
pub fn render_help(schema: &Schema) -> String {
    let mut msg = String::new();

    let positionals: Vec<&OptionSpec> = schema.iter().filter(|s| s.is_positional()).collect();
    for spec in &positionals {
        if spec.is_required() {
            msg.push_str(&format!("<{}> ", spec.name()));
        } else {
            msg.push_str(&format!("[<{}>] ", spec.name()));
        }
    }
    msg.push_str("[options]\n");

    let listed: Vec<&OptionSpec> = schema.iter().filter(|s| !s.is_stop_parsing()).collect();
    let width = listed
        .iter()
        .map(|s| entry_label(s).len())
        .max()
        .unwrap_or(0);

    let append = |msg: &mut String, spec: &OptionSpec| {
        let label = entry_label(spec);
        msg.push_str("    ");
        msg.push_str(&label);
        msg.push_str(&" ".repeat(width - label.len()));
        msg.push_str("  ");
        msg.push_str(spec.description());
        msg.push('\n');
    };

    if !positionals.is_empty() {
        msg.push_str("\nArguments:\n");
        for spec in sorted_by_name(positionals.iter().copied()) {
            append(&mut msg, spec);
        }
        msg.push('\n');
    }

    msg.push_str("Options:\n");
    for spec in sorted_by_name(listed.iter().copied().filter(|s| !s.is_positional())) {
        append(&mut msg, spec);
    }

    let enumerated = sorted_by_name(
        schema
            .iter()
            .filter(|s| s.holds_value() && s.value_type().choices().is_some()),
    );
    if !enumerated.is_empty() {
        let name_width = enumerated.iter().map(|s| s.name().len()).max().unwrap_or(0);
        msg.push_str("\nSupported option values:\n");
        for spec in enumerated {
            if let Some(choices) = spec.value_type().choices() {
                msg.push_str("    ");
                msg.push_str(spec.name());
                msg.push(':');
                msg.push_str(&" ".repeat(name_width - spec.name().len() + 1));
                msg.push_str(&choices.display_list());
                msg.push('\n');
            }
        }
    }

    msg
}

/// `Usage: <program> <help>`, as printed when parsing fails.
pub fn render_usage(program: &str, schema: &Schema) -> String {
    if program.is_empty() {
        format!("Usage: {}", render_help(schema))
    } else {
        format!("Usage: {} {}", program, render_help(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Choices, ValueType};

    #[test]
    fn test_options_only() {
        let schema = Schema::builder()
            .option(OptionSpec::value("--number", "A number", ValueType::Integer))
            .option(OptionSpec::flag("--all", "Everything"))
            .build()
            .unwrap();
        let help = render_help(&schema);
        assert_eq!(
            help,
            "[options]\n\
             Options:\n    \
             --all              Everything\n    \
             --number : number  A number\n"
        );
    }

    #[test]
    fn test_positionals_in_usage_line_and_section() {
        let schema = Schema::builder()
            .option(OptionSpec::positional("second", "Second", ValueType::String))
            .option(OptionSpec::positional("first", "First", ValueType::Integer).optional())
            .build()
            .unwrap();
        let help = render_help(&schema);
        assert!(help.starts_with("<second> [<first>] [options]\n"));
        assert!(help.contains("\nArguments:\n    <first> : number   First\n    <second> : string  Second\n\n"));
        assert!(help.ends_with("Options:\n"));
    }

    #[test]
    fn test_multiple_type_is_plural() {
        let schema = Schema::builder()
            .option(OptionSpec::value("--int", "Integers", ValueType::Integer).multiple())
            .build()
            .unwrap();
        assert!(render_help(&schema).contains("--int : numbers  Integers"));
    }

    #[test]
    fn test_supported_values_section() {
        let schema = Schema::builder()
            .option(OptionSpec::value(
                "--prime",
                "A prime",
                ValueType::OneOf(Choices::integers([2, 3, 5])),
            ))
            .option(OptionSpec::value(
                "--fmt",
                "Format",
                ValueType::OneOf(Choices::strings(["json", "text"])),
            ))
            .build()
            .unwrap();
        let help = render_help(&schema);
        assert!(help.ends_with(
            "\nSupported option values:\n    --fmt:   json, text\n    --prime: 2, 3, 5\n"
        ));
    }

    #[test]
    fn test_help_and_callbacks_have_no_or_arg_type() {
        let schema = Schema::builder()
            .option(OptionSpec::help())
            .option(OptionSpec::callback_with_arg("--define", "Define", |_, _, _| {}))
            .option(OptionSpec::stop_parsing_default())
            .build()
            .unwrap();
        let help = render_help(&schema);
        assert!(help.contains("    --define : arg  Define\n"));
        assert!(help.contains("    --help          Print this help information\n"));
        assert!(!help.contains("Stop parsing"));
    }

    #[test]
    fn test_usage_prefix() {
        let schema = Schema::builder().build().unwrap();
        assert_eq!(render_usage("prog", &schema), "Usage: prog [options]\nOptions:\n");
    }
}
