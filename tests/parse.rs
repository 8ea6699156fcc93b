use clopts::{
    Choices, Disposition, FileData, OptionSpec, ParseError, Schema, Slot, Snapshot, Value,
    ValueType,
};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

fn basic() -> Schema {
    Schema::builder()
        .option(OptionSpec::value("--string", "A string", ValueType::String))
        .option(OptionSpec::value("--number", "A number", ValueType::Integer))
        .option(OptionSpec::value("--float", "A float", ValueType::Float))
        .option(OptionSpec::flag("--flag", "A flag"))
        .option(OptionSpec::value("--many", "Many", ValueType::String).multiple())
        .build()
        .unwrap()
}

#[test]
fn test_empty_argument_vector_leaves_everything_absent() {
    let schema = basic();
    let result = schema.try_parse(["prog"]).unwrap();

    assert_eq!(result.get("--string").unwrap(), Slot::Value(None));
    assert_eq!(result.get("--number").unwrap(), Slot::Value(None));
    assert_eq!(result.get("--float").unwrap(), Slot::Value(None));
    assert_eq!(result.get("--flag").unwrap(), Slot::Flag(false));
    assert_eq!(result.get("--many").unwrap(), Slot::Values(&[]));
    assert!(result.unprocessed().is_empty());
}

#[test]
fn test_string_number_and_float() {
    let schema = basic();
    let result = schema
        .try_parse([
            "prog",
            "--string",
            "Hello, world!",
            "--number",
            "42",
            "--float",
            "3.14",
        ])
        .unwrap();

    assert_eq!(
        result.get_as::<String>("--string").unwrap().as_deref(),
        Some("Hello, world!")
    );
    assert_eq!(result.get_as::<i64>("--number").unwrap(), Some(42));
    let float = result.get_as::<f64>("--float").unwrap().unwrap();
    assert!((float - 3.14).abs() < 1e-9);
}

#[test]
fn test_enumerated_value_outside_set() {
    let schema = Schema::builder()
        .option(OptionSpec::value(
            "--values",
            "A value",
            ValueType::OneOf(Choices::integers([0, 1, 2, 3])),
        ))
        .build()
        .unwrap();

    let mut messages = Vec::new();
    let result = schema
        .parse(["prog", "--values", "4"])
        .policy(|error: &ParseError| {
            messages.push(error.to_string());
            Disposition::Abort
        })
        .run();

    assert!(matches!(result, Err(ParseError::InvalidValue { .. })));
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("'--values'"));
    assert!(messages[0].contains("'4'"));

    let err = schema.try_parse(["prog", "--values", "four"]).unwrap_err();
    assert!(matches!(err, ParseError::InvalidNumber { .. }));
}

#[test]
fn test_multiple_integers_in_occurrence_order() {
    let schema = Schema::builder()
        .option(OptionSpec::value("--int", "Integers", ValueType::Integer).multiple())
        .build()
        .unwrap();
    let result = schema.try_parse(["prog", "--int", "1", "--int", "2"]).unwrap();
    assert_eq!(result.get_all::<i64>("--int").unwrap(), vec![1, 2]);
    assert_eq!(
        result.values("--int").unwrap(),
        &[Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_stop_sentinel_leaves_tail_unprocessed() {
    let schema = Schema::builder()
        .option(OptionSpec::flag("--bar", "A flag"))
        .option(OptionSpec::stop_parsing_default())
        .build()
        .unwrap();
    let result = schema.try_parse(["prog", "--", "--bar"]).unwrap();
    assert!(!result.flag("--bar").unwrap());
    assert_eq!(result.unprocessed(), &["--bar".to_string()]);
}

#[test]
fn test_required_option_missing_for_every_subset() {
    let optional: [(&str, &[&str]); 4] = [
        ("--string", &["--string", "s"]),
        ("--number", &["--number", "1"]),
        ("--flag", &["--flag"]),
        ("--many", &["--many", "a", "--many", "b"]),
    ];
    let schema = Schema::builder()
        .options(vec![
            OptionSpec::value("--string", "", ValueType::String),
            OptionSpec::value("--number", "", ValueType::Integer),
            OptionSpec::flag("--flag", ""),
            OptionSpec::value("--many", "", ValueType::String).multiple(),
            OptionSpec::value("--needed", "", ValueType::String).required(),
        ])
        .build()
        .unwrap();

    for mask in 0..(1u32 << optional.len()) {
        let mut args = vec!["prog"];
        for (bit, (_, tokens)) in optional.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                args.extend_from_slice(tokens);
            }
        }
        let err = schema.try_parse(args.clone()).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingRequiredOption("--needed".to_string()),
            "args: {:?}",
            args
        );
    }
}

#[test]
fn test_independent_parses_are_equal() {
    let schema = basic();
    let args = [
        "prog", "--string", "x", "--many", "a", "--flag", "--many", "b", "--number=7",
    ];
    let first = schema.try_parse(args).unwrap();
    let second = schema.try_parse(args).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_parses_share_schema() {
    let schema = Arc::new(basic());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let n = i.to_string();
                let result = schema.try_parse(["prog", "--number", n.as_str()]).unwrap();
                result.get_as::<i64>("--number").unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(i as i64));
    }
}

#[test]
fn test_overridable_takes_last_occurrence() {
    let schema = Schema::builder()
        .option(OptionSpec::value("--level", "", ValueType::Integer).overridable())
        .build()
        .unwrap();

    for count in 1..=5i64 {
        let mut args = vec!["prog".to_string()];
        for n in 1..=count {
            args.push(format!("--level={}", n * 10));
        }
        let result = schema.try_parse(args).unwrap();
        assert_eq!(result.get_as::<i64>("--level").unwrap(), Some(count * 10));
    }
}

#[test]
fn test_reference_snapshots_are_not_retroactive() {
    let schema = Schema::builder()
        .option(OptionSpec::value("--tag", "", ValueType::String).multiple())
        .option(OptionSpec::flag("--debug", ""))
        .option(
            OptionSpec::value("--file", "", ValueType::String)
                .multiple()
                .references(["--tag", "--debug"]),
        )
        .build()
        .unwrap();

    let result = schema
        .try_parse([
            "prog", "--tag", "a", "--file", "one", "--tag", "b", "--debug", "--file", "two",
            "--tag", "c",
        ])
        .unwrap();

    let files = result.get_all::<clopts::RefTuple>("--file").unwrap();
    assert_eq!(files.len(), 2);

    assert_eq!(files[0].value(), &Value::from("one"));
    assert_eq!(
        files[0].snapshot("--tag"),
        Some(&Snapshot::Values(vec![Value::from("a")]))
    );
    assert_eq!(files[0].snapshot("--debug"), Some(&Snapshot::Found(false)));

    assert_eq!(files[1].value(), &Value::from("two"));
    assert_eq!(
        files[1].snapshot("--tag"),
        Some(&Snapshot::Values(vec![Value::from("a"), Value::from("b")]))
    );
    assert_eq!(files[1].snapshot("--debug"), Some(&Snapshot::Found(true)));

    assert_eq!(result.get_all::<String>("--tag").unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_file_option_reads_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "file contents").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let schema = Schema::builder()
        .option(OptionSpec::value("--input", "Input", ValueType::File))
        .build()
        .unwrap();

    let result = schema.try_parse(["prog", "--input", path.as_str()]).unwrap();
    let data = result.get_as::<FileData>("--input").unwrap().unwrap();
    assert_eq!(data.contents, b"file contents");
    assert_eq!(data.path.to_str(), Some(path.as_str()));
}

#[test]
fn test_missing_file_is_resource_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let missing = missing.to_str().unwrap();

    let schema = Schema::builder()
        .option(OptionSpec::value("--input", "Input", ValueType::File))
        .build()
        .unwrap();

    let err = schema.try_parse(["prog", "--input", missing]).unwrap_err();
    match err {
        ParseError::ResourceUnavailable { option, path, .. } => {
            assert_eq!(option, "--input");
            assert_eq!(path, missing);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_continue_policy_reports_everything() {
    let schema = Schema::builder()
        .option(OptionSpec::value("--number", "", ValueType::Integer))
        .option(OptionSpec::value("--needed", "", ValueType::String).required())
        .build()
        .unwrap();

    let mut errors = Vec::new();
    let result = schema
        .parse(["prog", "--number", "x", "--bogus"])
        .policy(|error: &ParseError| {
            errors.push(error.clone());
            Disposition::Continue
        })
        .run()
        .unwrap();

    assert!(!result.is_found("--number").unwrap());
    assert_eq!(result.value("--number").unwrap(), None);
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], ParseError::InvalidNumber { .. }));
    assert_eq!(errors[1], ParseError::UnrecognizedOption("--bogus".to_string()));
    assert_eq!(
        errors[2],
        ParseError::MissingRequiredOption("--needed".to_string())
    );
}

#[test]
fn test_unknown_name_is_detected_before_input() {
    let schema = basic();
    assert!(schema.key("--nope").is_err());
    let key = schema.key("--number").unwrap();

    let result = schema.try_parse(["prog", "--number", "5"]).unwrap();
    assert_eq!(result.get_as::<i64>(&key).unwrap(), Some(5));
    assert!(result.get("--nope").is_err());
}
