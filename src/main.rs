//! clopts - declarative option parsing for shell scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clopts::{
    render_error, render_help_output, render_json, render_shell, render_usage, write_temp,
    FailFast, SchemaConfig,
};
use std::sync::{Arc, OnceLock};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Declarative option parsing for shell scripts.
#[derive(Parser, Debug)]
#[command(name = "clopts", version, about, disable_help_subcommand = true)]
struct Cli {
    /// Log filter, e.g. `debug` or `clopts=trace`
    #[arg(long, global = true, env = "CLOPTS_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Output written for a successful parse.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Format {
    /// Shell assignments, meant to be sourced
    #[default]
    Shell,
    /// A JSON document
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse script arguments and print the path of the generated output
    Parse {
        /// JSON schema for the target script
        #[arg(long)]
        schema: String,

        /// Variable prefix (overrides the schema)
        #[arg(long)]
        prefix: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Shell)]
        format: Format,

        /// Arguments to parse for the target script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print help text for the target script
    Help {
        /// JSON schema for the target script
        #[arg(long)]
        schema: String,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Parse `args` against the schema and render what the script should source.
fn render_outcome(
    schema_json: &str,
    prefix: Option<&str>,
    format: Format,
    args: Vec<String>,
) -> Result<String> {
    let cfg = SchemaConfig::from_json(schema_json).context("failed to parse schema JSON")?;

    // The help option only records what it would print; the script decides.
    // Repeated `--help` tokens render the same text, so the first one is kept.
    let help_text = Arc::new(OnceLock::new());
    let sink = Arc::clone(&help_text);
    let schema = cfg
        .to_schema_with_help(Arc::new(move |program: &str, help: &str| {
            sink.get_or_init(|| format!("Usage: {} {}", program, help));
        }))
        .context("invalid schema")?;

    let program = cfg.program("script").to_string();
    let prefix = prefix.unwrap_or_else(|| cfg.effective_prefix());
    let argv = std::iter::once(program.clone()).chain(args);

    let outcome = schema.parse(argv).policy(FailFast).run();
    // A requested help wins over errors found after it.
    let content = match (help_text.get(), outcome) {
        (Some(help), _) => render_help_output(help),
        (None, Err(error)) => {
            debug!(%error, "parse failed");
            render_error(&program, &error.to_string())
        }
        (None, Ok(result)) => match format {
            Format::Shell => render_shell(&result, prefix),
            Format::Json => render_json(&result).context("failed to render JSON output")?,
        },
    };
    Ok(content)
}

fn parse(schema_json: &str, prefix: Option<&str>, format: Format, args: Vec<String>) -> Result<()> {
    let content = render_outcome(schema_json, prefix, format, args)?;
    let path = write_temp(&content).context("failed to generate output file")?;
    println!("{}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Parse {
            schema,
            prefix,
            format,
            args,
        } => parse(&schema, prefix.as_deref(), format, args)?,
        Commands::Help { schema } => {
            let cfg = SchemaConfig::from_json(&schema).context("failed to parse schema JSON")?;
            let built = cfg.to_schema().context("invalid schema")?;
            if let Some(description) = &cfg.description {
                println!("{}\n", description);
            }
            print!("{}", render_usage(cfg.program("script"), &built));
        }
    }

    Ok(())
}
