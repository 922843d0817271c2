use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use form_loader::{load_schemas, LoaderOptions, SchemaSet};
use form_reflect::{BinderConfig, FormBinder, ParamMap};
use form_types::MessageSchema;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "form")]
#[command(about = "Form binding toolchain - schema inspection and query parameter binding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/* Arguments shared by every command that loads schemas */
#[derive(clap::Args)]
struct SchemaArgs {
    /// Schema file to load (YAML, or JSON by extension)
    #[arg(short = 'f', long = "file", value_name = "FILE", required = true)]
    file: PathBuf,

    /// Include directories for resolving imports
    #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Extra message names bound as dynamic values
    #[arg(long = "dynamic-type", value_name = "MESSAGE")]
    dynamic_types: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the messages of a schema file and its imports
    Messages {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Also list messages that opt out of form binding
        #[arg(short = 'a', long = "all")]
        all: bool,
    },

    /// Print the dotted query paths of a message
    Paths {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Message to flatten (full or unique simple name)
        #[arg(short = 'm', long = "message", required = true)]
        message: String,

        /// Print the path table as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Bind query parameters into a message and print the record as JSON
    Bind {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Message to bind into (full or unique simple name)
        #[arg(short = 'm', long = "message", required = true)]
        message: String,

        /// Query parameter as key=value; repeat a key for several values
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// JSON object of parameters, merged before --param values
        #[arg(long = "params-file", value_name = "FILE")]
        params_file: Option<PathBuf>,

        /// Prefix prepended to every key before path lookup
        #[arg(long = "prefix", default_value = "")]
        prefix: String,

        /// Log keys that match no path
        #[arg(long = "trace-ignored")]
        trace_ignored: bool,

        /// Pretty print JSON output
        #[arg(long = "pretty")]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Messages { schema, all } => run_messages(&schema, all)?,

        Commands::Paths {
            schema,
            message,
            json,
        } => run_paths(&schema, &message, json)?,

        Commands::Bind {
            schema,
            message,
            params,
            params_file,
            prefix,
            trace_ignored,
            pretty,
        } => {
            let mut param_map = match params_file {
                Some(path) => load_params_file(&path)?,
                None => ParamMap::new(),
            };
            for param in &params {
                let (key, value) = parse_param(param)?;
                param_map.append(key, value);
            }
            let config = BinderConfig {
                key_prefix: prefix,
                trace_ignored_keys: trace_ignored,
            };
            run_bind(&schema, &message, &param_map, config, pretty)?;
        }
    }

    Ok(())
}

fn load(args: &SchemaArgs) -> anyhow::Result<SchemaSet> {
    let mut options = LoaderOptions::with_include_dirs(args.include_dirs.clone());
    options
        .dynamic_value_types
        .extend(args.dynamic_types.iter().cloned());

    let set = load_schemas(&args.file, &options)
        .with_context(|| format!("Failed to load schemas from {}", args.file.display()))?;
    debug!(messages = set.len(), "schemas loaded");
    Ok(set)
}

/* Resolve a message and refuse ones that opt out of binding */
fn bindable_message(set: &SchemaSet, name: &str) -> anyhow::Result<Arc<MessageSchema>> {
    let schema = set.message(name)?;
    if schema.skip_form {
        bail!("Message '{}' is excluded from form binding", schema.name);
    }
    Ok(schema)
}

fn run_messages(args: &SchemaArgs, all: bool) -> anyhow::Result<()> {
    let set = load(args)?;
    if all {
        for name in set.message_names() {
            println!("{name}");
        }
    } else {
        for schema in set.bindable_messages() {
            println!("{}", schema.name);
        }
    }
    Ok(())
}

fn run_paths(args: &SchemaArgs, message: &str, json: bool) -> anyhow::Result<()> {
    let set = load(args)?;
    let schema = bindable_message(&set, message)?;
    let table = FormBinder::new().paths(&schema);

    if json {
        let summaries: Vec<_> = table.paths().iter().map(|path| path.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for path in table.paths() {
        let field = &path.terminal_field;
        let mut flags = Vec::new();
        if field.repeated {
            flags.push("repeated");
        }
        if field.optional {
            flags.push("optional");
        }
        if flags.is_empty() {
            println!("{}\t{}", path.dotted_name, field.kind);
        } else {
            println!("{}\t{}\t{}", path.dotted_name, field.kind, flags.join(","));
        }
    }
    Ok(())
}

fn run_bind(
    args: &SchemaArgs,
    message: &str,
    params: &ParamMap,
    config: BinderConfig,
    pretty: bool,
) -> anyhow::Result<()> {
    let set = load(args)?;
    let schema = bindable_message(&set, message)?;

    let binder = FormBinder::with_config(config);
    let record = binder
        .bind(&schema, params)
        .with_context(|| format!("Failed to bind parameters into '{}'", schema.name))?;

    let output = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{output}");
    Ok(())
}

/* Split a `key=value` argument; the value may itself contain '=' */
fn parse_param(param: &str) -> anyhow::Result<(&str, &str)> {
    match param.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("Invalid parameter '{param}': expected KEY=VALUE"),
    }
}

/// Read parameters from a JSON object file.
///
/// Array values supply several values for one key. Non-string scalars are
/// passed as their JSON text, and `null` supplies no value.
fn load_params_file(path: &Path) -> anyhow::Result<ParamMap> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))?;
    let value: JsonValue = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse params file {}", path.display()))?;
    let JsonValue::Object(object) = value else {
        bail!("Params file {} must contain a JSON object", path.display());
    };

    let mut params = ParamMap::new();
    for (key, value) in object {
        let values: Vec<String> = match value {
            JsonValue::Array(items) => items.iter().filter_map(param_text).collect(),
            other => param_text(&other).into_iter().collect(),
        };
        params.insert(key, values);
    }
    Ok(params)
}

fn param_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
