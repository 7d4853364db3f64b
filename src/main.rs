//! Fragment Composer CLI
//!
//! Usage:
//!   fragment-composer [OPTIONS] <TEMPLATE>
//!
//! Options:
//!   -d, --dir <DIR>          Template directory (default: config or ".")
//!   -c, --config <FILE>      Engine configuration (TOML format)
//!   -p, --param <KEY=VALUE>  Render parameter, repeatable
//!   --params <FILE>          Render parameters (TOML format)
//!   --max-depth <N>          Maximum rebase/include nesting
//!   --no-escape              Disable HTML escaping of substitutions
//!   -h, --help               Print help

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fragment_composer::{EngineConfig, ParamTable, Renderer, TemplateError, Value};

#[derive(Parser)]
#[command(name = "fragment-composer")]
#[command(about = "Render a template fragment composed into its layouts")]
struct Cli {
    /// Identifier of the template to render, e.g. `root` or `pages/root`
    template: String,

    /// Template directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render parameter as KEY=VALUE; true/false and numbers are typed
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Render parameters file (TOML format)
    #[arg(long = "params", value_name = "FILE")]
    params_file: Option<PathBuf>,

    /// Maximum rebase chain length and include nesting
    #[arg(long)]
    max_depth: Option<usize>,

    /// Disable HTML escaping of substitutions
    #[arg(long)]
    no_escape: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(depth) = cli.max_depth {
        config = config.with_max_depth(depth);
    }
    if cli.no_escape {
        config = config.with_escape_html(false);
    }
    if let Some(dir) = &cli.dir {
        config = config.with_template_dir(dir);
    }

    let dir = config
        .template_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    // Collect parameters: file first, then command line
    let mut params = match &cli.params_file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => match ParamTable::from_toml_str(&content) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error parsing params '{}': {}", path.display(), e);
                    process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error reading params '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ParamTable::new(),
    };
    for raw in &cli.params {
        match parse_param(raw) {
            Some((key, value)) => {
                params.insert(key, value);
            }
            None => {
                eprintln!("Error: parameter '{}' is not of the form KEY=VALUE", raw);
                process::exit(1);
            }
        }
    }

    let renderer = Renderer::new(config);
    if let Err(e) = renderer.load_dir(&dir) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match renderer.render(&cli.template, &params) {
        Ok(document) => {
            print!("{}", document);
        }
        Err(TemplateError::Malformed { template, errors }) => {
            let source = renderer
                .store()
                .source(&template)
                .map(|s| s.to_string())
                .unwrap_or_default();
            for error in &errors {
                eprint!("{}", error.format(&source, &template));
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Split `KEY=VALUE`, typing booleans and numbers
fn parse_param(raw: &str) -> Option<(String, Value)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => match other.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Str(other.to_string()),
        },
    };
    Some((key.to_string(), value))
}
