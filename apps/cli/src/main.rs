//! thyme - render XHTML templates from the command line
//!
//! Usage:
//!   thyme render page.xhtml --data scope.json --docroot templates [--expect expected.xhtml]

mod config;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use thyme_markup::Document;
use thyme_template::{FileLoader, Scope, SimpleRequest, TemplateProcessor, Value};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "thyme", version)]
#[command(about = "Process XHTML templates with the thyme tag processor")]
struct Cli {
    /// Configuration file (defaults to ./thyme.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a template and print the resulting document
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Template name relative to the docroot, or `file :: fragment`
    template: String,

    /// JSON object whose members become scope variables
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory templates are loaded from
    #[arg(long)]
    docroot: Option<PathBuf>,

    /// Namespace URI of the directive attributes
    #[arg(long)]
    namespace: Option<String>,

    /// Prefix for `@{/...}` links
    #[arg(long)]
    context_name: Option<String>,

    /// Accept-Language of the simulated request, e.g. "nl, en;q=0.5"
    #[arg(long)]
    accept_language: Option<String>,

    /// Compare the output structurally with this document and fail on a mismatch
    #[arg(long)]
    expect: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl RenderArgs {
    /// Flags win over configured values
    fn apply(&self, config: &mut CliConfig) {
        if let Some(docroot) = &self.docroot {
            config.docroot = docroot.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.processor.namespace = namespace.clone();
        }
        if let Some(context_name) = &self.context_name {
            config.context_name = context_name.clone();
        }
        if let Some(accept_language) = &self.accept_language {
            config.accept_language = Some(accept_language.clone());
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => {
            args.apply(&mut config);
            logging::init_logging(&config.logging).context("Failed to initialize logging")?;
            render(&args, config)
        }
    }
}

fn load_data(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse data file {}", path.display()))?;

    match data {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("Data file {} must hold a JSON object", path.display()),
    }
}

fn render(args: &RenderArgs, config: CliConfig) -> Result<()> {
    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => serde_json::Map::new(),
    };

    let mut request = SimpleRequest::new(format!("/{}", args.template))
        .with_context_name(config.context_name.as_str());
    if let Some(accept_language) = &config.accept_language {
        request = request.with_header("Accept-Language", accept_language.as_str());
    }

    let mut scope = Scope::with_request(&request);
    for (name, value) in data {
        scope.put(name, Value::from(value));
    }

    let loader = FileLoader::new(&config.docroot).with_context(|| {
        format!("Failed to open docroot {}", config.docroot.display())
    })?;
    let processor = TemplateProcessor::new(Box::new(loader), config.processor);

    tracing::info!(
        template = %args.template,
        docroot = %config.docroot.display(),
        "Rendering template"
    );

    let output = processor
        .render(&args.template, &scope)
        .with_context(|| format!("Failed to render {}", args.template))?;

    println!("{output}");

    if let Some(expected_path) = &args.expect {
        let expected = fs::read_to_string(expected_path)
            .with_context(|| format!("Failed to read {}", expected_path.display()))?;
        let expected = Document::parse(&expected)
            .with_context(|| format!("Failed to parse {}", expected_path.display()))?;
        let actual = Document::parse(&output).context("Failed to parse rendered output")?;

        if !actual.equivalent(&expected) {
            bail!(
                "Rendered output differs from {}",
                expected_path.display()
            );
        }
        tracing::info!(expected = %expected_path.display(), "Output matches");
    }

    Ok(())
}
