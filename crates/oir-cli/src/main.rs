use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oir_core::config::{self, CONFIG_FILE_NAME, OirConfig};
use oir_core::ir::CodeGenData;
use oir_core::parse::{self, spec::OpenApiSpec};
use oir_core::transform;

#[derive(Parser)]
#[command(name = "oir", about = "OpenAPI 3.x code-generation IR builder", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the IR built from an OpenAPI spec
    Inspect {
        /// Path to the OpenAPI spec file (YAML or JSON); defaults to the configured input
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,

        /// Print only models, operations and services instead of the full IR
        #[arg(long)]
        summary: bool,
    },

    /// Validate that an OpenAPI spec can be turned into IR
    Validate {
        /// Path to the OpenAPI spec file; defaults to the configured input
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Initialize a new oir configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            input,
            format,
            summary,
        } => cmd_inspect(input, format, summary),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oir", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OirConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn read_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

fn load_ir(input: Option<PathBuf>) -> Result<(OpenApiSpec, CodeGenData)> {
    let cfg = try_load_config()?.unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let spec = read_spec(&input)?;
    log::info!("building IR for {}", input.display());
    let ir = transform::build_code_gen_data_with_options(&spec, &cfg.codegen_options())
        .with_context(|| format!("failed to build IR for {}", input.display()))?;
    Ok((spec, ir))
}

fn cmd_validate(input: Option<PathBuf>) -> Result<()> {
    let (spec, ir) = load_ir(input)?;

    eprintln!("Valid OpenAPI {} spec: {}", spec.openapi, spec.info.title);
    eprintln!("  Version: {}", spec.info.version);
    eprintln!("  Paths: {}", spec.paths.len());

    if let Some(ref components) = spec.components {
        eprintln!("  Schemas: {}", components.schemas.len());
    }

    eprintln!("  Models: {}", ir.models.len());
    eprintln!("  Operations: {}", ir.all_operations.len());
    eprintln!("  Services: {}", ir.services.len());

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: Option<PathBuf>, format: InspectFormat, summary: bool) -> Result<()> {
    let (_, ir) = load_ir(input)?;

    let value = if summary {
        build_inspect_summary(&ir)
    } else {
        serde_json::to_value(&ir)?
    };

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&value)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&value)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(ir: &CodeGenData) -> serde_json::Value {
    let models: Vec<serde_json::Value> = ir
        .models
        .iter()
        .map(|id| {
            let model = ir.model(*id);
            serde_json::json!({
                "name": model.name,
                "export": model.kind,
                "mapped": model.mapped,
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = ir
        .all_operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "uniqueName": op.unique_name,
                "method": op.method.as_str(),
                "path": op.path,
                "result": op.result.map(|code| code.to_string()),
                "tags": op.tags,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": ir.info.title,
            "version": ir.info.version,
        },
        "models": models,
        "operations": operations,
        "services": ir.services.iter().map(|s| &s.name.original).collect::<Vec<_>>(),
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
