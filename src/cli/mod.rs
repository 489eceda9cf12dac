//! # Command Line Interface
//!
//! `gateway-ir compile` runs one compile pass over a YAML resource file and
//! prints the resulting IR; `gateway-ir config` prints the effective settings.

pub mod output;

use crate::config::CompilerConfig;
use crate::domain::ResourceSet;
use crate::ir::compile;
use crate::observability::{init_logging, log_config_info};
use anyhow::Context;
use clap::{Parser, Subcommand};
use output::OutputFormat;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gateway-ir")]
#[command(about = "Gateway IR compiler: resolve gateway configuration into IR")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Compiler settings file (YAML, TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a YAML resource file and print the IR
    Compile {
        /// Resource file to compile
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },

    /// Print the effective compiler settings
    Config {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CompilerConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    if cli.json_logs {
        config.observability.json_logging = true;
    }

    init_logging(&config.observability)?;
    log_config_info(&config);

    match cli.command {
        Commands::Compile { file, output } => handle_compile(&file, output, &config),
        Commands::Config { output } => output::print_output(&config, output),
    }
}

fn handle_compile(file: &Path, format: OutputFormat, config: &CompilerConfig) -> anyhow::Result<()> {
    let yaml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let source = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let resources = ResourceSet::from_yaml_str(&source, &yaml)?;
    let ir = compile(&resources, &config.ir)?;

    output::print_compiled(&ir, format)?;

    if ir.has_errors() {
        anyhow::bail!("{} resource(s) failed to compile", ir.diagnostics.errors().len());
    }

    Ok(())
}
