//! Output formatting for CLI commands
//!
//! JSON and YAML render the full IR; the table format prints a short summary
//! of what the pass produced.

use crate::ir::CompiledIr;
use anyhow::{Context, Result};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// Print any serializable value as JSON or YAML
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Yaml => print_yaml(data),
        OutputFormat::Table => {
            anyhow::bail!("Table format requires custom implementation per data type")
        }
    }
}

/// Print a compile result in the requested format
pub fn print_compiled(ir: &CompiledIr, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print!("{}", render_summary(ir));
            Ok(())
        }
        other => print_output(ir, other),
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Plain-text summary of a compile pass
pub fn render_summary(ir: &CompiledIr) -> String {
    let mut out = String::new();

    match &ir.ambassador {
        Some(descriptor) => {
            out.push_str(&format!(
                "service_port: {}  admin_port: {}  diag_port: {}\n",
                descriptor.service_port, descriptor.admin_port, descriptor.diag_port
            ));
            out.push_str(&format!("label domain: {}\n", descriptor.default_label_domain()));
        }
        None => out.push_str("gateway descriptor: FAILED\n"),
    }

    out.push_str(&format!("\n{:<40} {:<30} {}\n", "MAPPING", "PREFIX", "SERVICE"));
    out.push_str(&format!("{}\n", "-".repeat(90)));
    for mapping in ir.graph.mappings() {
        out.push_str(&format!(
            "{:<40} {:<30} {}\n",
            mapping.name.as_str(),
            mapping.prefix,
            mapping.service
        ));
    }

    for notice in ir.diagnostics.notices() {
        out.push_str(&format!("notice: {}: {}\n", notice.resource, notice.message));
    }
    for error in ir.diagnostics.errors() {
        out.push_str(&format!("error: {}: {}\n", error.resource, error.message));
    }

    out
}
