//! cellcalc CLI - evaluate and check spreadsheet formulas

use anyhow::{bail, Context, Result};
use cellcalc::prelude::*;
use cellcalc::{FunctionCategory, FunctionRegistry};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellcalc")]
#[command(author, version, about = "Spreadsheet formula evaluation and validation tool")]
struct Cli {
    /// Service configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum nesting of function calls during evaluation
    #[arg(long, global = true)]
    max_call_depth: Option<usize>,

    /// Maximum nesting of expressions during evaluation
    #[arg(long, global = true)]
    max_expression_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula, optionally against tabular data
    Eval {
        /// Formula text, starting with '='
        formula: String,

        /// JSON file with {"headers": [...], "rows": [[...]]} or an array of rows
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Column headers, overriding those in the data file
        #[arg(long, value_delimiter = ',')]
        headers: Option<Vec<String>>,
    },

    /// Check that a formula parses and evaluates on the sample grid
    Check {
        /// Formula text, starting with '='
        formula: String,
    },

    /// Print the tool catalog
    Tools {
        /// Print a single tool
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Call a tool with a JSON input object
    Call {
        /// Tool name, e.g. evaluate_formula or VLOOKUP
        tool: String,

        /// Input object as JSON text
        #[arg(default_value = "{}")]
        input: String,
    },

    /// List the built-in functions
    Functions {
        /// Only functions of this category (e.g. lookup, math)
        #[arg(short, long)]
        category: Option<String>,
    },
}

/// Tabular input data
#[derive(Deserialize)]
#[serde(untagged)]
enum DataFile {
    Rows(Vec<Vec<CellValue>>),
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<CellValue>>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let validator = Validator::new(load_config(&cli)?);

    match cli.command {
        Commands::Eval {
            formula,
            data,
            headers,
        } => eval(&validator, &formula, data.as_deref(), headers),
        Commands::Check { formula } => check(&validator, &formula),
        Commands::Tools { name } => list_tools(validator, name.as_deref()),
        Commands::Call { tool, input } => call_tool(validator, &tool, &input),
        Commands::Functions { category } => list_functions(category.as_deref()),
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_path(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => ServiceConfig::default(),
    };

    let limits = &mut config.calculation.evaluation;
    if let Some(depth) = cli.max_call_depth {
        limits.max_call_depth = depth;
    }
    if let Some(depth) = cli.max_expression_depth {
        limits.max_expression_depth = depth;
    }
    Ok(config)
}

fn eval(
    validator: &Validator,
    formula: &str,
    data: Option<&Path>,
    headers: Option<Vec<String>>,
) -> Result<ExitCode> {
    let (file_headers, rows) = match data {
        Some(path) => read_data(path)?,
        None => (Vec::new(), Vec::new()),
    };
    let headers = headers.unwrap_or(file_headers);

    let outcome = validator.evaluate_with_sample(formula, &headers, &rows);
    print_json(&outcome)?;
    Ok(if outcome.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_data(path: &Path) -> Result<(Vec<String>, Vec<Vec<CellValue>>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let data: DataFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid data file '{}'", path.display()))?;
    Ok(match data {
        DataFile::Table { headers, rows } => (headers, rows),
        DataFile::Rows(rows) => (Vec::new(), rows),
    })
}

fn check(validator: &Validator, formula: &str) -> Result<ExitCode> {
    let check = validator.validate_syntax(formula);
    print_json(&check)?;
    Ok(if check.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_tools(validator: Validator, name: Option<&str>) -> Result<ExitCode> {
    let catalog = ToolCatalog::with_validator(validator);
    match name {
        Some(name) => {
            let tool = catalog
                .get(name)
                .with_context(|| format!("No tool named '{}'", name))?;
            print_json(tool)?;
        }
        None => print_json(catalog.tools())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn call_tool(validator: Validator, tool: &str, input: &str) -> Result<ExitCode> {
    let input: serde_json::Value =
        serde_json::from_str(input).context("Tool input is not valid JSON")?;
    let catalog = ToolCatalog::with_validator(validator);
    let output = catalog
        .call(tool, &input)
        .with_context(|| format!("Tool '{}' failed", tool))?;
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

fn list_functions(category: Option<&str>) -> Result<ExitCode> {
    let category = match category {
        Some(name) => match FunctionCategory::parse(name) {
            Some(category) => Some(category),
            None => bail!(
                "Unknown category '{}' (expected one of: {})",
                name,
                FunctionCategory::ALL
                    .iter()
                    .map(FunctionCategory::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for def in FunctionRegistry::global()
        .iter()
        .filter(|def| category.map_or(true, |c| def.category == c))
    {
        writeln!(out, "{:<16} {:<12} {}", def.name, def.category.as_str(), def.description)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to write output")?;
    writeln!(out)?;
    Ok(())
}
