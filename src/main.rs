//! PrismDB Window - Command line entry point
//!
//! Reads a CSV file, evaluates ranking window functions over it and prints
//! the result as a table or as JSON lines.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::info;

use prism_window::{
    evaluate_window_functions, CsvReader, ExecutionContext, RowSource, WindowConfig,
    WindowExpression, WindowFunctionType,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "prism-window")]
#[command(about = "Evaluate ranking window functions over a CSV file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Input CSV file with a header row
    input: String,

    /// Window function to evaluate (row_number, rank, dense_rank, percent_rank, cume_dist)
    #[arg(short, long = "function", required = true)]
    functions: Vec<String>,

    /// Partition key columns, comma separated
    #[arg(short, long, value_delimiter = ',')]
    partition_by: Vec<String>,

    /// Order key columns, comma separated
    #[arg(short, long, value_delimiter = ',')]
    order_by: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override a setting, as key=value (repeatable)
    #[arg(long = "set")]
    settings: Vec<String>,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Print execution statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn load_config(cli: &Cli) -> anyhow::Result<WindowConfig> {
    let mut config = match &cli.config {
        Some(path) => WindowConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => WindowConfig::default(),
    };
    for setting in &cli.settings {
        let Some((key, value)) = setting.split_once('=') else {
            bail!("setting '{}' is not of the form key=value", setting);
        };
        config
            .set(key, value)
            .with_context(|| format!("invalid setting '{}'", setting))?;
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let context = ExecutionContext::new(config);

    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    let source = CsvReader::from_path(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input))?
        .with_delimiter(cli.delimiter as u8)
        .read()
        .with_context(|| format!("failed to read {}", cli.input))?;

    let expressions = cli
        .functions
        .iter()
        .map(|name| {
            let function_type: WindowFunctionType = name.parse()?;
            WindowExpression::bind(
                source.schema(),
                function_type,
                cli.partition_by.as_slice(),
                cli.order_by.as_slice(),
            )
        })
        .collect::<prism_window::Result<Vec<_>>>()?;

    info!(input = %cli.input, functions = expressions.len(), "evaluating window functions");
    let output = evaluate_window_functions(source, &expressions, &context)?;

    match cli.format {
        OutputFormat::Table => print!("{}", output.to_table_string()),
        OutputFormat::Json => print!("{}", output.to_json_lines()),
    }
    if cli.stats {
        eprintln!(
            "{} rows, {} partitions, {} ms",
            output.stats.rows_processed,
            output.stats.partitions_evaluated,
            output.stats.execution_time_ms
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    run(cli)
}
