//! # energyboard-cli
//!
//! Command-line interface over the energyboard dataset registry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::ASCII_FULL, Attribute, Cell, CellAlignment, Table as Grid};
use energyboard_core::{
    AverageTable, DatasetRegistry, FuelMetrics, Grouping, Period, PipelineConfig, PublishedTable,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// energyboard - county utility usage and spending tables
#[derive(Parser)]
#[command(name = "energyboard")]
#[command(author, version, about = "Utility usage and spending tables from billing exports", long_about = None)]
struct Cli {
    /// YAML pipeline config
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the workbooks (overrides the config)
    #[arg(short = 'd', long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format (json, csv, table)
    #[arg(short = 'f', long = "format", default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one published table
    Table {
        /// electricity or gas
        fuel: String,
        /// usage or spending
        metric: String,
        /// Office or Property_Name
        grouping: String,
    },
    /// List office keys
    Offices,
    /// List property keys
    Properties,
    /// Monthly figures and averages for one office or property
    Averages {
        /// Office or Property_Name
        grouping: String,
        /// Office or property name
        entity: String,
        /// Billing periods as <month>_<year>; all periods when omitted
        #[arg(short = 'p', long = "period", value_name = "PERIOD")]
        periods: Vec<String>,
    },
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Pretty table output (default)
    #[default]
    Table,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = load_config(cli.config.as_ref(), cli.data_dir)?;
    let registry = DatasetRegistry::build(&config).context("Failed to build datasets")?;

    let output = match cli.command {
        Command::Table {
            fuel,
            metric,
            grouping,
        } => {
            let table = registry.get_table_str(&fuel, &metric, &grouping)?;
            render_table(table, cli.format)?
        }
        Command::Offices => render_list("Office", registry.list_offices(), cli.format)?,
        Command::Properties => {
            render_list("Property_Name", registry.list_properties(), cli.format)?
        }
        Command::Averages {
            grouping,
            entity,
            periods,
        } => {
            let grouping: Grouping = grouping.parse()?;
            let periods = parse_periods(&periods)?;
            let averages = registry.averages(grouping, &entity, &periods)?;
            render_averages(&averages, cli.format)?
        }
    };

    print!("{output}");
    Ok(())
}

/// Read the config file if given, then apply command-line overrides.
fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

fn parse_periods(labels: &[String]) -> Result<Vec<Period>> {
    labels
        .iter()
        .map(|label| label.parse::<Period>().map_err(|e| anyhow::anyhow!(e)))
        .collect()
}

fn render_table(table: &PublishedTable, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&table.to_records())? + "\n"),
        OutputFormat::Csv => {
            let mut headers = vec![table.key_column().to_string()];
            headers.extend(table.column_labels());
            let rows = table.rows().iter().map(|row| {
                std::iter::once(row.key.clone())
                    .chain(row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()))
                    .collect::<Vec<String>>()
            });
            write_csv(&headers, rows)
        }
        OutputFormat::Table => {
            if table.rows().is_empty() {
                return Ok("(empty table)\n".to_string());
            }
            let mut headers = vec![table.key_column().to_string()];
            headers.extend(table.column_labels());
            let rows: Vec<Vec<String>> = table
                .rows()
                .iter()
                .map(|row| {
                    std::iter::once(row.key.clone())
                        .chain(row.values.iter().map(|v| format_number(*v)))
                        .collect()
                })
                .collect();
            let mut out = format_grid(&headers, &rows, None);
            out.push_str(&format!("({} rows, unit: {})\n", table.row_count(), table.unit()));
            Ok(out)
        }
    }
}

fn render_list(column: &str, keys: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(keys)? + "\n"),
        OutputFormat::Csv => write_csv(
            &[column.to_string()],
            keys.iter().map(|key| vec![key.clone()]),
        ),
        OutputFormat::Table => {
            let mut out = format!("{}\n", column.cyan().bold());
            for key in keys {
                out.push_str(key);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

const AVERAGE_HEADERS: [&str; 5] = [
    "Month",
    "Electricity Spending ($)",
    "Electricity Usage (kWh)",
    "Gas Spending ($)",
    "Gas Usage (therms)",
];

fn metric_cells(label: String, metrics: &FuelMetrics) -> Vec<String> {
    vec![
        label,
        format!("{:.2}", metrics.electricity_spending),
        format!("{:.2}", metrics.electricity_usage),
        format!("{:.2}", metrics.gas_spending),
        format!("{:.2}", metrics.gas_usage),
    ]
}

fn render_averages(averages: &AverageTable, format: OutputFormat) -> Result<String> {
    let headers: Vec<String> = AVERAGE_HEADERS.iter().map(ToString::to_string).collect();
    let mut rows: Vec<Vec<String>> = averages
        .rows
        .iter()
        .map(|row| metric_cells(row.period.to_string(), &row.metrics))
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(averages)? + "\n"),
        OutputFormat::Csv => {
            if let Some(mean) = &averages.mean {
                rows.push(metric_cells("Average".to_string(), mean));
            }
            write_csv(&headers, rows)
        }
        OutputFormat::Table => {
            let mut out = format!(
                "{} {}\n",
                averages.grouping.key_column().cyan().bold(),
                averages.entity
            );
            let mean_row = averages
                .mean
                .as_ref()
                .map(|mean| metric_cells("Average".to_string(), mean));
            out.push_str(&format_grid(&headers, &rows, mean_row));
            if averages.mean.is_none() {
                out.push_str("(no periods)\n");
            }
            Ok(out)
        }
    }
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// Render rows as a bordered grid: bold header, right-aligned numbers.
///
/// `footer` is appended as a last row with a bold label.
fn format_grid(headers: &[String], rows: &[Vec<String>], footer: Option<Vec<String>>) -> String {
    let cells = |row: &[String], bold_label: bool| -> Vec<Cell> {
        row.iter()
            .enumerate()
            .map(|(i, value)| {
                let cell = Cell::new(value);
                match i {
                    0 if bold_label => cell.add_attribute(Attribute::Bold),
                    0 => cell,
                    _ => cell.set_alignment(CellAlignment::Right),
                }
            })
            .collect()
    };

    let mut grid = Grid::new();
    grid.load_preset(ASCII_FULL)
        .set_header(headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    for row in rows {
        grid.add_row(cells(row, false));
    }
    if let Some(footer) = footer {
        grid.add_row(cells(&footer, true));
    }
    format!("{grid}\n")
}

fn write_csv<I>(headers: &[String], rows: I) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(String::from_utf8(bytes)?)
}
