//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::align::AlignedTable;
use crate::domain::config_validation::{
    DataConfig, DataSource, build_data_config, build_render_options, validate_config,
};
use crate::domain::error::RetvizError;
use crate::domain::pipeline::{build_aligned_table, fetch};
use crate::domain::stats::{CorrelationMatrix, Summary};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::report_port::{ExploratoryReport, ReportPort};

const DEFAULT_HEAD_ROWS: i64 = 5;
const DEFAULT_REPORT_PATH: &str = "report.html";

#[derive(Parser, Debug)]
#[command(name = "retviz", about = "Daily return alignment and exploratory plots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the aligned return table and print its head
    Align {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the full table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of rows to print
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Show the price history available for each instrument
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Summary statistics per column
    Describe {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Pairwise correlation matrix
    Correlate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write an HTML report with distribution and correlation charts
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with a price file in the CSV directory
    Symbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Align {
            config,
            output,
            rows,
        } => run_align(&config, output.as_ref(), rows),
        Command::Info { config } => run_info(&config),
        Command::Describe { config } => run_describe(&config),
        Command::Correlate { config } => run_correlate(&config),
        Command::Report { config, output } => run_report(&config, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { config } => run_symbols(&config),
    }
}

fn fail(e: RetvizError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn load_data_config(path: &PathBuf) -> Result<(FileConfigAdapter, DataConfig), ExitCode> {
    let adapter = load_config(path)?;
    let data = build_data_config(&adapter).map_err(fail)?;
    Ok((adapter, data))
}

/// Opens the market data adapter configured under `[data] source`.
pub fn open_data_port(source: &DataSource) -> Result<Box<dyn MarketDataPort>, ExitCode> {
    match source {
        DataSource::Csv { dir } => Ok(Box::new(CsvAdapter::new(PathBuf::from(dir)))),
        #[cfg(feature = "yahoo")]
        DataSource::Yahoo => {
            let adapter = crate::adapters::yahoo_adapter::YahooAdapter::new().map_err(fail)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "yahoo"))]
        DataSource::Yahoo => {
            eprintln!("error: yahoo feature is required for source = yahoo");
            Err(ExitCode::from(1))
        }
    }
}

fn load_table(data: &DataConfig) -> Result<AlignedTable, ExitCode> {
    let port = open_data_port(&data.source)?;
    build_aligned_table(
        port.as_ref(),
        &data.instruments,
        data.start_date,
        data.end_date,
    )
    .map_err(fail)
}

fn fmt_cell(v: f64) -> String {
    if v.is_finite() {
        format!("{v:>12.6}")
    } else {
        format!("{:>12}", "NaN")
    }
}

/// Fixed-width rendering of a table, one line per date.
pub fn format_table(table: &AlignedTable) -> String {
    let header: String = table
        .columns()
        .iter()
        .map(|c| format!("{c:>12}"))
        .collect();
    let mut out = format!("{:<10} {header}\n", "Date");
    for (date, values) in table.rows() {
        let cells: String = values.into_iter().map(fmt_cell).collect();
        out.push_str(&format!("{:<10} {cells}\n", date.format("%Y-%m-%d")));
    }
    out
}

/// Per-instrument price coverage over the configured range.
pub fn format_info(port: &dyn MarketDataPort, data: &DataConfig) -> Result<String, RetvizError> {
    let mut out = format!(
        "{:<8} {:<12} {:>6} {:<10} {:<10} {:>12} {:>12}\n",
        "Symbol", "Column", "Count", "First", "Last", "First Price", "Last Price"
    );
    for instrument in &data.instruments {
        let series = fetch(port, &instrument.symbol, data.start_date, data.end_date)?;
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            continue;
        };
        out.push_str(&format!(
            "{:<8} {:<12} {:>6} {:<10} {:<10} {:>12.4} {:>12.4}\n",
            instrument.symbol,
            instrument.display_name(),
            series.len(),
            first.date.format("%Y-%m-%d"),
            last.date.format("%Y-%m-%d"),
            first.price,
            last.price
        ));
    }
    Ok(out)
}

/// Summary statistics, one line per column.
pub fn format_summaries(table: &AlignedTable) -> String {
    let mut out = format!(
        "{:<12} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
    );
    for (name, s) in Summary::for_table(table) {
        let cells: String = [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max]
            .into_iter()
            .map(|v| format!(" {}", fmt_cell(v)))
            .collect();
        out.push_str(&format!("{name:<12} {:>6}{cells}\n", s.count));
    }
    out
}

/// Pairwise Pearson correlation matrix.
pub fn format_correlation(table: &AlignedTable) -> String {
    let matrix = CorrelationMatrix::compute(table);
    let header: String = matrix.labels.iter().map(|l| format!("{l:>12}")).collect();
    let mut out = format!("{:<12}{header}\n", "");
    for (label, row) in matrix.labels.iter().zip(&matrix.values) {
        let cells: String = row.iter().map(|&v| fmt_cell(v)).collect();
        out.push_str(&format!("{label:<12}{cells}\n"));
    }
    out
}

fn head_rows(config: &dyn ConfigPort) -> usize {
    config
        .get_int("report", "head_rows", DEFAULT_HEAD_ROWS)
        .max(0) as usize
}

fn run_align(config_path: &PathBuf, output: Option<&PathBuf>, rows: Option<usize>) -> ExitCode {
    let (adapter, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let table = match load_table(&data) {
        Ok(t) => t,
        Err(code) => return code,
    };

    let rows = rows.unwrap_or_else(|| head_rows(&adapter));
    print!("{}", format_table(&table.head(rows)));
    eprintln!(
        "{} rows x {} columns ({} to {})",
        table.row_count(),
        table.column_count(),
        data.start_date,
        data.end_date
    );

    if let Some(path) = output {
        if let Err(e) = csv_adapter::write_table_file(&table, path) {
            return fail(e);
        }
        eprintln!("Table written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    let (_, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let port = match open_data_port(&data.source) {
        Ok(p) => p,
        Err(code) => return code,
    };

    match format_info(port.as_ref(), &data) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_describe(config_path: &PathBuf) -> ExitCode {
    let (_, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let table = match load_table(&data) {
        Ok(t) => t,
        Err(code) => return code,
    };

    print!("{}", format_summaries(&table));
    ExitCode::SUCCESS
}

fn run_correlate(config_path: &PathBuf) -> ExitCode {
    let (_, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let table = match load_table(&data) {
        Ok(t) => t,
        Err(code) => return code,
    };

    print!("{}", format_correlation(&table));
    ExitCode::SUCCESS
}

fn run_report(config_path: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    let (adapter, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let options = match build_render_options(&adapter) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };
    let table = match load_table(&data) {
        Ok(t) => t,
        Err(code) => return code,
    };

    let output = output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"))
        .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string());

    let report = ExploratoryReport {
        instruments: &data.instruments,
        start_date: data.start_date,
        end_date: data.end_date,
        table: &table,
        head_rows: head_rows(&adapter),
    };
    match HtmlReportAdapter::new().write(&report, &options, &output) {
        Ok(()) => {
            eprintln!("Report written to: {output}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn run_symbols(config_path: &PathBuf) -> ExitCode {
    let (_, data) = match load_data_config(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let DataSource::Csv { dir } = &data.source else {
        eprintln!("error: symbols requires source = csv");
        return ExitCode::from(2);
    };

    match CsvAdapter::new(PathBuf::from(dir)).list_symbols() {
        Ok(symbols) if symbols.is_empty() => {
            eprintln!("No symbols found in {dir}");
            ExitCode::SUCCESS
        }
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{symbol}");
            }
            eprintln!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
