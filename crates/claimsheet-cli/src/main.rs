//! Claimsheet CLI - preprocess and inspect warranty claim workbooks

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use claimsheet::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "claimsheet")]
#[command(
    author,
    version,
    about = "Warranty chargeback workbook preprocessing tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the warranty rules and write chargeback formulas
    Preprocess {
        /// Input workbook (xlsx, xlsm)
        input: PathBuf,

        /// Output workbook (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON config file; missing fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sheet index to process (0-based), overrides the config
        #[arg(short, long)]
        sheet: Option<usize>,
    },

    /// Print displayed cell values as tab-separated text
    Show {
        /// Input workbook
        input: PathBuf,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sheet index to show (0-based)
        #[arg(short, long)]
        sheet: Option<usize>,
    },

    /// Show information about a workbook
    Info {
        /// Input workbook
        input: PathBuf,
    },

    /// Print the default config as JSON
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess {
            input,
            output,
            config,
            sheet,
        } => run_preprocess(&input, output.as_deref(), config.as_deref(), sheet),
        Commands::Show {
            input,
            config,
            sheet,
        } => show(&input, config.as_deref(), sheet),
        Commands::Info { input } => show_info(&input),
        Commands::DefaultConfig => {
            let json = serde_json::to_string_pretty(&PreprocessConfig::default())
                .context("Failed to serialize config")?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, sheet: Option<usize>) -> Result<PreprocessConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config '{}'", path.display()))?
        }
        None => PreprocessConfig::default(),
    };
    if let Some(sheet) = sheet {
        config.sheet_index = sheet;
    }
    Ok(config)
}

fn open(input: &Path) -> Result<Workbook> {
    Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn run_preprocess(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    sheet: Option<usize>,
) -> Result<()> {
    let config = load_config(config, sheet)?;
    let mut workbook = open(input)?;

    let report = match preprocess(&mut workbook, &config) {
        Ok(report) => report,
        Err(PreprocessError::AlreadyPreprocessed) => {
            match PreprocessGuard::marked_at(&workbook) {
                Some(at) => bail!("'{}' was already preprocessed at {}", input.display(), at),
                None => bail!("'{}' was already preprocessed", input.display()),
            }
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to preprocess '{}'", input.display()))
        }
    };

    let output = output.unwrap_or(input);
    workbook
        .save(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!(
        "Processed rows {}..={} ({} data rows, {} rate(s) zeroed)",
        config.data_start_row,
        report.last_row,
        report.data_rows.len(),
        report.changed_rows.len()
    );
    eprintln!("Wrote '{}'", output.display());
    Ok(())
}

fn show(input: &Path, config: Option<&Path>, sheet: Option<usize>) -> Result<()> {
    let config = load_config(config, sheet)?;
    let index = config.sheet_index;
    let session = Session::with_sheet(open(input)?, config, index)
        .with_context(|| format!("Sheet index {} not found", index))?;

    let sheet = session
        .workbook()
        .worksheet(session.sheet_index())
        .with_context(|| format!("Sheet index {} not found", index))?;

    let mut out = String::new();
    for row in 1..=sheet.max_row() {
        let line: Vec<String> = (1..=sheet.max_col())
            .map(|col| session.display_value(row, col))
            .collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }

    io::stdout()
        .write_all(out.as_bytes())
        .context("Failed to write to stdout")?;
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());
    match PreprocessGuard::marked_at(&workbook) {
        Some(at) => println!("Preprocessed: yes ({})", at),
        None if PreprocessGuard::is_preprocessed(&workbook) => println!("Preprocessed: yes"),
        None => println!("Preprocessed: no"),
    }

    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\" ({})", i, sheet.name(), sheet.state().as_str());
        println!(
            "    Used range: {} rows x {} columns",
            sheet.max_row(),
            sheet.max_col()
        );
        println!("    Merged regions: {}", sheet.merged_regions().len());
    }

    Ok(())
}
