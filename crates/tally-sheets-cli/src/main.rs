//! Tally Sheets CLI - evaluate formulas on a grid built from the command line

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tally_sheets::prelude::*;

#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about = "Spreadsheet formula evaluation tool")]
struct Cli {
    #[command(flatten)]
    grid: GridArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options describing the grid every command starts from
#[derive(Args)]
struct GridArgs {
    /// Number of rows in the grid
    #[arg(long, default_value = "10", global = true)]
    rows: u32,

    /// Number of columns in the grid
    #[arg(long, default_value = "10", global = true)]
    cols: u32,

    /// Cell contents as NAME=TEXT, e.g. A1=10 or B1==A1*2 (repeatable)
    #[arg(long = "cell", value_name = "NAME=TEXT", value_parser = parse_assignment, global = true)]
    cells: Vec<(String, String)>,

    /// Display formulas instead of their results
    #[arg(long, global = true)]
    show_formulas: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one formula against the grid and print its result
    Eval {
        /// Formula text, e.g. "=SUM(A1:B2)"
        formula: String,
    },

    /// Recalculate the grid and print it
    Recalc {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a row and print the grid
    DeleteRow {
        /// Row number (1-based)
        row: u32,
    },

    /// Delete a column and print the grid
    DeleteColumn {
        /// Column letters, e.g. "B"
        column: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut book = build_spreadsheet(&cli.grid)?;

    match cli.command {
        Commands::Eval { formula } => {
            println!("{}", book.evaluate(&formula));
            Ok(())
        }
        Commands::Recalc { output } => {
            let stats = book.recalculate().context("Failed to recalculate")?;
            report(&stats);
            write_grid(book.sheet(), output.as_deref())
        }
        Commands::DeleteRow { row } => {
            if row == 0 {
                bail!("Row numbers start at 1");
            }
            let stats = book
                .delete_row(row - 1)
                .with_context(|| format!("Failed to delete row {}", row))?;
            report(&stats);
            write_grid(book.sheet(), None)
        }
        Commands::DeleteColumn { column } => {
            let index = CellAddress::letters_to_column(&column)
                .with_context(|| format!("Invalid column '{}'", column))?;
            let stats = book
                .delete_column(index)
                .with_context(|| format!("Failed to delete column {}", column))?;
            report(&stats);
            write_grid(book.sheet(), None)
        }
    }
}

/// Parse a `NAME=TEXT` cell assignment
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, text)) if !name.is_empty() => Ok((name.to_string(), text.to_string())),
        _ => Err(format!("expected NAME=TEXT, got '{}'", s)),
    }
}

fn build_spreadsheet(args: &GridArgs) -> Result<Spreadsheet> {
    let mut book = Spreadsheet::new(args.rows, args.cols);

    for (name, text) in &args.cells {
        book.set_cell(name, text)
            .with_context(|| format!("Failed to set cell {}", name))?;
    }

    if args.show_formulas {
        book.set_formula_view(true)
            .context("Failed to switch to formula view")?;
    }

    Ok(book)
}

fn report(stats: &CalculationStats) {
    eprintln!(
        "Calculated {} formulas ({} errors, {} circular)",
        stats.formula_count, stats.errors, stats.circular_references
    );
}

/// Write the grid's display text, tab-separated, one line per row
fn write_grid(sheet: &Sheet, output: Option<&Path>) -> Result<()> {
    let mut text = String::new();

    for row in 0..sheet.row_count() {
        let line: Vec<&str> = (0..sheet.column_count())
            .map(|col| sheet.cell_at(row, col).map_or("", |cell| cell.text.as_str()))
            .collect();
        text.push_str(&line.join("\t"));
        text.push('\n');
    }

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} rows to '{}'",
            sheet.row_count(),
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}
