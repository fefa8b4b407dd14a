use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use clap::Parser;

pub const DEFAULT_ROWS: usize = 20;

/// Display text of a calamine cell. Whole floats drop their decimals so that
/// numeric identifiers read the way Excel shows them.
pub fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(n)) if n.fract() == 0.0 => format!("{n:.0}"),
        Some(Data::Float(n)) => n.to_string(),
        Some(Data::Int(n)) => n.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(Data::DateTime(d)) => d.to_string(),
        Some(other) => format!("{other:?}"),
    }
}

/// Writes every sheet name, then the first `max_rows` rows of each sheet.
///
/// Rows and columns are counted from A1, not from the first used cell, so
/// the position of a value inside a printed row is its column index.
pub fn inspect_workbook(path: &Path, max_rows: usize, out: &mut impl Write) -> Result<()> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("cannot open file: {}", path.display()))?;

    let sheet_names = workbook.sheet_names();
    writeln!(out, "Sheet names: {sheet_names:?}")?;

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .with_context(|| format!("cannot read sheet: {sheet_name}"))?;

        writeln!(out, "\n=== {sheet_name} ===")?;
        let Some((last_row, last_col)) = range.end() else {
            continue;
        };

        let total_rows = last_row as usize + 1;
        for row in 0..total_rows.min(max_rows) as u32 {
            let cells: Vec<Option<String>> = (0..=last_col)
                .map(|col| {
                    let text = cell_text(range.get_value((row, col)));
                    (!text.is_empty()).then_some(text)
                })
                .collect();
            writeln!(out, "({})", format_row(&cells))?;
        }
        if total_rows > max_rows {
            writeln!(out, "... ({} more rows)", total_rows - max_rows)?;
        }
    }
    Ok(())
}

fn format_row(cells: &[Option<String>]) -> String {
    cells
        .iter()
        .map(|c| match c {
            Some(text) => format!("{text:?}"),
            None => "None".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Parser)]
#[command(name = "uat-inspect")]
#[command(about = "Print the sheets and leading rows of a test-plan workbook")]
struct InspectCli {
    /// Workbook to read (.xlsx, .xls, .ods)
    workbook: PathBuf,
    /// Rows to print per sheet
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,
}

pub fn run(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<()> {
    let cli = InspectCli::parse_from(args);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    inspect_workbook(&cli.workbook, cli.rows, &mut out)
}
