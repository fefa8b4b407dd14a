use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};
use umya_spreadsheet::Worksheet;

use crate::config::{ResultLayout, TargetConfig};
use crate::status::{ResultSet, TestStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub row: u32,
    pub test_id: String,
    pub status: TestStatus,
}

fn identifier_at(sheet: &Worksheet, column: u32, row: u32) -> Option<String> {
    // get_cell() never creates cells, so unmatched rows stay as they were.
    let value = sheet.get_cell((column, row))?.get_value();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Upserts results into every row whose identifier cell matches a key.
/// Rows without a match are not touched; keys without a row are ignored.
pub fn record_into_sheet(
    sheet: &mut Worksheet,
    target: &TargetConfig,
    results: &ResultSet,
) -> Vec<RowUpdate> {
    let mut updates = Vec::new();
    let last_row = sheet.get_highest_row();

    for row in target.first_row..=last_row {
        let Some(test_id) = identifier_at(sheet, target.id_column, row) else {
            continue;
        };
        if let Some(prefix) = &target.id_prefix {
            if !test_id.starts_with(prefix.as_str()) {
                continue;
            }
        }
        let Some(result) = results.get(&test_id) else {
            continue;
        };

        match target.layout {
            ResultLayout::Split {
                result_column,
                notes_column,
            } => {
                let cell = sheet.get_cell_mut((result_column, row));
                cell.set_value(result.status.as_str());
                crate::style::apply_status_style(cell.get_style_mut(), result.status);

                sheet
                    .get_cell_mut((notes_column, row))
                    .set_value(result.notes.as_str());
            }
            ResultLayout::Combined { column } => {
                let cell = sheet.get_cell_mut((column, row));
                cell.set_value(format!("{} - {}", result.status, result.notes));
                crate::style::apply_status_style(cell.get_style_mut(), result.status);
            }
        }

        debug!(row, test_id = %test_id, status = %result.status, "updated row");
        updates.push(RowUpdate {
            row,
            test_id,
            status: result.status,
        });
    }

    updates
}

/// Opens the target workbook, records `results` into its sheet and saves it
/// back in place. Any read or write failure is returned as-is.
pub fn record_into_workbook(target: &TargetConfig, results: &ResultSet) -> Result<Vec<RowUpdate>> {
    let path = &target.path;
    let mut book = umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("cannot open workbook: {}", path.display()))?;

    let sheet = book
        .get_sheet_by_name_mut(&target.sheet)
        .ok_or_else(|| anyhow!("sheet not found: {} in {}", target.sheet, path.display()))?;

    let updates = record_into_sheet(sheet, target, results);

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .with_context(|| format!("cannot save workbook: {}", path.display()))?;

    info!(
        path = %path.display(),
        sheet = %target.sheet,
        updated = updates.len(),
        "saved workbook"
    );
    Ok(updates)
}

/// Records into every target in order, printing one line per updated row and
/// a count per workbook. Stops at the first workbook that fails.
pub fn record_all(targets: &[TargetConfig], results: &ResultSet) -> Result<usize> {
    let mut total = 0;
    for target in targets {
        println!("Updating {}...", target.path.display());
        let updates = record_into_workbook(target, results)?;
        for update in &updates {
            println!("  Updated {}: {}", update.test_id, update.status);
        }
        println!("Saved {}: {} tests updated", target.path.display(), updates.len());
        total += updates.len();
    }
    Ok(total)
}
