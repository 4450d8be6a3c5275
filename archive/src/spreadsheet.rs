//! Export of observation tables for browsing outside the tools.
//!
//! The XLSX layout mirrors the archive web interface: a header row of
//! human-readable column names followed by one row per observation, with
//! alternating green row fills and column widths fitted to the content.

use crate::observation::{ObservationTable, COLUMN_NAMES};
use crate::Result;
use log::info;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use std::path::Path;

pub const FONT_NAME: &str = "Times New Roman";
/// Fill of even rows, header included
pub const EVEN_ROW_FILL: u32 = 0xF3F8EE;
pub const ODD_ROW_FILL: u32 = 0xDAECC9;
pub const MIN_COLUMN_WIDTH: usize = 6;
pub const MAX_COLUMN_WIDTH: usize = 150;

/// Header row followed by the cells of every record.
fn table_rows(table: &ObservationTable) -> Vec<Vec<String>> {
    std::iter::once(COLUMN_NAMES.iter().map(|s| s.to_string()).collect())
        .chain(table.records().iter().map(|r| r.cells()))
        .collect()
}

/// Width of each column: the longest cell clamped to
/// [`MIN_COLUMN_WIDTH`, `MAX_COLUMN_WIDTH`], plus one.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<f64> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|j| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(j))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            (longest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) + 1) as f64
        })
        .collect()
}

fn row_format(row: usize) -> Format {
    let fill = if row % 2 == 0 { EVEN_ROW_FILL } else { ODD_ROW_FILL };
    let format = Format::new()
        .set_font_name(FONT_NAME)
        .set_background_color(Color::RGB(fill))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::White)
        .set_text_wrap()
        .set_align(FormatAlign::VerticalCenter);

    if row == 0 {
        format.set_bold()
    } else {
        format
    }
}

/// Write `table` as a single-sheet XLSX workbook.
pub fn write_xlsx(path: &Path, table: &ObservationTable) -> Result<()> {
    let rows = table_rows(table);
    let widths = column_widths(&rows);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let formats = [row_format(0), row_format(1), row_format(2)];

    for (i, row) in rows.iter().enumerate() {
        let format = match i {
            0 => &formats[0],
            i if i % 2 == 1 => &formats[1],
            _ => &formats[2],
        };
        for (j, cell) in row.iter().enumerate() {
            worksheet.write_string_with_format(i as u32, j as u16, cell, format)?;
        }
    }
    for (j, width) in widths.iter().enumerate() {
        worksheet.set_column_width(j as u16, *width)?;
    }

    workbook.save(path)?;
    info!("Wrote {} observations to {}", table.len(), path.display());
    Ok(())
}

/// Write `table` as CSV with the same columns as the workbook.
pub fn write_csv(path: &Path, table: &ObservationTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in table_rows(table) {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!("Wrote {} observations to {}", table.len(), path.display());
    Ok(())
}
