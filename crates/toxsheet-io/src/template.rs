//! Report templates in and filled reports out.
//!
//! A template is read into a [`Worksheet`] (cell text plus merged regions). The
//! filled worksheet is re-rendered as a fresh `.xlsx` with the layout's styling
//! applied on top.

use std::collections::BTreeSet;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, open_workbook_from_rs, Reader, Xlsx};
use log::{debug, warn};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use toxsheet_engine::ReportLayout;
use toxsheet_model::{CellRef, Column, HazardCategory, Range, Worksheet, MAX_COLS, MAX_ROWS};

use crate::database::cell_text;
use crate::error::IoError;

/// Excel's sheet-name limit.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Load `sheet` (or the first sheet) of the workbook at `path`.
pub fn load_template(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Worksheet, IoError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_template(&mut workbook, sheet)
}

pub fn load_template_from_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<Worksheet, IoError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(std::io::Cursor::new(bytes))?;
    read_template(&mut workbook, sheet)
}

fn read_template<RS: Read + Seek>(workbook: &mut Xlsx<RS>, sheet: Option<&str>) -> Result<Worksheet, IoError> {
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IoError::MissingSheet(wanted.to_string()))?,
        None => names.first().cloned().ok_or(IoError::NoWorksheets)?,
    };

    let mut out = Worksheet::new(name.clone());
    let range = workbook.worksheet_range(&name)?;
    let start = range.start().unwrap_or((0, 0));
    for (row, col, value) in range.used_cells() {
        let Some(text) = cell_text(value) else {
            continue;
        };
        match to_cell_ref(start, row, col) {
            Some(cell) => {
                out.write(cell, text);
            }
            None => warn!("template `{name}`: skipping out-of-bounds cell at ({row},{col})"),
        }
    }

    // Values first: registering a merge drops whatever sits under its non-anchor cells.
    if let Some(merges) = workbook.worksheet_merge_cells(&name) {
        for dim in merges? {
            let range = Range::new(
                CellRef::new(dim.start.0, dim.start.1),
                CellRef::new(dim.end.0, dim.end.1),
            );
            if let Err(err) = out.merge_range(range) {
                warn!("template `{name}`: ignoring merged region {range}: {err}");
            }
        }
    }

    debug!(
        "template `{name}`: {} cells, {} merged regions",
        out.cell_count(),
        out.merged_regions().len()
    );
    Ok(out)
}

fn to_cell_ref(start: (u32, u32), row: usize, col: usize) -> Option<CellRef> {
    // calamine iterators yield coordinates relative to `range.start()`.
    let row = start.0.checked_add(u32::try_from(row).ok()?)?;
    let col = start.1.checked_add(u32::try_from(col).ok()?)?;
    (row < MAX_ROWS && col < MAX_COLS).then(|| CellRef::new(row, col))
}

/// Render `sheet` as `.xlsx` bytes, applying `layout`'s styling.
pub fn render_report(sheet: &Worksheet, layout: &ReportLayout) -> Result<Vec<u8>, IoError> {
    let style = &layout.style;
    let styled_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_font_name(style.font_name.as_str())
        .set_font_size(style.font_size);
    let plain_format = Format::new();

    let mut workbook = Workbook::new();
    let out = workbook.add_worksheet();
    out.set_name(sheet_title(sheet.name()))?;

    for (column, width) in &style.column_widths {
        out.set_column_width(col_num(*column)?, *width)?;
    }
    if let Some(height) = style.category_row_height {
        for block in &layout.blocks {
            for category in HazardCategory::ALL {
                // Category rows are 1-based; the writer is 0-based.
                out.set_row_height(block.category_row(category) - 1, height)?;
            }
        }
    }

    let is_styled = |range: &Range| style.styled_ranges.iter().any(|s| s.intersects(range));

    let mut covered = BTreeSet::new();
    for region in sheet.merged_regions() {
        let format = if is_styled(region) { &styled_format } else { &plain_format };
        let value = sheet.value(region.start).unwrap_or("");
        out.merge_range(
            region.start.row,
            col_num(region.start.column())?,
            region.end.row,
            col_num(region.end.column())?,
            value,
            format,
        )?;
        covered.extend(region.cells());
    }

    let mut styled_cells = BTreeSet::new();
    for range in &style.styled_ranges {
        for cell in range.cells() {
            if covered.contains(&cell) || !styled_cells.insert(cell) {
                continue;
            }
            let col = col_num(cell.column())?;
            match sheet.value(cell) {
                Some(value) => out.write_string_with_format(cell.row, col, value, &styled_format)?,
                None => out.write_blank(cell.row, col, &styled_format)?,
            };
        }
    }

    for (cell, value) in sheet.iter_cells() {
        if covered.contains(&cell) || styled_cells.contains(&cell) {
            continue;
        }
        out.write_string(cell.row, col_num(cell.column())?, value)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Render and write the report to `path`.
pub fn save_report(path: impl AsRef<Path>, sheet: &Worksheet, layout: &ReportLayout) -> Result<(), IoError> {
    let path = path.as_ref();
    let bytes = render_report(sheet, layout)?;
    std::fs::write(path, bytes).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn col_num(column: Column) -> Result<u16, IoError> {
    u16::try_from(column.index()).map_err(|_| IoError::OutOfBounds(column.letters()))
}

/// A sheet name Excel accepts: forbidden characters replaced, at most 31 characters.
pub fn sheet_title(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_titles_are_sanitized() {
        assert_eq!(sheet_title("B-1 및 B-2"), "B-1 및 B-2");
        assert_eq!(sheet_title("a/b:c"), "a_b_c");
        assert_eq!(sheet_title(""), "Sheet1");
        assert_eq!(sheet_title(&"x".repeat(40)).chars().count(), 31);
    }

    #[test]
    fn relative_coordinates_are_offset() {
        assert_eq!(to_cell_ref((3, 2), 1, 1), Some(CellRef::new(4, 3)));
        assert_eq!(to_cell_ref((MAX_ROWS - 1, 0), 1, 0), None);
    }
}
