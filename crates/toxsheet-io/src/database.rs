//! Loading the toxicology database workbook.
//!
//! The workbook has two sheets located by name, each with a header row. Columns are
//! looked up by header text, so their order is free.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, open_workbook_from_rs, Data, Range, Reader, Xlsx};
use log::{debug, warn};
use toxsheet_model::{Dataset, DerivationMethod, HazardCategory, Observation, Substance};

use crate::error::IoError;

pub const SUBSTANCE_SHEET: &str = "물질정보";
pub const OBSERVATION_SHEET: &str = "유해성정보";

const COL_ID: &str = "내부식별자";
const COL_CAS: &str = "CAS";
const COL_NAME: &str = "물질명";
const COL_FORMULA: &str = "분자식";
const COL_WEIGHT: &str = "분자량";

const COL_CATEGORY: &str = "유해성항목";
const COL_METHOD: &str = "결과도출방법";
const COL_SOURCE: &str = "출처";
const COL_ENDPOINT: &str = "Endpoint";
const COL_ENDPOINT_STD: &str = "Endpoint(표준)";
const COL_SPECIES: &str = "시험종";
const COL_SPECIES_STD: &str = "시험종(표준)";
const COL_DURATION_STD: &str = "Duration(표준)";
const COL_GUIDELINE: &str = "시험지침";
const COL_RESULT: &str = "Result";
const COL_UNIT: &str = "단위";
const COL_DOMAIN: &str = "Domain status";
const COL_MODEL: &str = "모델 종류 및 버전";

/// Read both record sets from the workbook at `path`.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, IoError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_dataset(&mut workbook)
}

/// Like [`load_dataset`], for a workbook already in memory.
pub fn load_dataset_from_bytes(bytes: &[u8]) -> Result<Dataset, IoError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(std::io::Cursor::new(bytes))?;
    read_dataset(&mut workbook)
}

fn read_dataset<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> Result<Dataset, IoError> {
    let substances = read_substances(&sheet_range(workbook, SUBSTANCE_SHEET)?)?;
    let observations = read_observations(&sheet_range(workbook, OBSERVATION_SHEET)?)?;
    debug!(
        "loaded {} substances and {} observations",
        substances.len(),
        observations.len()
    );
    Ok(Dataset::new(substances, observations))
}

fn sheet_range<RS: Read + Seek>(workbook: &mut Xlsx<RS>, name: &str) -> Result<Range<Data>, IoError> {
    if !workbook.sheet_names().iter().any(|n| n == name) {
        return Err(IoError::MissingSheet(name.to_string()));
    }
    Ok(workbook.worksheet_range(name)?)
}

/// Header row of a sheet, resolved to column positions.
struct Columns<'a> {
    sheet: &'a str,
    by_name: HashMap<String, usize>,
}

impl<'a> Columns<'a> {
    fn new(sheet: &'a str, header: &[Data]) -> Self {
        let by_name = header
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell_text(cell).map(|name| (name.trim().to_string(), i)))
            .collect();
        Self { sheet, by_name }
    }

    fn required(&self, column: &str) -> Result<usize, IoError> {
        self.by_name
            .get(column)
            .copied()
            .ok_or_else(|| IoError::MissingColumn {
                sheet: self.sheet.to_string(),
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }
}

fn field(row: &[Data], index: Option<usize>) -> Option<String> {
    index.and_then(|i| row.get(i)).and_then(cell_text)
}

fn read_substances(range: &Range<Data>) -> Result<Vec<Substance>, IoError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = Columns::new(SUBSTANCE_SHEET, header);
    let id = columns.required(COL_ID)?;
    let cas = columns.optional(COL_CAS);
    let name = columns.optional(COL_NAME);
    let formula = columns.optional(COL_FORMULA);
    let weight = columns.optional(COL_WEIGHT);

    let substances = rows
        .filter_map(|row| {
            let id = field(row, Some(id))?.trim().to_string();
            if id.is_empty() {
                return None;
            }
            Some(Substance {
                id,
                cas: field(row, cas).unwrap_or_default(),
                name: field(row, name).unwrap_or_default(),
                formula: field(row, formula).unwrap_or_default(),
                molecular_weight: field(row, weight).unwrap_or_default(),
            })
        })
        .collect();
    Ok(substances)
}

fn read_observations(range: &Range<Data>) -> Result<Vec<Observation>, IoError> {
    let first_row = range.start().map_or(0, |(row, _)| row);
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = Columns::new(OBSERVATION_SHEET, header);
    let id = columns.required(COL_ID)?;
    let category = columns.required(COL_CATEGORY)?;
    let method = columns.required(COL_METHOD)?;
    let source = columns.required(COL_SOURCE)?;
    let result = columns.required(COL_RESULT)?;
    let endpoint = columns.optional(COL_ENDPOINT);
    let endpoint_std = columns.optional(COL_ENDPOINT_STD);
    let species = columns.optional(COL_SPECIES);
    let species_std = columns.optional(COL_SPECIES_STD);
    let duration_std = columns.optional(COL_DURATION_STD);
    let guideline = columns.optional(COL_GUIDELINE);
    let unit = columns.optional(COL_UNIT);
    let domain = columns.optional(COL_DOMAIN);
    let model = columns.optional(COL_MODEL);

    let mut observations = Vec::new();
    for (offset, row) in rows.enumerate() {
        // Header is the range's first row; records start one below it. 1-based.
        let ordinal = first_row + offset as u32 + 2;
        let Some(substance_id) = field(row, Some(id)).map(|s| s.trim().to_string()) else {
            continue;
        };
        let label = field(row, Some(category)).unwrap_or_default();
        let Some(category) = HazardCategory::from_label(&label) else {
            warn!("{OBSERVATION_SHEET} row {ordinal}: unknown hazard category `{label}`, skipped");
            continue;
        };

        let mut obs = Observation::new(
            ordinal,
            substance_id,
            category,
            DerivationMethod::parse(&field(row, Some(method)).unwrap_or_default()),
            field(row, Some(source)).unwrap_or_default().trim(),
            field(row, Some(result)).unwrap_or_default(),
        );
        obs.endpoint = field(row, endpoint);
        obs.endpoint_standardized = field(row, endpoint_std);
        obs.species = field(row, species);
        obs.species_standardized = field(row, species_std);
        obs.duration_standardized = field(row, duration_std);
        obs.guideline = field(row, guideline);
        obs.unit = field(row, unit);
        obs.domain_status = field(row, domain);
        obs.model_name = field(row, model);
        observations.push(obs);
    }
    Ok(observations)
}

/// Text of a cell as the report shows it; `None` for empty and error cells.
pub fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(number_text(*v)),
        Data::Bool(v) => Some(if *v { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(v) => Some(number_text(v.as_f64())),
    }
}

fn number_text(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_like_the_sheet() {
        assert_eq!(cell_text(&Data::Float(500.0)).as_deref(), Some("500"));
        assert_eq!(cell_text(&Data::Float(0.25)).as_deref(), Some("0.25"));
        assert_eq!(cell_text(&Data::Float(-3.0)).as_deref(), Some("-3"));
        assert_eq!(cell_text(&Data::Int(12)).as_deref(), Some("12"));
        assert_eq!(cell_text(&Data::Bool(true)).as_deref(), Some("TRUE"));
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(String::new())), None);
    }
}
