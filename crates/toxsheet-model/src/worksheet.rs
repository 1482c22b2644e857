use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellRef, Range};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("merge range {requested} overlaps existing merged region {existing}")]
    Overlap { existing: Range, requested: Range },
    #[error("merge range {0} covers a single cell")]
    SingleCell(Range),
}

/// The cell-addressed output document a report is written into.
///
/// Values are stored sparsely. Merged regions follow spreadsheet semantics: only
/// the anchor (top-left) cell of a region holds a value, and any write addressed
/// to a non-anchor cell of the region lands on the anchor instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, String>,
    merged: Vec<Range>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Register a merged region. Values already stored in non-anchor cells of the
    /// region are dropped, matching what spreadsheet applications do on merge.
    pub fn merge_range(&mut self, range: Range) -> Result<(), MergeError> {
        if range.is_single_cell() {
            return Err(MergeError::SingleCell(range));
        }
        if let Some(existing) = self.merged.iter().find(|m| m.intersects(&range)) {
            return Err(MergeError::Overlap {
                existing: *existing,
                requested: range,
            });
        }
        self.cells
            .retain(|cell, _| !range.contains(*cell) || *cell == range.start);
        self.merged.push(range);
        Ok(())
    }

    pub fn merged_regions(&self) -> &[Range] {
        &self.merged
    }

    pub fn merged_region_at(&self, cell: CellRef) -> Option<Range> {
        self.merged.iter().copied().find(|m| m.contains(cell))
    }

    /// The cell a write addressed to `cell` actually lands on.
    pub fn anchor_of(&self, cell: CellRef) -> CellRef {
        self.merged_region_at(cell).map_or(cell, |m| m.start)
    }

    /// Write `value` at `cell`, redirected to the merge anchor when `cell` is inside
    /// a merged region. Returns the cell that was written.
    pub fn write(&mut self, cell: CellRef, value: impl Into<String>) -> CellRef {
        let target = self.anchor_of(cell);
        self.cells.insert(target, value.into());
        target
    }

    /// Remove the value at `cell` (anchor-resolved like [`Worksheet::write`]).
    pub fn clear(&mut self, cell: CellRef) {
        let target = self.anchor_of(cell);
        self.cells.remove(&target);
    }

    /// The value physically stored at `cell`. Non-anchor cells of a merged region
    /// are always unset.
    pub fn value(&self, cell: CellRef) -> Option<&str> {
        self.cells.get(&cell).map(String::as_str)
    }

    /// The value a reader sees at `cell`: the anchor's value for merged cells.
    pub fn displayed_value(&self, cell: CellRef) -> Option<&str> {
        self.value(self.anchor_of(cell))
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (CellRef, &str)> {
        self.cells.iter().map(|(cell, value)| (*cell, value.as_str()))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_only_the_anchor_value() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.write(CellRef::from_a1("B2").unwrap(), "keep");
        sheet.write(CellRef::from_a1("C2").unwrap(), "drop");
        sheet.merge_range(Range::from_a1("B2:C3").unwrap()).unwrap();

        assert_eq!(sheet.cell_count(), 1);
        assert_eq!(sheet.value(CellRef::from_a1("B2").unwrap()), Some("keep"));
        assert_eq!(
            sheet.displayed_value(CellRef::from_a1("C3").unwrap()),
            Some("keep")
        );
    }

    #[test]
    fn overlapping_merges_are_rejected() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.merge_range(Range::from_a1("B2:C3").unwrap()).unwrap();
        let err = sheet
            .merge_range(Range::from_a1("C3:D4").unwrap())
            .unwrap_err();
        assert!(matches!(err, MergeError::Overlap { .. }));
        assert!(sheet.merge_range(Range::from_a1("E5").unwrap()).is_err());
    }

    #[test]
    fn clear_resolves_to_anchor() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.merge_range(Range::from_a1("A1:A2").unwrap()).unwrap();
        sheet.write(CellRef::from_a1("A2").unwrap(), "x");
        sheet.clear(CellRef::from_a1("A2").unwrap());
        assert_eq!(sheet.cell_count(), 0);
    }
}
