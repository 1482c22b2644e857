//! Report template layouts: where each value of an extraction is written, and
//! which candidate selector and policy feed each source column.
//!
//! Layouts are plain immutable values. The two built-in shapes match the single and
//! paired report templates; either can be round-tripped through JSON to move cells
//! without touching code.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toxsheet_model::{CellRef, Column, DerivationMethod, HazardCategory, Range, Source, Substance, Worksheet};

use crate::filter::CandidateSelector;
use crate::resolve::Policy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout defines no source columns")]
    NoSlots,
    #[error("{kind:?} layout needs {expected} block(s), found {found}")]
    BlockCount {
        kind: LayoutKind,
        expected: usize,
        found: usize,
    },
    #[error("source column {0} is assigned to more than one slot")]
    DuplicateColumn(Column),
    #[error("category row numbers are 1-based, got 0")]
    ZeroRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Single,
    Paired,
}

impl LayoutKind {
    pub const fn block_count(self) -> usize {
        match self {
            LayoutKind::Single => 1,
            LayoutKind::Paired => 2,
        }
    }
}

/// Descriptive substance fields written to each block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    Identifier,
    Cas,
    Name,
    Formula,
    MolecularWeight,
}

impl InfoField {
    pub const ALL: [InfoField; 5] = [
        InfoField::Identifier,
        InfoField::Cas,
        InfoField::Name,
        InfoField::Formula,
        InfoField::MolecularWeight,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InfoField::Identifier => "내부식별자",
            InfoField::Cas => "CAS No.",
            InfoField::Name => "물질명",
            InfoField::Formula => "분자식",
            InfoField::MolecularWeight => "분자량",
        }
    }

    /// Cell text for this field. `weight_unit` is appended to the molecular weight
    /// unless the stored value already ends with it.
    pub fn value(self, substance: &Substance, weight_unit: Option<&str>) -> String {
        match self {
            InfoField::Identifier => substance.id.clone(),
            InfoField::Cas => substance.cas.clone(),
            InfoField::Name => substance.name.clone(),
            InfoField::Formula => substance.formula.clone(),
            InfoField::MolecularWeight => {
                let weight = substance.molecular_weight.trim();
                match weight_unit {
                    Some(unit) if !weight.to_lowercase().ends_with(&unit.to_lowercase()) => {
                        format!("{weight} {unit}")
                    }
                    _ => weight.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoCell {
    pub field: InfoField,
    pub cell: CellRef,
    /// Where a synthesized blank template puts the field's caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_cell: Option<CellRef>,
}

/// One substance's area of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub info: Vec<InfoCell>,
    /// 1-based row of the first category; the others follow in report order.
    pub first_category_row: u32,
    pub category_label_column: Column,
    /// 1-based row carrying the source column captions.
    pub source_header_row: u32,
}

impl BlockLayout {
    pub fn category_row(&self, category: HazardCategory) -> u32 {
        let index = HazardCategory::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or_default() as u32;
        self.first_category_row + index
    }

    /// Cell holding the value of `category` from the source in `column`.
    pub fn cell(&self, category: HazardCategory, column: Column) -> CellRef {
        CellRef::at(self.category_row(category), column)
    }
}

/// One source column of the category × source grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub label: String,
    pub column: Column,
    pub selector: CandidateSelector,
    pub policy: Policy,
    /// Restrict skin corrosion/irritation candidates to positive/negative results and
    /// prefer rabbit studies among them.
    #[serde(default)]
    pub qualitative_skin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub font_name: String,
    pub font_size: f64,
    /// Ranges that get thin borders, centered wrapped text, and the report font.
    pub styled_ranges: Vec<Range>,
    #[serde(default)]
    pub column_widths: BTreeMap<Column, f64>,
    /// Height (points) of every category row.
    #[serde(default)]
    pub category_row_height: Option<f64>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: "맑은 고딕".to_string(),
            font_size: 9.0,
            styled_ranges: Vec::new(),
            column_widths: BTreeMap::new(),
            category_row_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub kind: LayoutKind,
    pub blocks: Vec<BlockLayout>,
    pub slots: Vec<SlotLayout>,
    /// Blank every info and grid cell of every block before filling, so a template
    /// can be filled repeatedly.
    #[serde(default)]
    pub clear_before_fill: bool,
    #[serde(default)]
    pub weight_unit: Option<String>,
    /// When set, the sheet is renamed to the identifiers joined with this separator.
    #[serde(default)]
    pub title_separator: Option<String>,
    #[serde(default)]
    pub style: StyleConfig,
}

fn col(letters: &str) -> Column {
    // Built-in layouts only use literal letters.
    Column::from_letters(letters).unwrap_or(Column::new(0))
}

fn row_cell(row_1_based: u32, letters: &str) -> CellRef {
    CellRef::at(row_1_based, col(letters))
}

fn slot(
    label: &str,
    column: &str,
    selector: CandidateSelector,
    policy: Policy,
    qualitative_skin: bool,
) -> SlotLayout {
    SlotLayout {
        label: label.to_string(),
        column: col(column),
        selector,
        policy,
        qualitative_skin,
    }
}

const EXPERIMENTAL_SOURCES: [Source; 5] = [
    Source::EchaChem,
    Source::UsDashboard,
    Source::Pubchem,
    Source::KReach,
    Source::NationalReview,
];

impl ReportLayout {
    /// Single-substance template: header band C7:G7, categories on rows 12-21,
    /// sources in columns D-Q.
    pub fn single() -> Self {
        let header_row = 7;
        let info = InfoField::ALL
            .into_iter()
            .zip(["C", "D", "E", "F", "G"])
            .map(|(field, letters)| InfoCell {
                field,
                cell: row_cell(header_row, letters),
                label_cell: Some(row_cell(header_row - 1, letters)),
            })
            .collect();

        let mut slots: Vec<SlotLayout> = EXPERIMENTAL_SOURCES
            .into_iter()
            .zip(["D", "E", "F", "G", "H"])
            .map(|(source, letters)| {
                slot(
                    source.label(),
                    letters,
                    CandidateSelector::exact(DerivationMethod::Experimental, source),
                    Policy::Experimental,
                    true,
                )
            })
            .collect();
        slots.extend([
            slot("QSAR Toolbox (Read-across)", "I", CandidateSelector::ToolboxReadAcross, Policy::First, false),
            slot("QSAR Toolbox (QSAR)", "J", CandidateSelector::ToolboxModel, Policy::ReferenceModel, false),
            slot(
                "Danish QSAR",
                "K",
                CandidateSelector::exact(DerivationMethod::Qsar, Source::DanishQsar),
                Policy::ReferenceModel,
                false,
            ),
            slot(
                "VEGA (QSAR)",
                "L",
                CandidateSelector::exact(DerivationMethod::Qsar, Source::Vega),
                Policy::Reliability,
                false,
            ),
            slot(
                "Epi suite",
                "M",
                CandidateSelector::exact(DerivationMethod::Qsar, Source::EpiSuite),
                Policy::First,
                false,
            ),
            slot(
                "HAZMAP",
                "N",
                CandidateSelector::exact(DerivationMethod::AiQsar, Source::Hazmap),
                Policy::First,
                false,
            ),
            slot(
                "Protox 3.0",
                "O",
                CandidateSelector::exact(DerivationMethod::AiQsar, Source::Protox),
                Policy::First,
                false,
            ),
            slot(
                "VEGA (AI-based QSAR)",
                "P",
                CandidateSelector::exact(DerivationMethod::AiQsar, Source::Vega),
                Policy::Reliability,
                false,
            ),
            slot(
                "Cheminfomatics",
                "Q",
                CandidateSelector::exact(DerivationMethod::AiQsar, Source::Cheminformatics),
                Policy::Consensus,
                false,
            ),
        ]);

        let column_widths = [
            ("B", 12.0),
            ("C", 15.0),
            ("D", 22.0),
            ("E", 25.0),
            ("F", 12.0),
            ("G", 12.0),
            ("H", 22.0),
            ("I", 18.0),
            ("J", 20.0),
            ("K", 20.0),
            ("L", 20.0),
            ("M", 20.0),
            ("N", 15.0),
            ("O", 15.0),
            ("P", 15.0),
            ("Q", 15.0),
        ]
        .into_iter()
        .map(|(letters, width)| (col(letters), width))
        .collect();

        Self {
            kind: LayoutKind::Single,
            blocks: vec![BlockLayout {
                info,
                first_category_row: 12,
                category_label_column: col("B"),
                source_header_row: 11,
            }],
            slots,
            clear_before_fill: false,
            weight_unit: None,
            title_separator: None,
            style: StyleConfig {
                styled_ranges: vec![
                    Range::new(row_cell(7, "C"), row_cell(7, "G")),
                    Range::new(row_cell(11, "B"), row_cell(21, "Q")),
                ],
                column_widths,
                category_row_height: Some(45.0),
                ..StyleConfig::default()
            },
        }
    }

    /// Paired template: two stacked blocks headed at rows 2 and 15, substance info in
    /// column B, categories at header offsets +2..+11, sources in columns F-S.
    pub fn paired() -> Self {
        Self::paired_with_headers([2, 15])
    }

    pub fn paired_with_headers(header_rows: [u32; 2]) -> Self {
        let blocks = header_rows
            .into_iter()
            .map(|header| BlockLayout {
                info: InfoField::ALL
                    .into_iter()
                    .zip([1, 3, 5, 7, 9])
                    .map(|(field, offset)| InfoCell {
                        field,
                        cell: row_cell(header + offset, "B"),
                        label_cell: Some(row_cell(header + offset, "A")),
                    })
                    .collect(),
                first_category_row: header + 2,
                category_label_column: col("E"),
                source_header_row: header + 1,
            })
            .collect::<Vec<_>>();

        let family = |label: &str, letters: &str, source: Source, qualitative_skin: bool| {
            slot(label, letters, CandidateSelector::family(source), Policy::Scored, qualitative_skin)
        };

        let mut slots: Vec<SlotLayout> = EXPERIMENTAL_SOURCES
            .into_iter()
            .zip(["F", "G", "H", "I", "J"])
            .map(|(source, letters)| family(source.label(), letters, source, true))
            .collect();
        slots.extend([
            slot("QSAR Toolbox (Read-across)", "K", CandidateSelector::ToolboxReadAcross, Policy::Scored, false),
            slot("QSAR Toolbox (QSAR)", "L", CandidateSelector::ToolboxModel, Policy::Scored, false),
            family("Danish QSAR", "M", Source::DanishQsar, false),
            slot(
                "VEGA (QSAR)",
                "N",
                CandidateSelector::exact(DerivationMethod::Qsar, Source::Vega),
                Policy::Reliability,
                false,
            ),
            family("Epi suite", "O", Source::EpiSuite, true),
            family("HAZMAP", "P", Source::Hazmap, true),
            family("Protox 3.0", "Q", Source::Protox, true),
            slot(
                "VEGA (AI-based QSAR)",
                "R",
                CandidateSelector::exact(DerivationMethod::AiQsar, Source::Vega),
                Policy::Reliability,
                false,
            ),
            slot(
                "Cheminfomatics",
                "S",
                CandidateSelector::family(Source::Cheminformatics),
                Policy::Consensus,
                true,
            ),
        ]);

        let styled_ranges = blocks
            .iter()
            .map(|b| {
                let first = b.first_category_row;
                let last = first + HazardCategory::ALL.len() as u32 - 1;
                Range::new(row_cell(first, "F"), row_cell(last, "S"))
            })
            .collect();

        Self {
            kind: LayoutKind::Paired,
            blocks,
            slots,
            clear_before_fill: true,
            weight_unit: Some("g/mol".to_string()),
            title_separator: Some(" 및 ".to_string()),
            style: StyleConfig {
                styled_ranges,
                ..StyleConfig::default()
            },
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.slots.is_empty() {
            return Err(LayoutError::NoSlots);
        }
        let expected = self.kind.block_count();
        if self.blocks.len() != expected {
            return Err(LayoutError::BlockCount {
                kind: self.kind,
                expected,
                found: self.blocks.len(),
            });
        }
        if self
            .blocks
            .iter()
            .any(|b| b.first_category_row == 0 || b.source_header_row == 0)
        {
            return Err(LayoutError::ZeroRow);
        }
        let mut seen = BTreeSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.column) {
                return Err(LayoutError::DuplicateColumn(slot.column));
            }
        }
        Ok(())
    }

    /// Every cell an extraction may write in `block`: info cells, then the
    /// category × source grid.
    pub fn block_cells<'a>(&'a self, block: &'a BlockLayout) -> impl Iterator<Item = CellRef> + 'a {
        let info = block.info.iter().map(|i| i.cell);
        let grid = HazardCategory::ALL.into_iter().flat_map(move |category| {
            self.slots.iter().map(move |slot| block.cell(category, slot.column))
        });
        info.chain(grid)
    }

    /// A template containing only captions, for runs without a template file.
    pub fn blank_template(&self) -> Worksheet {
        let mut sheet = Worksheet::new("추출결과");
        for block in &self.blocks {
            for info in &block.info {
                if let Some(label_cell) = info.label_cell {
                    sheet.write(label_cell, info.field.label());
                }
            }
            sheet.write(
                CellRef::at(block.source_header_row, block.category_label_column),
                "유해성항목",
            );
            for slot in &self.slots {
                sheet.write(CellRef::at(block.source_header_row, slot.column), slot.label.as_str());
            }
            for category in HazardCategory::ALL {
                sheet.write(
                    CellRef::at(block.category_row(category), block.category_label_column),
                    category.label(),
                );
            }
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_layouts_are_valid() {
        ReportLayout::single().validate().unwrap();
        ReportLayout::paired().validate().unwrap();
        assert_eq!(ReportLayout::single().slots.len(), 14);
        assert_eq!(ReportLayout::paired().slots.len(), 14);
    }

    #[test]
    fn single_grid_coordinates() {
        let layout = ReportLayout::single();
        let block = &layout.blocks[0];
        assert_eq!(block.cell(HazardCategory::AcuteOral, col("D")).to_a1(), "D12");
        assert_eq!(block.cell(HazardCategory::Biodegradability, col("Q")).to_a1(), "Q21");
        assert_eq!(block.info[0].cell.to_a1(), "C7");
        assert_eq!(block.info[4].cell.to_a1(), "G7");
    }

    #[test]
    fn paired_blocks_are_offset_by_header_row() {
        let layout = ReportLayout::paired();
        let first = &layout.blocks[0];
        let second = &layout.blocks[1];
        assert_eq!(first.info[0].cell.to_a1(), "B3");
        assert_eq!(first.info[4].cell.to_a1(), "B11");
        assert_eq!(first.cell(HazardCategory::AcuteOral, col("F")).to_a1(), "F4");
        assert_eq!(second.info[0].cell.to_a1(), "B16");
        assert_eq!(second.cell(HazardCategory::Biodegradability, col("S")).to_a1(), "S26");
        assert_eq!(layout.block_cells(first).count(), 5 + 10 * 14);
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let mut layout = ReportLayout::single();
        layout.slots[1].column = layout.slots[0].column;
        assert_eq!(layout.validate(), Err(LayoutError::DuplicateColumn(col("D"))));
    }

    #[test]
    fn molecular_weight_unit_is_not_doubled() {
        let mut substance = Substance {
            id: "B-1".into(),
            cas: "000-00-0".into(),
            name: "TestChem".into(),
            formula: "C6H6".into(),
            molecular_weight: "78.11".into(),
        };
        assert_eq!(InfoField::MolecularWeight.value(&substance, Some("g/mol")), "78.11 g/mol");
        substance.molecular_weight = "78.11 g/mol".into();
        assert_eq!(InfoField::MolecularWeight.value(&substance, Some("g/mol")), "78.11 g/mol");
        assert_eq!(InfoField::MolecularWeight.value(&substance, None), "78.11 g/mol");
    }

    #[test]
    fn layout_json_roundtrip() {
        let layout = ReportLayout::paired();
        let json = serde_json::to_string(&layout).unwrap();
        assert!(json.contains("\"column\":\"F\""));
        let back: ReportLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
