//! Filling a report worksheet from a dataset: one block per substance, one cell per
//! (category, source column).

use log::{debug, info};
use serde::Serialize;
use toxsheet_model::{Dataset, HazardCategory, Observation, Substance, Worksheet};

use crate::error::ExtractError;
use crate::filter::{filter, qualitative_only};
use crate::format::format_value;
use crate::layout::{BlockLayout, ReportLayout, SlotLayout};
use crate::resolve::{resolve, Policy, ResolveContext};

/// Counts reported after an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub substance_ids: Vec<String>,
    pub cells_written: usize,
    /// Grid cells left untouched because no record qualified.
    pub cells_blank: usize,
}

/// Trim identifiers and reject empty or repeated ones.
pub fn validate_identifiers(ids: &[&str]) -> Result<Vec<String>, ExtractError> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() {
            return Err(ExtractError::EmptyIdentifier);
        }
        if out.iter().any(|seen| seen == id) {
            return Err(ExtractError::DuplicateIdentifier { id: id.to_string() });
        }
        out.push(id.to_string());
    }
    Ok(out)
}

/// Fill a single-substance report.
pub fn extract_single(
    dataset: &Dataset,
    id: &str,
    layout: &ReportLayout,
    sheet: &mut Worksheet,
) -> Result<ExtractionSummary, ExtractError> {
    extract(dataset, &[id], layout, sheet)
}

/// Fill a two-substance comparison report.
pub fn extract_paired(
    dataset: &Dataset,
    ids: [&str; 2],
    layout: &ReportLayout,
    sheet: &mut Worksheet,
) -> Result<ExtractionSummary, ExtractError> {
    extract(dataset, &ids, layout, sheet)
}

/// Fill `sheet` with one block per identifier.
///
/// Every identifier is resolved before the first write, so a missing substance
/// leaves the sheet unchanged.
pub fn extract(
    dataset: &Dataset,
    ids: &[&str],
    layout: &ReportLayout,
    sheet: &mut Worksheet,
) -> Result<ExtractionSummary, ExtractError> {
    layout.validate()?;
    let ids = validate_identifiers(ids)?;
    if ids.len() != layout.blocks.len() {
        return Err(ExtractError::BlockCountMismatch {
            blocks: layout.blocks.len(),
            ids: ids.len(),
        });
    }

    let substances = ids
        .iter()
        .map(|id| {
            dataset
                .substance(id)
                .ok_or_else(|| ExtractError::SubstanceNotFound { id: id.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if layout.clear_before_fill {
        for block in &layout.blocks {
            for cell in layout.block_cells(block) {
                sheet.clear(cell);
            }
        }
    }
    if let Some(separator) = &layout.title_separator {
        sheet.set_name(ids.join(separator));
    }

    let mut summary = ExtractionSummary {
        substance_ids: ids,
        ..ExtractionSummary::default()
    };
    for (substance, block) in substances.into_iter().zip(&layout.blocks) {
        fill_block(dataset, substance, block, layout, sheet, &mut summary);
    }

    info!(
        "extracted {}: {} cells written, {} blank",
        summary.substance_ids.join(", "),
        summary.cells_written,
        summary.cells_blank
    );
    Ok(summary)
}

fn fill_block(
    dataset: &Dataset,
    substance: &Substance,
    block: &BlockLayout,
    layout: &ReportLayout,
    sheet: &mut Worksheet,
    summary: &mut ExtractionSummary,
) {
    for field in &block.info {
        sheet.write(field.cell, field.field.value(substance, layout.weight_unit.as_deref()));
    }

    for category in HazardCategory::ALL {
        // Species of the experimental winner picked so far in this row.
        let mut experimental_species: Option<String> = None;
        for slot in &layout.slots {
            let ctx = ResolveContext {
                experimental_species: experimental_species.as_deref(),
            };
            let cell = block.cell(category, slot.column);
            let Some(best) = select(&dataset.observations, &substance.id, category, slot, &ctx) else {
                summary.cells_blank += 1;
                continue;
            };

            let text = format_value(best, category, &best.method);
            debug!(
                "{} {} [{}] <- row {}: {text}",
                substance.id,
                category,
                slot.label,
                best.ordinal
            );
            let anchor = sheet.write(cell, text);
            if anchor != cell {
                debug!("{} is merged; wrote to {}", cell.to_a1(), anchor.to_a1());
            }
            summary.cells_written += 1;

            if category == HazardCategory::ChromosomeAberration && slot.policy == Policy::Experimental {
                experimental_species = best.species_standardized.clone();
            }
        }
    }
}

/// The record one slot reports for (`substance_id`, `category`), if any.
pub fn select<'a>(
    observations: &'a [Observation],
    substance_id: &str,
    category: HazardCategory,
    slot: &SlotLayout,
    ctx: &ResolveContext<'_>,
) -> Option<&'a Observation> {
    let mut candidates = filter(observations, substance_id, category, &slot.selector);
    let mut policy = slot.policy;
    if category == HazardCategory::SkinCorrosion && slot.qualitative_skin {
        candidates = qualitative_only(candidates);
        policy = Policy::Qualitative;
    }
    resolve(&candidates, category, policy, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identifiers_are_trimmed_and_checked() {
        assert_eq!(validate_identifiers(&[" B-1 "]).unwrap(), vec!["B-1".to_string()]);
        assert!(matches!(
            validate_identifiers(&["  "]),
            Err(ExtractError::EmptyIdentifier)
        ));
        assert!(matches!(
            validate_identifiers(&["B-1", "B-1 "]),
            Err(ExtractError::DuplicateIdentifier { id }) if id == "B-1"
        ));
    }

    #[test]
    fn block_count_must_match() {
        let dataset = Dataset::default();
        let mut sheet = Worksheet::new("s");
        let err = extract(&dataset, &["B-1", "B-2"], &ReportLayout::single(), &mut sheet).unwrap_err();
        assert!(matches!(err, ExtractError::BlockCountMismatch { blocks: 1, ids: 2 }));
    }
}
