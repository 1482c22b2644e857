//! Candidate filtering: narrowing the observation set to the rows one report cell
//! can be filled from.

use serde::{Deserialize, Serialize};
use toxsheet_model::{DerivationMethod, HazardCategory, Observation, Source};

/// Which observations of a (substance, category) pair feed a report cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSelector {
    /// Exact derivation method and exact source label.
    Exact {
        method: DerivationMethod,
        source: Source,
    },
    /// Any method; source label contains the source's family token (case-insensitive).
    Family { source: Source },
    /// QSAR Toolbox family rows derived by read-across.
    ToolboxReadAcross,
    /// QSAR Toolbox family rows derived any other way (its model output).
    ToolboxModel,
}

impl CandidateSelector {
    pub const fn exact(method: DerivationMethod, source: Source) -> Self {
        CandidateSelector::Exact { method, source }
    }

    pub const fn family(source: Source) -> Self {
        CandidateSelector::Family { source }
    }

    /// The source this selector draws from.
    pub fn source(&self) -> Source {
        match self {
            CandidateSelector::Exact { source, .. } | CandidateSelector::Family { source } => {
                *source
            }
            CandidateSelector::ToolboxReadAcross | CandidateSelector::ToolboxModel => {
                Source::QsarToolbox
            }
        }
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        match self {
            CandidateSelector::Exact { method, source } => {
                obs.method == *method && source.is(&obs.source)
            }
            CandidateSelector::Family { source } => source.matches_family(&obs.source),
            CandidateSelector::ToolboxReadAcross => {
                Source::QsarToolbox.matches_family(&obs.source)
                    && obs.method == DerivationMethod::ReadAcross
            }
            CandidateSelector::ToolboxModel => {
                Source::QsarToolbox.matches_family(&obs.source)
                    && obs.method != DerivationMethod::ReadAcross
            }
        }
    }
}

/// Observations of `substance_id` in `category` accepted by `selector`, in source order.
///
/// Biodegradability rows without an endpoint are dropped unless the source reports a
/// qualitative classification itself (see [`Source::reports_biodegradability_class`]).
pub fn filter<'a>(
    observations: &'a [Observation],
    substance_id: &str,
    category: HazardCategory,
    selector: &CandidateSelector,
) -> Vec<&'a Observation> {
    let require_endpoint = category == HazardCategory::Biodegradability
        && !selector.source().reports_biodegradability_class();

    observations
        .iter()
        .filter(|o| o.substance_id == substance_id && o.category == category)
        .filter(|o| selector.matches(o))
        .filter(|o| !require_endpoint || o.has_endpoint())
        .collect()
}

/// Keep only rows whose result is the literal token `positive` or `negative`
/// (case-insensitive). Used for skin corrosion/irritation cells.
pub fn qualitative_only<'a>(candidates: Vec<&'a Observation>) -> Vec<&'a Observation> {
    candidates
        .into_iter()
        .filter(|o| {
            let token = o.result.trim();
            token.eq_ignore_ascii_case("positive") || token.eq_ignore_ascii_case("negative")
        })
        .collect()
}
