//! Priority resolution: picking the single reported record out of the candidates
//! for one report cell.
//!
//! Every policy reduces to the same shape. Each candidate gets a vector of
//! preference values compared lexicographically (higher is preferred), then an
//! optional numeric tie-break on `result`, then the record's source ordinal. The
//! ordinal makes the order total, so the winner never depends on slice order.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use toxsheet_model::{HazardCategory, Observation};

/// Selection policy of a report cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Per-category preference table for experimental values.
    Experimental,
    /// Endpoint/species token scoring (paired reports).
    Scored,
    /// Prefer the category's reference QSAR model.
    ReferenceModel,
    /// VEGA reliability label, then embedded confidence score.
    Reliability,
    /// Prefer consensus model output.
    Consensus,
    /// Skin corrosion/irritation: prefer rabbit studies among qualitative results.
    Qualitative,
    /// Lowest source ordinal.
    First,
}

/// Extra inputs some policies depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    /// Species of the experimental chromosome-aberration record chosen for the same
    /// substance; selects between the CHO and CHL reference models.
    pub experimental_species: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultOrder {
    Ascending,
    Descending,
    Unranked,
}

#[derive(Debug, Clone, Copy)]
enum Feature {
    EndpointIs(&'static str),
    SpeciesIn(&'static [&'static str]),
    DurationIs(&'static str),
    GuidelineContains(&'static str),
}

impl Feature {
    fn holds(self, obs: &Observation) -> bool {
        match self {
            Feature::EndpointIs(endpoint) => obs.endpoint_standardized.as_deref() == Some(endpoint),
            Feature::SpeciesIn(species) => obs
                .species_standardized
                .as_deref()
                .is_some_and(|s| species.contains(&s)),
            Feature::DurationIs(duration) => {
                obs.duration_standardized.as_deref() == Some(duration)
            }
            Feature::GuidelineContains(token) => {
                obs.guideline.as_deref().is_some_and(|g| g.contains(token))
            }
        }
    }
}

struct RankingTable {
    keys: &'static [Feature],
    result_order: ResultOrder,
}

const ACUTE_ORAL: RankingTable = RankingTable {
    keys: &[
        Feature::EndpointIs("LD50"),
        Feature::SpeciesIn(&["Rat"]),
        Feature::GuidelineContains("401"),
    ],
    result_order: ResultOrder::Ascending,
};

// Inhalation and the aquatic tables break ties on the higher reported value.
const ACUTE_INHALATION: RankingTable = RankingTable {
    keys: &[
        Feature::EndpointIs("LC50"),
        Feature::SpeciesIn(&["Rat"]),
        Feature::DurationIs("4 h"),
        Feature::GuidelineContains("403"),
    ],
    result_order: ResultOrder::Descending,
};

const FISH_ACUTE: RankingTable = RankingTable {
    keys: &[
        Feature::EndpointIs("LC50"),
        Feature::SpeciesIn(&["Fathead minnow", "Zebrafish", "Rainbow trout"]),
        Feature::DurationIs("96 h"),
        Feature::GuidelineContains("203"),
    ],
    result_order: ResultOrder::Descending,
};

const DAPHNIA_ACUTE: RankingTable = RankingTable {
    keys: &[
        Feature::EndpointIs("EC50"),
        Feature::SpeciesIn(&["Daphnia magna"]),
        Feature::DurationIs("48 h"),
        Feature::GuidelineContains("202"),
    ],
    result_order: ResultOrder::Descending,
};

const ALGAL_GROWTH: RankingTable = RankingTable {
    keys: &[
        Feature::EndpointIs("EC50"),
        Feature::SpeciesIn(&["P. subcapitata", "D. subspicatus"]),
        Feature::DurationIs("72 h"),
        Feature::GuidelineContains("201"),
    ],
    result_order: ResultOrder::Descending,
};

fn experimental_table(category: HazardCategory) -> Option<&'static RankingTable> {
    match category {
        HazardCategory::AcuteOral => Some(&ACUTE_ORAL),
        HazardCategory::AcuteInhalation => Some(&ACUTE_INHALATION),
        HazardCategory::FishAcute => Some(&FISH_ACUTE),
        HazardCategory::DaphniaAcute => Some(&DAPHNIA_ACUTE),
        HazardCategory::AlgalGrowth => Some(&ALGAL_GROWTH),
        _ => None,
    }
}

/// Endpoint and species tokens the scored policy looks for.
fn score_targets(category: HazardCategory) -> Option<(&'static str, &'static str)> {
    match category {
        HazardCategory::AcuteOral => Some(("LD50", "Rat")),
        HazardCategory::AcuteInhalation => Some(("LC50", "Rat")),
        HazardCategory::FishAcute => Some(("LC50", "Fathead minnow")),
        HazardCategory::DaphniaAcute => Some(("EC50", "Daphnia magna")),
        HazardCategory::AlgalGrowth => Some(("EC50", "P. subcapitata")),
        _ => None,
    }
}

pub const CHO_MODEL: &str = "Chromosome Aberrations in Chinese Hamster Ovary (CHO) Cells - Danish QSAR DB battery model (v1.0)";
pub const CHL_MODEL: &str = "Chromosome Aberrations in Chinese Hamster Lung (CHL) Cells - Danish QSAR DB battery model (v1.0)";

/// Reference QSAR model whose prediction is reported for `category`.
pub fn reference_model(
    category: HazardCategory,
    experimental_species: Option<&str>,
) -> Option<&'static str> {
    let name = match category {
        HazardCategory::AcuteOral => {
            "Acute toxicity in Rat, Oral - Danish QSAR DB ACDLabs model (v1.0)"
        }
        HazardCategory::AlgalGrowth => {
            "Pseudokirchneriella subcapitata 72h EC50 - Danish QSAR DB battery model (v1.0)"
        }
        HazardCategory::DaphniaAcute => {
            "Daphnia magna 48h EC50 - Danish QSAR DB battery model (v1.0)"
        }
        HazardCategory::BacterialReverseMutation => {
            "Ames test in S. typhimurium (in vitro) - Danish QSAR DB battery model (v1.0)"
        }
        HazardCategory::Micronucleus => {
            "Micronucleus Test in Mouse Erythrocytes - Danish QSAR DB battery model (v1.0)"
        }
        HazardCategory::FishAcute => "Fathead minnow 96h LC50 - Danish QSAR DB battery model (v1.0)",
        HazardCategory::SkinCorrosion => "BfR skin irritation/corrosion (v1.0)",
        HazardCategory::ChromosomeAberration => {
            if experimental_species == Some("CHO Cells") {
                CHO_MODEL
            } else {
                CHL_MODEL
            }
        }
        HazardCategory::AcuteInhalation | HazardCategory::Biodegradability => return None,
    };
    Some(name)
}

/// VEGA reliability labels, most trusted first.
pub const RELIABILITY_ORDER: [&str; 4] = [
    "EXPERIMENTAL value",
    "GOOD reliability",
    "MODERATE reliability",
    "LOW reliability",
];

/// Rank of the first reliability label found in `domain_status` (4 for
/// EXPERIMENTAL down to 1 for LOW, 0 when none matches).
pub fn reliability_rank(domain_status: &str) -> u8 {
    let status = domain_status.to_lowercase();
    RELIABILITY_ORDER
        .iter()
        .position(|label| status.contains(&label.to_lowercase()))
        .map_or(0, |i| (RELIABILITY_ORDER.len() - i) as u8)
}

/// Parenthesized confidence score embedded in a VEGA domain status, e.g.
/// `GOOD reliability (0.87)`. Absent or malformed scores count as `0.0`.
pub fn confidence_score(domain_status: &str) -> f64 {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SCORE_RE.get_or_init(|| Regex::new(r"\(([0-9.]+)\)").expect("valid regex"));
    re.captures(domain_status)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn guideline_rank(guideline: Option<&str>) -> f64 {
    let g = guideline.unwrap_or("").trim().to_uppercase();
    if g.contains("OECD") {
        2.0
    } else if matches!(g.as_str(), "" | "-" | "NAN") {
        0.0
    } else {
        1.0
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Pick the winning record of `candidates` under `policy`.
///
/// Empty input yields `None`; a single candidate is returned as-is.
pub fn resolve<'a>(
    candidates: &[&'a Observation],
    category: HazardCategory,
    policy: Policy,
    ctx: &ResolveContext<'_>,
) -> Option<&'a Observation> {
    match candidates {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }

    match policy {
        Policy::Experimental => {
            if let Some(table) = experimental_table(category) {
                rank(candidates, table.result_order, |o| {
                    table.keys.iter().map(|k| flag(k.holds(o))).collect()
                })
            } else if category == HazardCategory::Biodegradability {
                by_guideline(candidates)
            } else {
                first(candidates)
            }
        }
        Policy::Scored => {
            if let Some((endpoint, species)) = score_targets(category) {
                rank(candidates, ResultOrder::Ascending, |o| {
                    let endpoint_hit = contains_ci(o.endpoint.as_deref(), endpoint)
                        || contains_ci(o.endpoint_standardized.as_deref(), endpoint);
                    let species_hit = contains_ci(o.species_standardized.as_deref(), species);
                    vec![10.0 * flag(endpoint_hit) + 5.0 * flag(species_hit)]
                })
            } else if category == HazardCategory::Biodegradability {
                by_guideline(candidates)
            } else {
                first(candidates)
            }
        }
        Policy::ReferenceModel => match reference_model(category, ctx.experimental_species) {
            Some(model) => rank(candidates, ResultOrder::Unranked, |o| {
                vec![flag(o.model_name.as_deref() == Some(model))]
            }),
            None => first(candidates),
        },
        Policy::Reliability => rank(candidates, ResultOrder::Unranked, |o| {
            let status = o.domain_status.as_deref().unwrap_or("");
            vec![f64::from(reliability_rank(status)), confidence_score(status)]
        }),
        Policy::Consensus => rank(candidates, ResultOrder::Unranked, |o| {
            vec![flag(contains_ci(o.model_name.as_deref(), "consensus"))]
        }),
        Policy::Qualitative => rank(candidates, ResultOrder::Unranked, |o| {
            vec![flag(contains_ci(o.species_standardized.as_deref(), "rabbit"))]
        }),
        Policy::First => first(candidates),
    }
}

fn by_guideline<'a>(candidates: &[&'a Observation]) -> Option<&'a Observation> {
    rank(candidates, ResultOrder::Descending, |o| {
        vec![guideline_rank(o.guideline.as_deref())]
    })
}

fn first<'a>(candidates: &[&'a Observation]) -> Option<&'a Observation> {
    rank(candidates, ResultOrder::Unranked, |_| Vec::new())
}

struct Ranked<'a> {
    obs: &'a Observation,
    prefs: Vec<f64>,
    value: Option<f64>,
}

fn rank<'a>(
    candidates: &[&'a Observation],
    order: ResultOrder,
    prefs: impl Fn(&Observation) -> Vec<f64>,
) -> Option<&'a Observation> {
    candidates
        .iter()
        .map(|&obs| Ranked {
            obs,
            prefs: prefs(obs),
            value: obs.result_value(),
        })
        .min_by(|a, b| compare(a, b, order))
        .map(|r| r.obs)
}

/// `Less` means `a` is preferred.
fn compare(a: &Ranked<'_>, b: &Ranked<'_>, order: ResultOrder) -> Ordering {
    for (x, y) in a.prefs.iter().zip(&b.prefs) {
        match y.total_cmp(x) {
            Ordering::Equal => {}
            decided => return decided,
        }
    }

    let by_value = match order {
        ResultOrder::Unranked => Ordering::Equal,
        ResultOrder::Ascending => numeric_first(a.value, b.value, |x, y| x.total_cmp(&y)),
        ResultOrder::Descending => numeric_first(a.value, b.value, |x, y| y.total_cmp(&x)),
    };

    by_value
        .then(a.obs.ordinal.cmp(&b.obs.ordinal))
        .then_with(|| a.obs.result.cmp(&b.obs.result))
}

/// Non-numeric results lose to any number regardless of direction.
fn numeric_first(
    a: Option<f64>,
    b: Option<f64>,
    cmp: impl Fn(f64, f64) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_labels_rank_in_order() {
        assert_eq!(reliability_rank("EXPERIMENTAL value (1)"), 4);
        assert_eq!(reliability_rank("good reliability (0.87)"), 3);
        assert_eq!(reliability_rank("MODERATE reliability"), 2);
        assert_eq!(reliability_rank("LOW reliability (0.9)"), 1);
        assert_eq!(reliability_rank("Out of domain"), 0);
    }

    #[test]
    fn confidence_score_parsing() {
        assert_eq!(confidence_score("GOOD reliability (0.87)"), 0.87);
        assert_eq!(confidence_score("GOOD reliability"), 0.0);
        assert_eq!(confidence_score("GOOD reliability (1.2.3)"), 0.0);
    }

    #[test]
    fn guideline_ranking_tiers() {
        assert_eq!(guideline_rank(Some("OECD 301F")), 2.0);
        assert_eq!(guideline_rank(Some("oecd 301 B")), 2.0);
        assert_eq!(guideline_rank(Some("EU Method C.4-E")), 1.0);
        assert_eq!(guideline_rank(Some(" - ")), 0.0);
        assert_eq!(guideline_rank(Some("nan")), 0.0);
        assert_eq!(guideline_rank(None), 0.0);
    }

    #[test]
    fn chromosome_reference_model_follows_experimental_species() {
        assert_eq!(
            reference_model(HazardCategory::ChromosomeAberration, Some("CHO Cells")),
            Some(CHO_MODEL)
        );
        assert_eq!(
            reference_model(HazardCategory::ChromosomeAberration, Some("CHL Cells")),
            Some(CHL_MODEL)
        );
        assert_eq!(
            reference_model(HazardCategory::ChromosomeAberration, None),
            Some(CHL_MODEL)
        );
        assert_eq!(reference_model(HazardCategory::AcuteInhalation, None), None);
    }
}
