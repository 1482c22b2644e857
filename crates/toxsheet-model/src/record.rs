use serde::{Deserialize, Serialize};

use crate::{DerivationMethod, HazardCategory};

/// Reference data for one chemical substance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substance {
    /// Internal identifier (e.g. `B-3`), unique within a dataset.
    pub id: String,
    pub cas: String,
    pub name: String,
    pub formula: String,
    /// Molecular weight as stored; may already carry a unit.
    pub molecular_weight: String,
}

/// One reported toxicology measurement or prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based row of the record in the source sheet. "First row" policies pick the
    /// lowest ordinal, so selection never depends on slice order.
    pub ordinal: u32,
    pub substance_id: String,
    pub category: HazardCategory,
    pub method: DerivationMethod,
    /// Raw source label as stored (exact match against [`crate::Source::label`] or
    /// family substring matching are both applied by callers).
    pub source: String,
    pub endpoint: Option<String>,
    pub endpoint_standardized: Option<String>,
    pub species: Option<String>,
    pub species_standardized: Option<String>,
    pub duration_standardized: Option<String>,
    pub guideline: Option<String>,
    pub result: String,
    pub unit: Option<String>,
    pub domain_status: Option<String>,
    pub model_name: Option<String>,
}

impl Observation {
    /// Bare record with only the required attributes populated.
    pub fn new(
        ordinal: u32,
        substance_id: impl Into<String>,
        category: HazardCategory,
        method: DerivationMethod,
        source: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            substance_id: substance_id.into(),
            category,
            method,
            source: source.into(),
            endpoint: None,
            endpoint_standardized: None,
            species: None,
            species_standardized: None,
            duration_standardized: None,
            guideline: None,
            result: result.into(),
            unit: None,
            domain_status: None,
            model_name: None,
        }
    }

    /// `result` as a number, or `None` for qualitative tokens and blanks.
    pub fn result_value(&self) -> Option<f64> {
        let value: f64 = self.result.trim().parse().ok()?;
        value.is_finite().then_some(value)
    }

    /// Standardized endpoint, falling back to the reported one.
    pub fn endpoint_name(&self) -> Option<&str> {
        non_blank(&self.endpoint_standardized).or_else(|| non_blank(&self.endpoint))
    }

    /// Standardized species, falling back to the reported one.
    pub fn species_name(&self) -> Option<&str> {
        non_blank(&self.species_standardized).or_else(|| non_blank(&self.species))
    }

    pub fn has_endpoint(&self) -> bool {
        non_blank(&self.endpoint).is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_result_parsing() {
        let mut obs = Observation::new(
            2,
            "B-1",
            HazardCategory::AcuteOral,
            DerivationMethod::Experimental,
            "ECHA CHEM",
            " 500 ",
        );
        assert_eq!(obs.result_value(), Some(500.0));
        obs.result = "negative".into();
        assert_eq!(obs.result_value(), None);
        obs.result = "NaN".into();
        assert_eq!(obs.result_value(), None);
    }

    #[test]
    fn standardized_fields_take_precedence() {
        let mut obs = Observation::new(
            2,
            "B-1",
            HazardCategory::FishAcute,
            DerivationMethod::Experimental,
            "ECHA CHEM",
            "1.2",
        );
        obs.species = Some("Pimephales promelas".into());
        assert_eq!(obs.species_name(), Some("Pimephales promelas"));
        obs.species_standardized = Some("Fathead minnow".into());
        assert_eq!(obs.species_name(), Some("Fathead minnow"));
        obs.endpoint_standardized = Some("  ".into());
        obs.endpoint = Some("LC50".into());
        assert_eq!(obs.endpoint_name(), Some("LC50"));
    }
}
