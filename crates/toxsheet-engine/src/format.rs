//! Rendering a selected record into report cell text.

use toxsheet_model::{DerivationMethod, HazardCategory, Observation, Source};

pub const OUT_OF_DOMAIN: &str = "Out of domain";
const OUT_OF_DOMAIN_SUFFIX: &str = " (Out of domain)";

pub const READILY_BIODEGRADABLE: &str = "positive(이분해성)";
pub const NOT_READILY_BIODEGRADABLE: &str = "negative(난분해성)";

/// Pass level for endpoints measured as dissolved organic carbon removal.
pub const DOC_THRESHOLD: f64 = 70.0;
/// Pass level for every other biodegradation endpoint (BOD, CO2 evolution, ...).
pub const DEFAULT_THRESHOLD: f64 = 60.0;

const UNKNOWN: &str = "Unknown";

/// Display text for `obs` in a `category` cell, where `method` is how the value
/// was derived. Never fails: missing optional fields render as placeholders.
pub fn format_value(obs: &Observation, category: HazardCategory, method: &DerivationMethod) -> String {
    if category == HazardCategory::Biodegradability {
        return format_biodegradability(obs, method);
    }

    let result = with_domain_suffix(obs, method);
    if !category.is_quantitative() {
        return result;
    }

    let endpoint = obs.endpoint_name().unwrap_or(UNKNOWN);
    let species = obs.species_name().unwrap_or(UNKNOWN);
    let unit = unit(obs);
    format!("{endpoint} = {result} {unit} ({species})")
}

/// Biodegradability cell text: sources that already classify are passed through;
/// numeric percentages are classified against the pass level of their endpoint.
pub fn format_biodegradability(obs: &Observation, method: &DerivationMethod) -> String {
    let passthrough = Source::NationalReview.is(&obs.source)
        || Source::KReach.is(&obs.source)
        || (*method == DerivationMethod::Qsar && Source::EpiSuite.is(&obs.source));
    if passthrough {
        return obs.result.clone();
    }

    let Some(value) = obs.result_value() else {
        return obs.result.clone();
    };

    let endpoint = obs
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .or_else(|| obs.endpoint_name())
        .unwrap_or(UNKNOWN);
    let status = if value >= biodegradability_threshold(endpoint) {
        READILY_BIODEGRADABLE
    } else {
        NOT_READILY_BIODEGRADABLE
    };
    let result = obs.result.trim();
    let unit = unit(obs);
    format!("{status} - {endpoint} = {result} {unit}")
}

/// 70 for DOC-based endpoints, 60 otherwise.
pub fn biodegradability_threshold(endpoint: &str) -> f64 {
    if endpoint.to_lowercase().contains("doc") {
        DOC_THRESHOLD
    } else {
        DEFAULT_THRESHOLD
    }
}

/// `result`, annotated when a model-derived value lies outside the model's
/// applicability domain. Never annotates twice.
pub fn with_domain_suffix(obs: &Observation, method: &DerivationMethod) -> String {
    let result = obs.result.trim();
    let out_of_domain = obs.domain_status.as_deref().map(str::trim) == Some(OUT_OF_DOMAIN);
    if method.is_model_based() && out_of_domain && !result.contains(OUT_OF_DOMAIN_SUFFIX.trim_start()) {
        format!("{result}{OUT_OF_DOMAIN_SUFFIX}")
    } else {
        result.to_string()
    }
}

/// The unit column, empty when absent. The surrounding spaces are kept either way.
fn unit(obs: &Observation) -> &str {
    obs.unit.as_deref().map(str::trim).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: HazardCategory, method: DerivationMethod, source: &str, result: &str) -> Observation {
        Observation::new(2, "B-1", category, method, source, result)
    }

    #[test]
    fn quantitative_template() {
        let mut obs = row(HazardCategory::AcuteOral, DerivationMethod::Experimental, "ECHA CHEM", "500");
        obs.endpoint_standardized = Some("LD50".into());
        obs.species_standardized = Some("Rat".into());
        obs.unit = Some("mg/kg".into());
        assert_eq!(
            format_value(&obs, HazardCategory::AcuteOral, &DerivationMethod::Experimental),
            "LD50 = 500 mg/kg (Rat)"
        );
    }

    #[test]
    fn quantitative_placeholders() {
        let obs = row(HazardCategory::FishAcute, DerivationMethod::Qsar, "VEGA", "3.1");
        assert_eq!(
            format_value(&obs, HazardCategory::FishAcute, &DerivationMethod::Qsar),
            "Unknown = 3.1  (Unknown)"
        );
    }

    #[test]
    fn missing_unit_keeps_template_spacing() {
        let mut fish = row(HazardCategory::FishAcute, DerivationMethod::Experimental, "ECHA CHEM", "1.5");
        fish.endpoint_standardized = Some("LC50".into());
        fish.species_standardized = Some("Zebrafish".into());
        fish.unit = Some("  ".into());
        assert_eq!(
            format_value(&fish, HazardCategory::FishAcute, &DerivationMethod::Experimental),
            "LC50 = 1.5  (Zebrafish)"
        );

        let mut biodeg = row(HazardCategory::Biodegradability, DerivationMethod::Experimental, "ECHA CHEM", "82");
        biodeg.endpoint = Some("CO2 evolution".into());
        assert_eq!(
            format_biodegradability(&biodeg, &DerivationMethod::Experimental),
            "positive(이분해성) - CO2 evolution = 82 "
        );
    }

    #[test]
    fn qualitative_categories_render_result_only() {
        let mut obs = row(HazardCategory::BacterialReverseMutation, DerivationMethod::Qsar, "Danish QSAR", "Negative");
        obs.domain_status = Some("Out of domain".into());
        assert_eq!(
            format_value(&obs, HazardCategory::BacterialReverseMutation, &DerivationMethod::Qsar),
            "Negative (Out of domain)"
        );
        assert_eq!(
            format_value(&obs, HazardCategory::BacterialReverseMutation, &DerivationMethod::Experimental),
            "Negative"
        );
    }

    #[test]
    fn domain_suffix_is_idempotent() {
        let mut obs = row(HazardCategory::Micronucleus, DerivationMethod::AiQsar, "Protox 3.0", "Active (Out of domain)");
        obs.domain_status = Some("Out of domain".into());
        assert_eq!(
            with_domain_suffix(&obs, &DerivationMethod::AiQsar),
            "Active (Out of domain)"
        );
    }

    #[test]
    fn domain_suffix_requires_exact_status() {
        let mut obs = row(HazardCategory::Micronucleus, DerivationMethod::Qsar, "VEGA", "Active");
        obs.domain_status = Some("LOW reliability (Out of domain?)".into());
        assert_eq!(with_domain_suffix(&obs, &DerivationMethod::Qsar), "Active");
    }

    #[test]
    fn biodegradability_thresholds() {
        let mut obs = row(HazardCategory::Biodegradability, DerivationMethod::Experimental, "ECHA CHEM", "70");
        obs.endpoint = Some("DOC removal".into());
        obs.unit = Some("%".into());
        assert_eq!(
            format_biodegradability(&obs, &DerivationMethod::Experimental),
            "positive(이분해성) - DOC removal = 70 %"
        );

        obs.result = "69.999".into();
        assert_eq!(
            format_biodegradability(&obs, &DerivationMethod::Experimental),
            "negative(난분해성) - DOC removal = 69.999 %"
        );

        obs.endpoint = Some("BOD".into());
        obs.result = "60".into();
        assert!(format_biodegradability(&obs, &DerivationMethod::Experimental).starts_with(READILY_BIODEGRADABLE));
        obs.result = "59.9".into();
        assert!(format_biodegradability(&obs, &DerivationMethod::Experimental).starts_with(NOT_READILY_BIODEGRADABLE));
    }

    #[test]
    fn biodegradability_passthrough() {
        let obs = row(HazardCategory::Biodegradability, DerivationMethod::Experimental, "K-reach", "난분해성");
        assert_eq!(format_biodegradability(&obs, &DerivationMethod::Experimental), "난분해성");

        let epi = row(HazardCategory::Biodegradability, DerivationMethod::Qsar, "Epi suite", "75");
        assert_eq!(format_biodegradability(&epi, &DerivationMethod::Qsar), "75");

        let unparsable = row(HazardCategory::Biodegradability, DerivationMethod::Experimental, "ECHA CHEM", "readily");
        assert_eq!(format_biodegradability(&unparsable, &DerivationMethod::Experimental), "readily");
    }
}
