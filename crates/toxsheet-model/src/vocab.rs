//! Closed vocabularies of the toxicology database: hazard categories, derivation
//! methods, and data sources. Labels are the exact strings stored in the database.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    AcuteOral,
    AcuteInhalation,
    SkinCorrosion,
    BacterialReverseMutation,
    ChromosomeAberration,
    Micronucleus,
    FishAcute,
    DaphniaAcute,
    AlgalGrowth,
    Biodegradability,
}

impl HazardCategory {
    /// Report order: the row order of every template.
    pub const ALL: [HazardCategory; 10] = [
        HazardCategory::AcuteOral,
        HazardCategory::AcuteInhalation,
        HazardCategory::SkinCorrosion,
        HazardCategory::BacterialReverseMutation,
        HazardCategory::ChromosomeAberration,
        HazardCategory::Micronucleus,
        HazardCategory::FishAcute,
        HazardCategory::DaphniaAcute,
        HazardCategory::AlgalGrowth,
        HazardCategory::Biodegradability,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            HazardCategory::AcuteOral => "급성경구독성",
            HazardCategory::AcuteInhalation => "급성흡입독성",
            HazardCategory::SkinCorrosion => "피부부식성/자극성",
            HazardCategory::BacterialReverseMutation => "복귀돌연변이",
            HazardCategory::ChromosomeAberration => "포유류 배양세포를 이용한 염색체이상",
            HazardCategory::Micronucleus => "소핵시험",
            HazardCategory::FishAcute => "어류급성독성",
            HazardCategory::DaphniaAcute => "물벼룩급성독성",
            HazardCategory::AlgalGrowth => "담수조류생장저해",
            HazardCategory::Biodegradability => "이분해성",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Categories reported as `"{endpoint} = {value} {unit} ({species})"`.
    pub const fn is_quantitative(self) -> bool {
        matches!(
            self,
            HazardCategory::AcuteOral
                | HazardCategory::AcuteInhalation
                | HazardCategory::FishAcute
                | HazardCategory::DaphniaAcute
                | HazardCategory::AlgalGrowth
        )
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a reported value was obtained.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationMethod {
    Experimental,
    ReadAcross,
    Qsar,
    AiQsar,
    /// Any label outside the closed set, kept verbatim.
    Other(String),
}

impl DerivationMethod {
    pub fn label(&self) -> &str {
        match self {
            DerivationMethod::Experimental => "실험값",
            DerivationMethod::ReadAcross => "Read-across",
            DerivationMethod::Qsar => "QSAR",
            DerivationMethod::AiQsar => "AI-based QSAR",
            DerivationMethod::Other(raw) => raw,
        }
    }

    /// Lenient parse: case-insensitive, with `-`, `_` and runs of whitespace treated
    /// as the same separator, so `Read across` and `Read-across` agree.
    pub fn parse(raw: &str) -> Self {
        let key = fold_separators(raw);
        match key.as_str() {
            "실험값" | "experimental" | "experimental value" => DerivationMethod::Experimental,
            "read across" => DerivationMethod::ReadAcross,
            "qsar" => DerivationMethod::Qsar,
            "ai based qsar" => DerivationMethod::AiQsar,
            _ => DerivationMethod::Other(raw.trim().to_string()),
        }
    }

    /// Model-derived values carry an applicability-domain annotation.
    pub fn is_model_based(&self) -> bool {
        matches!(self, DerivationMethod::Qsar | DerivationMethod::AiQsar)
    }
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn fold_separators(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Originating database or prediction tool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    EchaChem,
    UsDashboard,
    Pubchem,
    KReach,
    /// National authority hazard review results (환경부유해성심사결과).
    NationalReview,
    QsarToolbox,
    DanishQsar,
    Vega,
    EpiSuite,
    Hazmap,
    Protox,
    Cheminformatics,
}

impl Source {
    /// Exact label stored in the database `출처` column.
    pub const fn label(self) -> &'static str {
        match self {
            Source::EchaChem => "ECHA CHEM",
            Source::UsDashboard => "US DashBoard",
            Source::Pubchem => "Pubchem",
            Source::KReach => "K-reach",
            Source::NationalReview => "환경부유해성심사결과",
            Source::QsarToolbox => "QSAR Toolbox v.4.8",
            Source::DanishQsar => "Danish QSAR",
            Source::Vega => "VEGA",
            Source::EpiSuite => "Epi suite",
            Source::Hazmap => "HAZMAP",
            Source::Protox => "Protox 3.0",
            Source::Cheminformatics => "Cheminfomatics",
        }
    }

    /// Version-free family token, matched as a case-insensitive substring.
    pub const fn family(self) -> &'static str {
        match self {
            Source::QsarToolbox => "QSAR Toolbox",
            other => other.label(),
        }
    }

    /// True when `raw` names this source exactly.
    pub fn is(self, raw: &str) -> bool {
        raw.trim() == self.label()
    }

    /// True when `raw` contains this source's family token, ignoring case.
    pub fn matches_family(self, raw: &str) -> bool {
        raw.to_lowercase().contains(&self.family().to_lowercase())
    }

    /// Sources that already report a qualitative biodegradability classification and
    /// may omit the endpoint column. VEGA ready-biodegradability predictions carry a class
    /// ("NON Readily Biodegradable") and a reliability status, never an endpoint.
    pub const fn reports_biodegradability_class(self) -> bool {
        matches!(
            self,
            Source::NationalReview | Source::KReach | Source::EpiSuite | Source::Vega
        )
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
