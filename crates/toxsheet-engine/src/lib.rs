//! Extraction engine for toxicology hazard reports.
//!
//! The pipeline for each report cell is `filter` → `resolve` → `format`: narrow the
//! dataset to the candidates a source column may use, pick one deterministically, and
//! render it as cell text. [`assemble`] drives that pipeline over a [`ReportLayout`].

pub mod assemble;
mod error;
pub mod filter;
pub mod format;
pub mod layout;
pub mod resolve;

pub use assemble::{extract, extract_paired, extract_single, select, validate_identifiers, ExtractionSummary};
pub use error::ExtractError;
pub use filter::CandidateSelector;
pub use format::format_value;
pub use layout::{BlockLayout, InfoCell, InfoField, LayoutError, LayoutKind, ReportLayout, SlotLayout, StyleConfig};
pub use resolve::{resolve, Policy, ResolveContext};
