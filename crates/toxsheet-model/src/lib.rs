//! `toxsheet-model` defines the data shared by every toxsheet crate:
//! - the toxicology records (substances and observations) and their vocabularies
//! - cell addressing and the in-memory report [`Worksheet`]
//!
//! Nothing here performs I/O; loaders and writers live in `toxsheet-io`.

mod address;
mod dataset;
mod record;
mod vocab;
mod worksheet;

pub use address::{A1ParseError, CellRef, Column, Range, MAX_COLS, MAX_ROWS};
pub use dataset::Dataset;
pub use record::{Observation, Substance};
pub use vocab::{DerivationMethod, HazardCategory, Source};
pub use worksheet::{MergeError, Worksheet};
