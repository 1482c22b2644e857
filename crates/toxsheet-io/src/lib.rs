//! Spreadsheet I/O for toxsheet: the toxicology database and report templates are
//! read with `calamine`; filled reports are written with `rust_xlsxwriter`.

mod database;
mod error;
mod layout;
mod template;

pub use database::{cell_text, load_dataset, load_dataset_from_bytes, OBSERVATION_SHEET, SUBSTANCE_SHEET};
pub use error::IoError;
pub use layout::{load_layout, save_layout};
pub use template::{load_template, load_template_from_bytes, render_report, save_report, sheet_title};
