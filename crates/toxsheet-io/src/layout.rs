//! Layout overrides stored as JSON.

use std::path::Path;

use log::info;
use toxsheet_engine::ReportLayout;

use crate::error::IoError;

/// Read and validate a layout file.
pub fn load_layout(path: impl AsRef<Path>) -> Result<ReportLayout, IoError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let layout: ReportLayout = serde_json::from_str(&text).map_err(|source| IoError::LayoutJson {
        path: path.to_path_buf(),
        source,
    })?;
    layout.validate()?;
    info!(
        "using {:?} layout from {} ({} source columns)",
        layout.kind,
        path.display(),
        layout.slots.len()
    );
    Ok(layout)
}

/// Write `layout` as pretty-printed JSON, e.g. to seed an override file.
pub fn save_layout(path: impl AsRef<Path>, layout: &ReportLayout) -> Result<(), IoError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(layout).map_err(|source| IoError::LayoutJson {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}
