use std::path::PathBuf;

use thiserror::Error;
use toxsheet_engine::LayoutError;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open workbook `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("failed to read workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),
    #[error("workbook contains no worksheets")]
    NoWorksheets,
    #[error("sheet `{0}` not found")]
    MissingSheet(String),
    #[error("sheet `{sheet}` has no `{column}` column")]
    MissingColumn { sheet: String, column: String },
    #[error("cell {0} is outside the worksheet grid")]
    OutOfBounds(String),
    #[error("failed to write report: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to access `{path}`: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout file `{path}`: {source}")]
    LayoutJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
