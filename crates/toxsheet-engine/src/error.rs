use thiserror::Error;

use crate::layout::LayoutError;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("'{id}' 물질정보를 DB에서 찾을 수 없습니다. (substance `{id}` not found)")]
    SubstanceNotFound { id: String },
    #[error("substance identifier must not be empty")]
    EmptyIdentifier,
    #[error("paired extraction needs two different identifiers, got `{id}` twice")]
    DuplicateIdentifier { id: String },
    #[error("layout has {blocks} block(s) but {ids} identifier(s) were given")]
    BlockCountMismatch { blocks: usize, ids: usize },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
