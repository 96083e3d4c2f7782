// Export Errors - Infrastructure failures that abort an export
//
// Authoring mistakes are never returned here; they are recorded in the
// export's `TemplateErrorCollection` instead.

use crate::function::CounterError;
use crate::resolver::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export cancelled")]
    Cancelled,

    #[error("Object lookup failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Function name allocation failed: {0}")]
    Counter(#[from] CounterError),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
