use thiserror::Error;

use crate::id_generator::ObjectId;

/// Errors reported by the scene, history, export and background operations.
///
/// None of these are fatal to an editing session: the operation that failed
/// leaves the scene and history exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("no scene object with id {0}")]
    NotFound(ObjectId),

    #[error("object {id} is not {expected}")]
    WrongVariant { id: ObjectId, expected: &'static str },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("background image could not be loaded: {0}")]
    BackgroundLoadFailed(String),

    #[error("unknown palette swatch: {0}")]
    UnknownSwatch(String),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
