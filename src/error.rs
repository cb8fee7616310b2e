use crate::model::TagId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tag {field} must not be empty")]
    InvalidTag { field: &'static str },

    #[error("tag {0} not found")]
    TagNotFound(TagId),

    #[error("song not found: {}", .0.display())]
    SongNotFound(PathBuf),

    #[error("unsupported audio file: {}", .0.display())]
    UnsupportedFile(PathBuf),
}

pub type Result<T> = std::result::Result<T, EngineError>;
