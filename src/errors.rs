use std::path::PathBuf;

use thiserror::Error;

/// Errors that can stop a single file from being flipped.
///
/// None of these are fatal to a batch: the orchestration layer records them
/// per file and moves on.
#[derive(Error, Debug)]
pub enum FlipError {
    /// The balance tag was not found (inside its enclosing aggregate, if scoped)
    #[error("Unable to locate <{tag}> value to flip")]
    FieldNotFound { tag: String },

    /// The tag was found but its value is not a signed decimal number
    #[error("Found <{tag}> but its value is not a number: {value:?} (offset {offset})")]
    MalformedValue {
        tag: String,
        value: String,
        offset: usize,
    },

    /// A located span no longer points into the content it is applied to
    #[error("Span {start}..{end} is out of bounds for content of length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    /// Reading or writing the file failed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    // ── Validation before the file is read ───────────────────────────────────

    /// The path does not point to a regular file
    #[error("File does not exist: {}", .0.display())]
    NotAFile(PathBuf),

    /// The file is bigger than the configured limit
    #[error("File is too large to process safely ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// Neither the extension nor the content look like OFX/QFX
    #[error("File does not appear to be in OFX/QFX format")]
    UnsupportedFormat,
}

pub type FlipResult<T> = Result<T, FlipError>;
