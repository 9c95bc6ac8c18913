use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ByteStreamError {
    /// The buffer must open with a start code. `found` is where the first one actually sits, if
    /// there is one at all.
    #[error("invalid stream: buffer does not begin with a start code (first start code at {found:?})")]
    InvalidStream { found: Option<usize> },

    #[error("no start code within {limit} bytes, refusing to grow the buffer further")]
    BufferLimit { limit: usize },
}

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("File path not recognized: {0}")]
    UnrecognizedFilePath(PathBuf),

    #[error("An error occurred reading from the source: {0}")]
    FileError(#[from] io::Error),

    #[error("An error occurred segmenting the nal unit stream: {0}")]
    BytestreamError(#[from] ByteStreamError),
}

impl SegmentError {
    /// Stream corruption; the parser instance that raised it will keep raising it.
    pub fn is_invalid_stream(&self) -> bool {
        matches!(
            self,
            SegmentError::BytestreamError(ByteStreamError::InvalidStream { .. })
        )
    }
}
