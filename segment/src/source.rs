use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use memmap::Mmap;
use tracing::debug;

use crate::byte_stream::NalParser;
use crate::errors::SegmentError;
use crate::policy::NalPolicy;

/// A file mapped into memory and read front to back.
pub enum MappedSource {
    Mapped(Cursor<Mmap>),
    /// Zero-length files cannot be mapped.
    Empty,
}

impl MappedSource {
    pub fn from_file(file: File) -> Result<Self, SegmentError> {
        if file.metadata()?.len() == 0 {
            return Ok(MappedSource::Empty);
        }

        let mmap = unsafe { Mmap::map(&file)? };
        Ok(MappedSource::Mapped(Cursor::new(mmap)))
    }

    pub fn from_file_path<T: AsRef<Path>>(file_path: T) -> Result<Self, SegmentError> {
        let file_path = file_path.as_ref();
        if !file_path.is_file() {
            return Err(SegmentError::UnrecognizedFilePath(file_path.to_path_buf()));
        }

        debug!(path = %file_path.display(), "mapping source");
        MappedSource::from_file(File::open(file_path)?)
    }

    pub fn len(&self) -> usize {
        match self {
            MappedSource::Mapped(cursor) => cursor.get_ref().len(),
            MappedSource::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Read for MappedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MappedSource::Mapped(cursor) => cursor.read(buf),
            MappedSource::Empty => Ok(0),
        }
    }
}

impl<P: NalPolicy> NalParser<MappedSource, P> {
    pub fn from_file_path<T: AsRef<Path>>(file_path: T, policy: P) -> Result<Self, SegmentError> {
        Ok(NalParser::with_policy(
            MappedSource::from_file_path(file_path)?,
            policy,
        ))
    }
}
