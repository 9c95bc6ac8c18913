//! Splits the stream by an index side channel.
//!
//! An index is a flat sequence of big-endian records `{ i32 size, i64 pts }`, one per emitted
//! unit, in stream order. Raw NAL units are merged until their combined size reaches the record's
//! size, then cut and stamped with the record's pts.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use common::NalHeader;
use tracing::{debug, trace};

use super::{Instruction, NalPolicy};

/// Unit of the timestamps stored in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PtsUnit {
    Millisecond,
    #[default]
    Microsecond,
    Nanosecond,
}

impl PtsUnit {
    pub fn to_micros(&self, pts: i64) -> i64 {
        match self {
            PtsUnit::Millisecond => pts.saturating_mul(1_000),
            PtsUnit::Microsecond => pts,
            PtsUnit::Nanosecond => pts / 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Byte count of the unit, start codes included.
    pub size: i32,
    pub pts: i64,
}

impl IndexRecord {
    pub const LEN: usize = 12;

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let size = reader.read_i32::<BigEndian>()?;
        let pts = reader.read_i64::<BigEndian>()?;
        Ok(Self { size, pts })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<BigEndian>(self.size)?;
        writer.write_i64::<BigEndian>(self.pts)
    }
}

/// Leaf policy driven by an index stream.
///
/// A side channel that fails or runs dry does not stop the parser: every unit is then cut on its
/// own and stamped with the last pts that was read.
pub struct Index<R> {
    stream: R,
    pts_unit: PtsUnit,

    /// Bytes merged since the last cut.
    parsed: i64,
    size: i32,
    pts: i64,
}

impl<R: Read> Index<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            pts_unit: PtsUnit::default(),
            parsed: 0,
            size: 0,
            pts: 0,
        }
    }

    pub fn with_pts_unit(mut self, pts_unit: PtsUnit) -> Self {
        self.pts_unit = pts_unit;
        self
    }

    /// Switches to a new index. Nothing of the old one carries over, including the fallback pts.
    pub fn set_stream(&mut self, stream: R) {
        self.stream = stream;
        self.parsed = 0;
        self.size = 0;
        self.pts = 0;
    }

    /// Accounts `len` more bytes against the current record, reading a fresh record first when
    /// the previous one was just cut. Returns whether the record still wants more bytes.
    fn accumulate(&mut self, len: usize) -> io::Result<bool> {
        if self.parsed == 0 {
            // Read field by field: a torn record still updates the size.
            self.size = self.stream.read_i32::<BigEndian>()?;
            self.pts = self.stream.read_i64::<BigEndian>()?;
            trace!(size = self.size, pts = self.pts, "index record");
        }
        self.parsed += len as i64;

        Ok(self.parsed < i64::from(self.size))
    }
}

impl<R: Read> NalPolicy for Index<R> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        match self.accumulate(nal.len()) {
            Ok(true) => return Instruction::Continue,
            Ok(false) => {}
            Err(err) => debug!(%err, pts = self.pts, "index unavailable, cutting with last pts"),
        }

        self.parsed = 0;
        header.pts = self.pts_unit.to_micros(self.pts);
        Instruction::Cut
    }
}

/// Authors index files readable by [`Index`].
pub struct IndexWriter<W> {
    inner: W,
    records: usize,
}

impl<W: Write> IndexWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write(&mut self, header: &NalHeader) -> io::Result<()> {
        let size = i32::try_from(header.size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unit of {} bytes does not fit an index record", header.size),
            )
        })?;

        IndexRecord {
            size,
            pts: header.pts,
        }
        .write_to(&mut self.inner)?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
