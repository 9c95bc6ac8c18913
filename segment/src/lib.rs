//! Streaming segmentation of Annex-B H.264 byte streams.
//!
//! [`NalParser`] cuts a byte source into NAL units; a [`policy`] chain decides how raw units are
//! merged, dropped, and timestamped on the way out.

mod byte_stream;
pub mod clock;
mod config;
pub mod errors;
pub mod policy;
mod source;

pub use byte_stream::NalParser;
pub use common::{BufferFlag, NalHeader, NalType, NalUnit};
pub use config::ParserConfig;
pub use errors::{ByteStreamError, SegmentError};
pub use source::MappedSource;
