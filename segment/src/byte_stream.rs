use std::io::{self, Read};

use common::{find_start_code, NalHeader, NalType, NalUnit, NalUnitHeader, StartCode};
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::errors::{ByteStreamError, SegmentError};
use crate::policy::{Always, Instruction, NalPolicy};

/// Splits an Annex-B byte stream into NAL units, one [`parse`](NalParser::parse) call at a time.
///
/// The parser pulls from `source` into a scratch buffer that always starts on a start code. Each
/// raw unit it finds is shown to the policy, which decides whether it is merged with the next one,
/// emitted, or dropped, and which pts it carries.
pub struct NalParser<R, P = Always> {
    source: R,
    policy: P,
    config: ParserConfig,

    buffer: Vec<u8>,
    filled: usize,

    /// The source is drained; whatever is buffered is all there is.
    eos: bool,

    /// Start code of the raw unit being looked at.
    current: Option<StartCode>,

    /// Start code that terminates `current`. Its length is 0 when the unit runs to end of data.
    next: Option<StartCode>,

    /// Length of the start code at offset 0, which leads the unit that gets emitted.
    head_len: usize,

    fused: bool,
}

impl<R: Read> NalParser<R> {
    /// Emits every raw unit as is.
    pub fn new(source: R) -> Self {
        Self::with_policy(source, Always::CUT)
    }
}

impl<R: Read, P: NalPolicy> NalParser<R, P> {
    pub fn with_policy(source: R, policy: P) -> Self {
        Self::with_config(source, policy, ParserConfig::default())
    }

    pub fn with_config(source: R, policy: P, config: ParserConfig) -> Self {
        Self {
            source,
            policy,
            buffer: vec![0; config.capacity()],
            config,
            filled: 0,
            eos: false,
            current: None,
            next: None,
            head_len: 0,
            fused: false,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_parts(self) -> (R, P) {
        (self.source, self.policy)
    }

    /// Returns the next unit the policy cuts, or `None` once the source is drained.
    ///
    /// A stream that does not open with a start code fails with
    /// [`ByteStreamError::InvalidStream`]; the parser does not try to resynchronize, and calling
    /// again fails the same way.
    pub fn parse(&mut self) -> Result<Option<NalUnit>, SegmentError> {
        loop {
            self.fill()?;

            if self.eos && self.filled == 0 {
                return Ok(None);
            }

            let current = match self.current {
                Some(current) => current,
                None => match find_start_code(&self.buffer, 0, self.filled) {
                    Some(code) if code.pos == 0 => {
                        self.current = Some(code);
                        self.head_len = code.len;
                        code
                    }
                    found => {
                        return Err(ByteStreamError::InvalidStream {
                            found: found.map(|code| code.pos),
                        }
                        .into())
                    }
                },
            };

            let next = match self.next {
                Some(next) => next,
                None => {
                    let offset = current.end();
                    match find_start_code(&self.buffer, offset, self.filled.saturating_sub(offset)) {
                        Some(code) => code,
                        None if !self.eos && self.filled == self.buffer.len() => {
                            self.grow()?;
                            continue;
                        }
                        None => StartCode::new(self.filled, 0),
                    }
                }
            };
            self.next = Some(next);

            let nal_type = nal_type_at(&self.buffer[..self.filled], current.end());
            let mut header = NalHeader::new(nal_type, next.pos - current.pos);
            let segment = &self.buffer[current.pos..next.pos];

            let instruction = match self.policy.on_nal(&mut header, segment) {
                // Nothing left to merge with.
                Instruction::Continue if next.len == 0 => Instruction::Cut,
                instruction => instruction,
            };
            trace!(%nal_type, size = header.size, ?instruction, "raw unit");

            match instruction {
                Instruction::Continue => {
                    self.current = Some(next);
                    self.next = None;
                }
                Instruction::Cut => {
                    let data = self.buffer[..next.pos].to_vec();
                    let header = NalHeader {
                        nal_type: nal_type_at(&data, self.head_len),
                        size: data.len(),
                        pts: header.pts,
                    };
                    self.consume(next);

                    trace!(nal_type = %header.nal_type, size = header.size, pts = header.pts, "cut");
                    return Ok(Some(NalUnit { header, data }));
                }
                Instruction::Skip => {
                    trace!(size = next.pos, "skip");
                    self.consume(next);
                }
            }
        }
    }

    /// Tops the buffer up until it is full or the source is drained.
    fn fill(&mut self) -> io::Result<()> {
        while !self.eos && self.filled < self.buffer.len() {
            match self.source.read(&mut self.buffer[self.filled..]) {
                Ok(0) => self.eos = true,
                Ok(read) => self.filled += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    fn grow(&mut self) -> Result<(), ByteStreamError> {
        let len = self.buffer.len();
        let capacity = match self.config.max_buffer {
            Some(limit) if len * 2 > limit => {
                if len >= limit {
                    return Err(ByteStreamError::BufferLimit { limit });
                }
                limit
            }
            _ => len * 2,
        };

        debug!(from = len, to = capacity, "no terminating start code, growing buffer");
        self.buffer.resize(capacity, 0);
        Ok(())
    }

    /// Drops everything in front of `next` and moves the remainder to offset 0.
    fn consume(&mut self, next: StartCode) {
        self.buffer.copy_within(next.pos..self.filled, 0);
        self.filled -= next.pos;

        self.current = (next.len > 0).then(|| StartCode::new(0, next.len));
        self.head_len = next.len;
        self.next = None;
    }
}

/// Type of the unit whose header byte sits at `pos`; `Unknown` when the data stops short of it.
fn nal_type_at(data: &[u8], pos: usize) -> NalType {
    match data.get(pos) {
        Some(&byte) => {
            let header = NalUnitHeader::parse(byte);
            if header.forbidden_zero_bit {
                debug!(pos, byte, "forbidden_zero_bit set");
            }
            header.nal_type()
        }
        None => NalType::Unknown,
    }
}

impl<R: Read, P: NalPolicy> Iterator for NalParser<R, P> {
    type Item = Result<NalUnit, SegmentError>;

    /// Stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }

        match self.parse() {
            Ok(Some(unit)) => Some(Ok(unit)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}
