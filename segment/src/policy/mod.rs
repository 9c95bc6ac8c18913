//! Split policies for [`NalParser`](crate::NalParser).
//!
//! The parser hands every raw NAL unit it finds to a policy, which may rewrite the header and
//! answers with an [`Instruction`]. For a stream `A, B, C`:
//!
//! * `Cut, Cut, Cut` yields three units: `A`, `B`, `C`.
//! * `Continue, Cut, Cut` yields two units: `A B`, `C`.
//! * `Cut, Continue, Cut` yields two units: `A`, `B C`.
//! * `Cut, Skip, Cut` yields two units: `A`, `C`.
//!
//! Stages own their inner stage and delegate to it before applying their own rewrite, so a chain
//! is built inside out:
//!
//! ```
//! use segment::policy::{Always, FixedRate, UptimePts};
//!
//! let chain = UptimePts::new(FixedRate::new(Always::CUT, 30.0));
//! # let _ = chain;
//! ```

use common::NalHeader;

mod fixed_rate;
pub mod index;
mod uptime_dts;
mod uptime_pts;

pub use fixed_rate::FixedRate;
pub use index::{Index, IndexRecord, IndexWriter, PtsUnit};
pub use uptime_dts::UptimeDts;
pub use uptime_pts::UptimePts;

/// What the parser does with the unit a policy was just shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Keep the unit and merge it with the one that follows.
    Continue,
    /// Emit everything accumulated so far as one unit.
    Cut,
    /// Drop everything accumulated so far.
    Skip,
}

pub trait NalPolicy {
    /// `nal` is the raw unit, start code included; `header` arrives with the scanned type and size
    /// and a zero pts.
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction;
}

impl<P: NalPolicy + ?Sized> NalPolicy for Box<P> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        (**self).on_nal(header, nal)
    }
}

impl<P: NalPolicy + ?Sized> NalPolicy for &mut P {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        (**self).on_nal(header, nal)
    }
}

/// Answers every unit with the same instruction and leaves the header alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Always(pub Instruction);

impl Always {
    pub const CUT: Always = Always(Instruction::Cut);
}

impl NalPolicy for Always {
    fn on_nal(&mut self, _header: &mut NalHeader, _nal: &[u8]) -> Instruction {
        self.0
    }
}

/// Policy backed by a closure. See [`from_fn`].
pub struct FnPolicy<F>(F);

/// Creates a policy from a closure.
///
/// ```
/// use segment::NalType;
/// use segment::policy::{from_fn, Instruction};
///
/// // Merge parameter sets into the slice that follows them.
/// let _merge = from_fn(|header, _nal| match header.nal_type {
///     NalType::Sps | NalType::Pps => Instruction::Continue,
///     _ => Instruction::Cut,
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnPolicy<F>
where
    F: FnMut(&mut NalHeader, &[u8]) -> Instruction,
{
    FnPolicy(f)
}

impl<F> NalPolicy for FnPolicy<F>
where
    F: FnMut(&mut NalHeader, &[u8]) -> Instruction,
{
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        (self.0)(header, nal)
    }
}

/// Identity stage. Forwards verbatim to its inner stage, or answers with `fallback` when there is
/// none.
pub struct Passthrough<P> {
    inner: Option<P>,
    fallback: Instruction,
}

impl<P: NalPolicy> Passthrough<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner: Some(inner),
            fallback: Instruction::Cut,
        }
    }

    pub fn empty() -> Self {
        Self {
            inner: None,
            fallback: Instruction::Cut,
        }
    }

    pub fn with_fallback(mut self, fallback: Instruction) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn inner(&self) -> Option<&P> {
        self.inner.as_ref()
    }
}

impl<P: NalPolicy> From<Option<P>> for Passthrough<P> {
    fn from(inner: Option<P>) -> Self {
        Self {
            inner,
            fallback: Instruction::Cut,
        }
    }
}

impl<P: NalPolicy> NalPolicy for Passthrough<P> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        match self.inner.as_mut() {
            Some(inner) => inner.on_nal(header, nal),
            None => self.fallback,
        }
    }
}
