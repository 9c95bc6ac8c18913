use std::time::Duration;

use common::{NalHeader, NalType};
use tracing::{debug, trace};

use super::{Instruction, NalPolicy};
use crate::clock::{Clock, MonotonicClock};

/// Treats the inner stage's pts as a decode timestamp and holds the caller back until that
/// moment arrives on the local clock, optionally releasing units a little early.
///
/// This simulates a live source that never delivers faster than real time. It is the only stage
/// that blocks.
pub struct UptimeDts<P, C = MonotonicClock> {
    inner: P,
    clock: C,
    adjust_ns: i64,

    /// `pts * 1000 - now_ns`, established on the first unit and on every IDR.
    clock_diff_ns: Option<i64>,
}

impl<P: NalPolicy> UptimeDts<P> {
    pub fn new(inner: P) -> Self {
        Self::with_clock(inner, MonotonicClock)
    }
}

impl<P: NalPolicy, C: Clock> UptimeDts<P, C> {
    pub fn with_clock(inner: P, clock: C) -> Self {
        Self {
            inner,
            clock,
            adjust_ns: 0,
            clock_diff_ns: None,
        }
    }

    /// Feeds units `early_ms` before their timestamp.
    pub fn with_early_ms(mut self, early_ms: u64) -> Self {
        self.adjust_ns = i64::try_from(early_ms)
            .unwrap_or(i64::MAX)
            .saturating_mul(1_000_000);
        self
    }
}

impl<P: NalPolicy, C: Clock> NalPolicy for UptimeDts<P, C> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        let instruction = self.inner.on_nal(header, nal);

        let now_ns = self.clock.now_ns();
        let dts_ns = header.pts.saturating_mul(1_000);
        let clock_diff_ns = match self.clock_diff_ns {
            Some(diff) if header.nal_type != NalType::IdrSlice => diff,
            _ => {
                let diff = dts_ns.saturating_sub(now_ns);
                debug!(pts = header.pts, now_ns, "dts clock sync");
                self.clock_diff_ns = Some(diff);
                diff
            }
        };

        let target_ns = dts_ns
            .saturating_sub(clock_diff_ns)
            .saturating_sub(self.adjust_ns);
        if target_ns > now_ns {
            let wait = Duration::from_nanos(target_ns.abs_diff(now_ns));
            trace!(pts = header.pts, wait_us = wait.as_micros() as u64, "holding unit");
            self.clock.sleep(wait);
        }

        instruction
    }
}
