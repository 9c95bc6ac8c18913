use common::{NalHeader, NalType};
use tracing::{debug, trace};

use super::{Instruction, NalPolicy};
use crate::clock::{Clock, MonotonicClock};

/// Beyond this drift between source and local clock the offset is re-established.
const RESYNC_THRESHOLD_US: u64 = 1_000_000;

/// Maps the inner stage's pts from the source clock onto the local monotonic clock.
///
/// The offset between the two clocks is fixed on the first timed unit and re-established on
/// every IDR, or when the source timestamps jump by more than a second. Units with a zero pts
/// (parameter sets) pass through untouched.
pub struct UptimePts<P, C = MonotonicClock> {
    inner: P,
    clock: C,
    clock_diff_us: Option<i64>,
}

impl<P: NalPolicy> UptimePts<P> {
    pub fn new(inner: P) -> Self {
        Self::with_clock(inner, MonotonicClock)
    }
}

impl<P: NalPolicy, C: Clock> UptimePts<P, C> {
    pub fn with_clock(inner: P, clock: C) -> Self {
        Self {
            inner,
            clock,
            clock_diff_us: None,
        }
    }
}

impl<P: NalPolicy, C: Clock> NalPolicy for UptimePts<P, C> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        let instruction = self.inner.on_nal(header, nal);
        if header.pts == 0 {
            return instruction;
        }

        trace!(pts = header.pts, "from source clock");
        let now_us = self.clock.now_us();
        let diff_us = header.pts.saturating_sub(now_us);
        let clock_diff_us = match self.clock_diff_us {
            Some(prev)
                if header.nal_type != NalType::IdrSlice
                    && prev.abs_diff(diff_us) <= RESYNC_THRESHOLD_US =>
            {
                prev
            }
            _ => {
                debug!(pts = header.pts, now_us, "pts clock sync");
                self.clock_diff_us = Some(diff_us);
                diff_us
            }
        };

        header.pts = header.pts.saturating_sub(clock_diff_us);
        trace!(pts = header.pts, "to local clock");
        instruction
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::{from_fn, Always, FnPolicy};

    /// Produces 100000, 200000, 300000 ... regardless of the incoming pts.
    fn counting() -> FnPolicy<impl FnMut(&mut NalHeader, &[u8]) -> Instruction> {
        let mut count = 0;
        from_fn(move |header: &mut NalHeader, _nal: &[u8]| {
            count += 1;
            header.pts = count * 100_000;
            Instruction::Cut
        })
    }

    #[test]
    fn test_pts_default() {
        let mut policy = UptimePts::new(counting());
        let mut header = NalHeader::new(NalType::Slice, 0);
        let uptime_us = MonotonicClock.now_us();

        // First frame syncs to the current uptime.
        policy.on_nal(&mut header, &[]);
        assert!((header.pts - uptime_us).abs() < 10_000);

        policy.on_nal(&mut header, &[]);
        assert!((header.pts - uptime_us - 100_000).abs() < 10_000);

        policy.on_nal(&mut header, &[]);
        assert!((header.pts - uptime_us - 200_000).abs() < 10_000);
    }

    #[test]
    fn test_pts_follows_source_steps() {
        let clock = ManualClock::new(7_000_000_000);
        let mut policy = UptimePts::with_clock(counting(), clock.clone());
        let mut header = NalHeader::new(NalType::Slice, 0);

        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 7_000_000);

        // Local time does not matter once synced; only the source steps do.
        clock.advance(Duration::from_millis(30));
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 7_100_000);

        clock.advance(Duration::from_millis(500));
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 7_200_000);
    }

    #[test]
    fn test_pts_sync_iframe() {
        let clock = ManualClock::new(1_000_000_000);
        let mut policy = UptimePts::with_clock(counting(), clock.clone());
        let mut header = NalHeader::new(NalType::Slice, 0);

        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 1_000_000);

        // IDR forces a re-sync to the current uptime.
        header.nal_type = NalType::IdrSlice;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 1_000_000);

        header.nal_type = NalType::Slice;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 1_100_000);
    }

    #[test]
    fn test_pts_sync_timestamp_jump() {
        let clock = ManualClock::new(1_000_000_000);
        let mut policy = UptimePts::with_clock(Always::CUT, clock.clone());
        let mut header = NalHeader::new(NalType::Slice, 0);

        header.pts = 100_000;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 1_000_000);

        // A one second step is still within tolerance.
        header.pts = 1_100_000;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 2_000_000);

        // Two seconds past that is a jump: re-sync to now.
        header.pts = 3_100_001;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 1_000_000);
    }

    #[test]
    fn test_extreme_pts_saturates() {
        let clock = ManualClock::new(1_000_000_000);
        let mut policy = UptimePts::with_clock(Always::CUT, clock);
        let mut header = NalHeader::new(NalType::Slice, 0);

        header.pts = i64::MIN + 1;
        policy.on_nal(&mut header, &[]);
        assert_eq!(policy.clock_diff_us, Some(i64::MIN));
        assert_eq!(header.pts, 1);

        // The distance to the saturated offset overflows i64; still a jump.
        header.pts = i64::MAX;
        policy.on_nal(&mut header, &[]);
        assert_eq!(policy.clock_diff_us, Some(i64::MAX - 1_000_000));
        assert_eq!(header.pts, 1_000_000);
    }

    #[test]
    fn test_zero_pts_untouched() {
        let clock = ManualClock::new(1_000_000_000);
        let mut policy = UptimePts::with_clock(Always::CUT, clock);

        let mut header = NalHeader::new(NalType::Sps, 0);
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 0);
        assert!(policy.clock_diff_us.is_none());
    }
}
