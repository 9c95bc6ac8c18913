use common::NalHeader;

use super::{Instruction, NalPolicy};

/// Stamps a synthetic media-time pts at a fixed frame rate, starting one interval past zero.
///
/// Parameter sets carry no timing and keep whatever pts the inner stage gave them.
pub struct FixedRate<P> {
    inner: P,
    interval_us: i64,
    last_pts_us: i64,
}

impl<P: NalPolicy> FixedRate<P> {
    pub fn new(inner: P, fps: f64) -> Self {
        Self {
            inner,
            interval_us: Self::interval_us(fps),
            last_pts_us: 0,
        }
    }

    pub fn set_fps(&mut self, fps: f64) -> &mut Self {
        self.interval_us = Self::interval_us(fps);
        self
    }

    pub fn interval(&self) -> i64 {
        self.interval_us
    }

    fn interval_us(fps: f64) -> i64 {
        if fps.is_finite() && fps > 0.0 {
            (1_000_000.0 / fps).round() as i64
        } else {
            0
        }
    }
}

impl<P: NalPolicy> NalPolicy for FixedRate<P> {
    fn on_nal(&mut self, header: &mut NalHeader, nal: &[u8]) -> Instruction {
        let instruction = self.inner.on_nal(header, nal);

        if !header.nal_type.is_parameter_set() {
            self.last_pts_us += self.interval_us;
            header.pts = self.last_pts_us;
        }

        instruction
    }
}

#[cfg(test)]
mod tests {
    use common::NalType;

    use super::*;
    use crate::policy::{from_fn, Always};

    #[test]
    fn test_inner_rewrites_survive() {
        let inner = from_fn(|header: &mut NalHeader, _nal: &[u8]| {
            header.nal_type = NalType::IdrSlice;
            header.size = 10;
            Instruction::Skip
        });
        let mut policy = FixedRate::new(inner, 0.0);

        let mut header = NalHeader::default();
        assert_eq!(policy.on_nal(&mut header, &[]), Instruction::Skip);

        assert_eq!(header.size, 10);
        assert_eq!(header.nal_type, NalType::IdrSlice);
        assert_eq!(header.pts, 0);
    }

    #[test]
    fn test_pts() {
        let mut policy = FixedRate::new(Always::CUT, 10.0);
        assert_eq!(policy.interval(), 100_000);

        let mut header = NalHeader::new(NalType::Sps, 0);
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 0);

        header.nal_type = NalType::Pps;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 0);

        header.nal_type = NalType::IdrSlice;
        policy.on_nal(&mut header, &[]);
        assert_eq!(header.pts, 100_000);

        header.nal_type = NalType::Slice;
        let mut last_pts = header.pts;
        for _ in 0..3 {
            policy.on_nal(&mut header, &[]);
            assert_eq!(header.pts - last_pts, 100_000);
            last_pts = header.pts;
        }
    }

    #[test]
    fn test_interval_rounding() {
        let mut policy = FixedRate::new(Always::CUT, 60.0);
        assert_eq!(policy.interval(), 16_667);

        policy.set_fps(29.97);
        assert_eq!(policy.interval(), 33_367);

        policy.set_fps(f64::NAN);
        assert_eq!(policy.interval(), 0);
        policy.set_fps(-5.0);
        assert_eq!(policy.interval(), 0);
    }
}
