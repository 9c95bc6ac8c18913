/// Shortest run the scanner accepts: `0x00 0x00 0x01`.
pub const START_CODE_MIN: usize = 3;

/// Longest run the scanner accepts: seven zero bytes and the terminating `0x01`.
pub const START_CODE_MAX: usize = 8;

/// Location of a start code prefix inside a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCode {
    pub pos: usize,
    pub len: usize,
}

impl StartCode {
    pub fn new(pos: usize, len: usize) -> Self {
        Self { pos, len }
    }

    /// Offset of the NAL unit header byte that follows the prefix.
    pub fn end(&self) -> usize {
        self.pos + self.len
    }
}

/// Scans `data[offset..offset + len]` for the next start code.
///
/// The run counter advances on every `0x00` *and* `0x01` byte and resets on anything else. A
/// `0x01` byte closes a match when the run is within [`START_CODE_MIN`, `START_CODE_MAX`]. This
/// means runs such as `0x00 0x01 0x01` register as a three byte start code.
pub fn find_start_code(data: &[u8], offset: usize, len: usize) -> Option<StartCode> {
    let end = offset.saturating_add(len).min(data.len());
    if offset >= end {
        return None;
    }

    let mut matched = 0;
    for (i, &byte) in data[offset..end].iter().enumerate() {
        match byte {
            0x00 => matched += 1,
            0x01 => {
                matched += 1;
                if (START_CODE_MIN..=START_CODE_MAX).contains(&matched) {
                    let index = offset + i;
                    return Some(StartCode::new(index + 1 - matched, matched));
                }
            }
            _ => matched = 0,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_bytes_at_head() {
        let data = vec![0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05];

        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(0, 4))
        );
    }

    #[test]
    fn test_four_bytes_with_offset() {
        let data = vec![
            0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, // 8,
            0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, // 8,
        ];

        // `len` overshoots the slice on purpose, the scan is clamped.
        assert_eq!(
            find_start_code(&data, 4, data.len()),
            Some(StartCode::new(8, 4))
        );
    }

    #[test]
    fn test_three_and_eight_bytes_at_head() {
        let data = vec![0x00, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(0, 3))
        );

        let data = vec![
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // 8,
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ];
        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(0, 8))
        );
    }

    #[test]
    fn test_middle_and_tail() {
        let data = vec![
            0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x01, // 8,
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ];
        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(4, 4))
        );

        let data = vec![0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(4, 4))
        );
    }

    #[test]
    fn test_rejects_short_and_long_runs() {
        let data = vec![0x00, 0x01, 0x02, 0x00, 0x01, 0x02, 0x00, 0x01];
        assert_eq!(find_start_code(&data, 0, data.len()), None);

        let data = vec![
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 8,
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ];
        assert_eq!(find_start_code(&data, 0, data.len()), None);
    }

    #[test]
    fn test_ones_count_towards_the_run() {
        let data = vec![0x00, 0x01, 0x01, 0x01, 0x09];

        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(0, 3))
        );

        let data = vec![0x09, 0x01, 0x00, 0x01, 0x09];
        assert_eq!(
            find_start_code(&data, 0, data.len()),
            Some(StartCode::new(1, 3))
        );
    }

    #[test]
    fn test_empty_range() {
        let data = vec![0x00, 0x00, 0x01];

        assert_eq!(find_start_code(&data, 0, 0), None);
        assert_eq!(find_start_code(&data, 3, 10), None);
        assert_eq!(find_start_code(&[], 0, 4), None);
    }
}
