use common::START_CODE_MAX;

/// Scratch buffer sizing for [`NalParser`](crate::NalParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Bytes allocated up front. Never less than one maximal start code, so the leading start code
    /// always fits the first read.
    pub initial_capacity: usize,

    /// Upper bound for buffer growth. `None` lets a unit grow without limit.
    pub max_buffer: Option<usize>,
}

impl ParserConfig {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = Some(max_buffer);
        self
    }

    pub(crate) fn capacity(&self) -> usize {
        self.initial_capacity.max(START_CODE_MAX)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_CAPACITY,
            max_buffer: None,
        }
    }
}
