mod nal_type;
mod nal_unit;
mod start_code;

pub use nal_type::{BufferFlag, NalType};
pub use nal_unit::{NalHeader, NalUnit, NalUnitHeader};
pub use start_code::{find_start_code, StartCode, START_CODE_MAX, START_CODE_MIN};
