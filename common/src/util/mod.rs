pub mod directed_slice;
pub mod logging;
