pub mod json;
pub mod json_lines;
#[cfg(feature = "xlsx")]
pub mod xlsx;
