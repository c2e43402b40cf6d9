//! Stable error codes embedded in error messages and returned by `code()`.

pub const PARSE_MISSING_START_SENTINEL: &str = "PRM_PARSE_001";
pub const PARSE_TOO_SHORT: &str = "PRM_PARSE_002";
pub const PARSE_MISSING_END_SENTINEL: &str = "PRM_PARSE_003";
pub const PARSE_MISSING_SECTION_MARKER: &str = "PRM_PARSE_004";
pub const PARSE_INVALID_PARAMETER_LINE: &str = "PRM_PARSE_005";
pub const PARSE_DUPLICATE_KEY: &str = "PRM_PARSE_006";
pub const PARSE_NUMBER_OUT_OF_RANGE: &str = "PRM_PARSE_007";
pub const PARSE_IO: &str = "PRM_IO_001";

pub const DESC_IO: &str = "PRM_DESC_001";
pub const DESC_YAML: &str = "PRM_DESC_002";
pub const DESC_NOT_A_MAPPING: &str = "PRM_DESC_003";
pub const DESC_INVALID_KEY: &str = "PRM_DESC_004";
pub const DESC_ENTRY_NOT_A_MAPPING: &str = "PRM_DESC_005";
pub const DESC_FIELD_NOT_STRING: &str = "PRM_DESC_006";

pub const DIFF_SINK_ERROR: &str = "PRM_DIFF_001";

pub const REPORT_XLSX: &str = "PRM_REPORT_001";
pub const REPORT_CONFIG: &str = "PRM_REPORT_002";
