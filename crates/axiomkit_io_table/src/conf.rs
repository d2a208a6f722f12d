//! Annotation keys, sheet layout constants and default presets.

use crate::spec::SpecModelTableOptions;

/// Annotation key selecting the target column reference (`"A"`, `"B"`, ...).
pub const C_TAG_COLUMN: &str = "column";
/// Annotation key overriding the header text of a column.
pub const C_TAG_COLUMN_HEADER: &str = "columnHeader";
/// Annotation key labelling inner fields of a nested record.
pub const C_TAG_COLUMN_INNER_VALUE: &str = "columnInnerValue";

/// 1-based row number of the header row.
pub const N_ROW_HEADER: usize = 1;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Largest integer magnitude an Excel number (f64) holds exactly; larger ones are written as text.
pub const N_INTEGER_F64_EXACT_MAX: u64 = 1 << 53;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Fallback name for empty sheet names.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";

/// Build default table options (no header, lenient writes).
pub fn derive_default_model_table_options() -> SpecModelTableOptions {
    SpecModelTableOptions::default()
}
