//! `axiomkit_io_table` v1:
//! Lay out typed records as spreadsheet tables.
//!
//! Modules:
//! - `conf`   : annotation keys, constants and default presets
//! - `spec`   : record descriptions, values, options and reports
//! - `util`   : tag index, value normalizer and cell addressing
//! - `engine` : spreadsheet engine boundary and in-memory engine
//! - `table`  : table builder driving an engine
//! - `writer` : XLSX workbook engine
pub mod conf;
pub mod engine;
pub mod error;
pub mod spec;
pub mod table;
pub mod util;
pub mod writer;

pub use conf::{
    C_TAG_COLUMN, C_TAG_COLUMN_HEADER, C_TAG_COLUMN_INNER_VALUE, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, N_ROW_HEADER,
};
pub use engine::{MemorySheetEngine, SpreadsheetEngine};
pub use error::{ModelTableError, ModelTableResult};
pub use spec::{
    EnumCellValue, EnumFieldValue, SpecFieldAnnotationMap, SpecFieldDescriptor,
    SpecModelTableCol, SpecModelTableHeaderCol, SpecModelTableOptions, SpecModelTableReport,
    SpecModelTableRow, SpecRecordField, SpecRecordValue, TableRecord,
};
pub use table::{construct_header, construct_rows, write_records_into_sheet};
pub use util::{
    derive_cell_reference, extract_annotations, extract_record_annotations, normalize_column,
    parse_cell_reference, sanitize_sheet_name,
};
pub use writer::{XlsxWorkbookWriter, write_records_into_file};
