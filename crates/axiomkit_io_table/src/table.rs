//! Table builder: lays records out as a header row plus data rows and drives
//! the spreadsheet engine to write them.

use tracing::{debug, warn};

use crate::conf::{
    C_TAG_COLUMN, C_TAG_COLUMN_HEADER, N_ROW_HEADER, derive_default_model_table_options,
};
use crate::engine::SpreadsheetEngine;
use crate::error::{ModelTableError, ModelTableResult};
use crate::spec::{
    EnumCellValue, SpecModelTableHeaderCol, SpecModelTableOptions, SpecModelTableReport,
    SpecModelTableRow, TableRecord,
};
use crate::util::{
    derive_cell_reference, derive_field_value, extract_record_annotations, normalize_column,
};

/// Write `records` into the engine's active sheet.
///
/// With `if_has_header` the header occupies row 1 and data starts at row 2;
/// otherwise data starts at row 1. Only an absent engine is a hard error
/// unless `if_strict` is set, in which case the first failed cell write
/// aborts the call. Cells already written stay written.
pub fn write_records_into_sheet<E, T>(
    engine: Option<&mut E>,
    records: &[T],
    options: Option<&SpecModelTableOptions>,
) -> ModelTableResult<SpecModelTableReport>
where
    E: SpreadsheetEngine + ?Sized,
    T: TableRecord,
{
    let Some(engine) = engine else {
        return Err(ModelTableError::InvalidTarget);
    };
    let options = options
        .copied()
        .unwrap_or_else(derive_default_model_table_options);

    let l_rows = construct_rows(records);

    let n_idx_sheet = engine.active_sheet_index();
    let sheet_name = engine.sheet_name(n_idx_sheet);

    let mut report = SpecModelTableReport {
        sheet_name: sheet_name.clone(),
        n_rows_data: l_rows.len(),
        ..Default::default()
    };

    if options.if_has_header {
        report.n_rows_header = 1;
        for header_col in construct_header::<T>() {
            let cell_reference = derive_cell_reference(&header_col.col_name, N_ROW_HEADER);
            write_cell(
                &mut *engine,
                &sheet_name,
                &cell_reference,
                &EnumCellValue::String(header_col.text),
                options.if_strict,
                &mut report,
            )?;
        }
    }

    for row in &l_rows {
        let n_row_num = derive_data_row_num(row.index, options.if_has_header);
        for col in &row.cols {
            let cell_reference = derive_cell_reference(&col.col_name, n_row_num);
            write_cell(
                &mut *engine,
                &sheet_name,
                &cell_reference,
                &col.value,
                options.if_strict,
                &mut report,
            )?;
        }
    }

    debug!(
        sheet = %report.sheet_name,
        rows_header = report.n_rows_header,
        rows_data = report.n_rows_data,
        cells = report.n_cells_written,
        warnings = report.warnings.len(),
        "records written"
    );
    Ok(report)
}

/// Lay out one row per record, in input order.
///
/// Each row holds the readable fields carrying a `column` annotation; rows
/// without any are kept with no column entries.
pub fn construct_rows<T: TableRecord>(records: &[T]) -> Vec<SpecModelTableRow> {
    let dict_columns = extract_record_annotations::<T>(C_TAG_COLUMN);

    records
        .iter()
        .enumerate()
        .map(|(n_idx, record)| SpecModelTableRow {
            index: n_idx,
            cols: dict_columns
                .iter()
                .filter_map(|(field_name, col_name)| {
                    derive_field_value(record, field_name)
                        .map(|value| normalize_column(col_name, field_name, value))
                })
                .collect(),
        })
        .collect()
}

/// Header cells for every `column`-annotated field of `T`.
pub fn construct_header<T: TableRecord>() -> Vec<SpecModelTableHeaderCol> {
    let dict_columns = extract_record_annotations::<T>(C_TAG_COLUMN);
    let dict_headers = extract_record_annotations::<T>(C_TAG_COLUMN_HEADER);

    dict_columns
        .iter()
        .map(|(field_name, col_name)| SpecModelTableHeaderCol {
            col_name: col_name.to_string(),
            field_name: field_name.to_string(),
            text: dict_headers.get(field_name).unwrap_or(field_name).to_string(),
        })
        .collect()
}

/// 1-based sheet row for the record at 0-based `index`.
pub fn derive_data_row_num(index: usize, if_has_header: bool) -> usize {
    if if_has_header { index + 2 } else { index + 1 }
}

fn write_cell<E: SpreadsheetEngine + ?Sized>(
    engine: &mut E,
    sheet_name: &str,
    cell_reference: &str,
    value: &EnumCellValue,
    if_strict: bool,
    report: &mut SpecModelTableReport,
) -> ModelTableResult<()> {
    match engine.set_cell_value(sheet_name, cell_reference, value) {
        Ok(()) => {
            report.n_cells_written += 1;
            Ok(())
        }
        Err(err) if if_strict => Err(ModelTableError::CellWrite {
            cell_reference: cell_reference.to_string(),
            message: err.to_string(),
        }),
        Err(err) => {
            warn!(sheet = sheet_name, cell = cell_reference, error = %err, "cell write skipped");
            report.warn(format!("Cell {cell_reference} skipped: {err}"));
            Ok(())
        }
    }
}
