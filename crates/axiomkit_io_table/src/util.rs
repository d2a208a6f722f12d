//! Stateless helpers used by the table builder and engines.

use crate::conf::{
    C_SHEET_NAME_DEFAULT, C_TAG_COLUMN_INNER_VALUE, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::error::{ModelTableError, ModelTableResult};
use crate::spec::{
    EnumCellValue, EnumFieldValue, SpecFieldAnnotationMap, SpecModelTableCol, SpecRecordValue,
    TableRecord, derive_tag_value,
};

////////////////////////////////////////////////////////////////////////////////
// #region TagIndex

/// Collect `field name -> annotation` pairs for `tag_key` from a field value.
///
/// Optionals are dereferenced first. Anything that is not a record yields an
/// empty map.
pub fn extract_annotations(value: &EnumFieldValue, tag_key: &str) -> SpecFieldAnnotationMap {
    match derive_record_ref(value) {
        Some(record) => extract_record_value_annotations(record, tag_key),
        None => SpecFieldAnnotationMap::new(),
    }
}

/// Collect `field name -> annotation` pairs for `tag_key` from a nested record snapshot.
pub fn extract_record_value_annotations(
    record: &SpecRecordValue,
    tag_key: &str,
) -> SpecFieldAnnotationMap {
    let mut dict_tags = SpecFieldAnnotationMap::new();
    for field in &record.fields {
        if let Some(c_tag) = derive_tag_value(field.tags, tag_key) {
            dict_tags.insert(field.name, c_tag);
        }
    }
    dict_tags
}

/// Collect `field name -> annotation` pairs for `tag_key` from a record type.
pub fn extract_record_annotations<T: TableRecord>(tag_key: &str) -> SpecFieldAnnotationMap {
    let mut dict_tags = SpecFieldAnnotationMap::new();
    for field in T::FIELDS {
        if let Some(c_tag) = field.tag(tag_key) {
            dict_tags.insert(field.name, c_tag);
        }
    }
    dict_tags
}

/// Read field `field_name` from `record`; `None` if undeclared or unreadable.
pub fn derive_field_value<T: TableRecord>(
    record: &T,
    field_name: &str,
) -> Option<EnumFieldValue> {
    T::FIELDS
        .iter()
        .find(|field| field.name == field_name)
        .and_then(|field| (field.accessor)(record))
}

fn derive_record_ref(value: &EnumFieldValue) -> Option<&SpecRecordValue> {
    match value {
        EnumFieldValue::Record(record) => Some(record),
        EnumFieldValue::Optional(Some(val)) => derive_record_ref(val),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueNormalizer

/// Build one column entry, normalizing `value` into a spreadsheet-safe scalar.
///
/// - unset optional: empty string
/// - set optional: the referenced value as-is
/// - nested record with `columnInnerValue` fields: flattened label string
/// - nested record without them: the record unchanged
/// - scalar: unchanged
pub fn normalize_column(
    col_name: &str,
    field_name: &str,
    value: EnumFieldValue,
) -> SpecModelTableCol {
    let value = match value {
        EnumFieldValue::Record(record) => convert_record_to_cell_value(record),
        other => convert_field_value_as_is(other),
    };

    SpecModelTableCol {
        col_name: col_name.to_string(),
        field_name: field_name.to_string(),
        value,
    }
}

/// Flatten a nested record through its inner-value annotations.
pub fn convert_record_to_cell_value(record: SpecRecordValue) -> EnumCellValue {
    let dict_inner_labels = extract_record_value_annotations(&record, C_TAG_COLUMN_INNER_VALUE);
    if dict_inner_labels.is_empty() {
        return EnumCellValue::Record(record);
    }

    let mut c_parsed = String::new();
    for (field_name, c_label) in dict_inner_labels.iter() {
        if let Some(value) = record.get(field_name) {
            c_parsed = format!("{c_parsed} {c_label} {value} \n");
        }
    }
    EnumCellValue::String(c_parsed)
}

fn convert_field_value_as_is(value: EnumFieldValue) -> EnumCellValue {
    match value {
        EnumFieldValue::String(val) => EnumCellValue::String(val),
        EnumFieldValue::Integer(val) => EnumCellValue::Integer(val),
        EnumFieldValue::Number(val) => EnumCellValue::Number(val),
        EnumFieldValue::Boolean(val) => EnumCellValue::Boolean(val),
        EnumFieldValue::Optional(None) => EnumCellValue::String(String::new()),
        EnumFieldValue::Optional(Some(val)) => convert_field_value_as_is(*val),
        EnumFieldValue::Record(record) => EnumCellValue::Record(record),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReference

/// Build an A1-style address from a column reference and a 1-based row number.
pub fn derive_cell_reference(col_name: &str, row_num: usize) -> String {
    format!("{col_name}{row_num}")
}

/// Parse an A1-style address (`"B12"`, `"$B$12"`) into zero-based `(row, col)`.
pub fn parse_cell_reference(cell_reference: &str) -> ModelTableResult<(u32, u16)> {
    let c_ref = cell_reference.trim().replace('$', "");
    let n_idx_split = c_ref
        .find(|chr: char| !chr.is_ascii_alphabetic())
        .unwrap_or(c_ref.len());
    let (c_col, c_row) = c_ref.split_at(n_idx_split);

    if c_col.is_empty() || c_row.is_empty() || !c_row.chars().all(|chr| chr.is_ascii_digit()) {
        return Err(ModelTableError::CellReference(cell_reference.to_string()));
    }

    let n_col_idx = convert_column_name_to_index(c_col)
        .ok_or_else(|| ModelTableError::CellReference(cell_reference.to_string()))?;
    let n_row_num = c_row
        .parse::<usize>()
        .map_err(|_| ModelTableError::CellReference(cell_reference.to_string()))?;
    if n_row_num == 0 || n_row_num > N_NROWS_EXCEL_MAX {
        return Err(ModelTableError::CellReference(cell_reference.to_string()));
    }

    let n_row_idx = u32::try_from(n_row_num - 1)
        .map_err(|_| ModelTableError::CellReference(cell_reference.to_string()))?;
    Ok((n_row_idx, n_col_idx))
}

/// Convert a column name (`"A"`, `"AB"`) to a zero-based index within Excel limits.
pub fn convert_column_name_to_index(col_name: &str) -> Option<u16> {
    if col_name.is_empty() {
        return None;
    }

    let mut n_col_num = 0usize;
    for chr in col_name.chars() {
        if !chr.is_ascii_alphabetic() {
            return None;
        }
        let n_digit = (chr.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n_col_num = n_col_num.checked_mul(26)?.checked_add(n_digit)?;
        if n_col_num > N_NCOLS_EXCEL_MAX {
            return None;
        }
    }

    u16::try_from(n_col_num - 1).ok()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
