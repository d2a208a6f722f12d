//! Shared model-table specification models.

use std::fmt;

////////////////////////////////////////////////////////////////////////////////
// #region RecordDescription

/// Accessor reading one field from a record instance.
///
/// Returns `None` when the field cannot be read from this instance.
pub type FnFieldAccessor<T> = fn(&T) -> Option<EnumFieldValue>;

/// One entry of a record type's field descriptor table.
pub struct SpecFieldDescriptor<T> {
    /// Field name, also the default header text.
    pub name: &'static str,
    /// Field annotations as `(key, value)` pairs.
    pub tags: &'static [(&'static str, &'static str)],
    /// Reads the field value from a record.
    pub accessor: FnFieldAccessor<T>,
}

impl<T> SpecFieldDescriptor<T> {
    /// Return the non-empty annotation stored under `key`.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        derive_tag_value(self.tags, key)
    }
}

impl<T> fmt::Debug for SpecFieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecFieldDescriptor")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Record type that can be laid out as a table row.
///
/// `FIELDS` is declared once per type; its order is the order used for
/// headers and for flattened inner values.
pub trait TableRecord: Sized + 'static {
    /// Ordered field descriptor table.
    const FIELDS: &'static [SpecFieldDescriptor<Self>];
}

pub(crate) fn derive_tag_value(
    tags: &'static [(&'static str, &'static str)],
    key: &str,
) -> Option<&'static str> {
    tags.iter()
        .find(|(c_key, c_value)| *c_key == key && !c_value.is_empty())
        .map(|(_, c_value)| *c_value)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FieldValue

/// Raw field value as read by a descriptor accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFieldValue {
    /// Text value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Optional value; `None` is the unset case.
    Optional(Option<Box<EnumFieldValue>>),
    /// Nested record.
    Record(SpecRecordValue),
}

impl EnumFieldValue {
    /// Snapshot a nested record as a field value.
    pub fn record<R: TableRecord>(record: &R) -> Self {
        EnumFieldValue::Record(SpecRecordValue::from_record(record))
    }
}

impl fmt::Display for EnumFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumFieldValue::String(val) => f.write_str(val),
            EnumFieldValue::Integer(val) => write!(f, "{val}"),
            EnumFieldValue::Number(val) => write!(f, "{val}"),
            EnumFieldValue::Boolean(val) => write!(f, "{val}"),
            EnumFieldValue::Optional(None) => Ok(()),
            EnumFieldValue::Optional(Some(val)) => write!(f, "{val}"),
            EnumFieldValue::Record(val) => write!(f, "{val}"),
        }
    }
}

impl From<String> for EnumFieldValue {
    fn from(value: String) -> Self {
        EnumFieldValue::String(value)
    }
}

impl From<&str> for EnumFieldValue {
    fn from(value: &str) -> Self {
        EnumFieldValue::String(value.to_string())
    }
}

impl From<i64> for EnumFieldValue {
    fn from(value: i64) -> Self {
        EnumFieldValue::Integer(value)
    }
}

impl From<i32> for EnumFieldValue {
    fn from(value: i32) -> Self {
        EnumFieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for EnumFieldValue {
    fn from(value: u32) -> Self {
        EnumFieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for EnumFieldValue {
    fn from(value: f64) -> Self {
        EnumFieldValue::Number(value)
    }
}

impl From<f32> for EnumFieldValue {
    fn from(value: f32) -> Self {
        EnumFieldValue::Number(f64::from(value))
    }
}

impl From<bool> for EnumFieldValue {
    fn from(value: bool) -> Self {
        EnumFieldValue::Boolean(value)
    }
}

impl From<SpecRecordValue> for EnumFieldValue {
    fn from(value: SpecRecordValue) -> Self {
        EnumFieldValue::Record(value)
    }
}

impl<V: Into<EnumFieldValue>> From<Option<V>> for EnumFieldValue {
    fn from(value: Option<V>) -> Self {
        EnumFieldValue::Optional(value.map(|val| Box::new(val.into())))
    }
}

/// Snapshot of a nested record: its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRecordValue {
    /// Rust type name of the nested record.
    pub type_name: &'static str,
    /// Field entries in declaration order.
    pub fields: Vec<SpecRecordField>,
}

/// One field of a [`SpecRecordValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRecordField {
    /// Field name.
    pub name: &'static str,
    /// Field annotations as `(key, value)` pairs.
    pub tags: &'static [(&'static str, &'static str)],
    /// Field value; `None` when the accessor could not read it.
    pub value: Option<EnumFieldValue>,
}

impl SpecRecordValue {
    /// Read every declared field of `record`.
    pub fn from_record<R: TableRecord>(record: &R) -> Self {
        Self {
            type_name: std::any::type_name::<R>(),
            fields: R::FIELDS
                .iter()
                .map(|field| SpecRecordField {
                    name: field.name,
                    tags: field.tags,
                    value: (field.accessor)(record),
                })
                .collect(),
        }
    }

    /// Return the value of field `name`, if declared and readable.
    pub fn get(&self, name: &str) -> Option<&EnumFieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_ref())
    }
}

impl fmt::Display for SpecRecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_body = self
            .fields
            .iter()
            .filter_map(|field| field.value.as_ref().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{{{c_body}}}")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableLayout

/// Normalized value handed to the spreadsheet engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Text value; also the empty string for unset optionals.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Nested record without inner-value annotations, passed through as-is.
    Record(SpecRecordValue),
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumCellValue::String(val) => f.write_str(val),
            EnumCellValue::Integer(val) => write!(f, "{val}"),
            EnumCellValue::Number(val) => write!(f, "{val}"),
            EnumCellValue::Boolean(val) => write!(f, "{val}"),
            EnumCellValue::Record(val) => write!(f, "{val}"),
        }
    }
}

/// Ordered mapping from field name to annotation value for one key.
///
/// Holds at most one entry per field name; iteration follows declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFieldAnnotationMap {
    entries: Vec<(&'static str, &'static str)>,
}

impl SpecFieldAnnotationMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `field_name -> value`; returns `false` if the field is already present.
    pub fn insert(&mut self, field_name: &'static str, value: &'static str) -> bool {
        if self.contains(field_name) {
            return false;
        }
        self.entries.push((field_name, value));
        true
    }

    /// Return the annotation for `field_name`.
    pub fn get(&self, field_name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c_name, _)| *c_name == field_name)
            .map(|(_, c_value)| *c_value)
    }

    /// Return whether `field_name` has an entry.
    pub fn contains(&self, field_name: &str) -> bool {
        self.entries.iter().any(|(c_name, _)| *c_name == field_name)
    }

    /// Number of annotated fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether no field carries the annotation.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(field_name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

/// One column entry of a data row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecModelTableCol {
    /// Column reference, e.g. `"A"`.
    pub col_name: String,
    /// Source field name.
    pub field_name: String,
    /// Normalized value.
    pub value: EnumCellValue,
}

/// One data row: input position plus its column entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecModelTableRow {
    /// 0-based position in the input sequence.
    pub index: usize,
    /// Column entries; empty when no annotated field was readable.
    pub cols: Vec<SpecModelTableCol>,
}

/// One header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecModelTableHeaderCol {
    /// Column reference, e.g. `"A"`.
    pub col_name: String,
    /// Source field name.
    pub field_name: String,
    /// Header text: `columnHeader` annotation or the field name.
    pub text: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Per-call options for writing records into a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecModelTableOptions {
    /// Emit a header row at row 1 and shift data rows down by one.
    pub if_has_header: bool,
    /// Abort on the first failed cell write instead of recording a warning.
    pub if_strict: bool,
}

impl SpecModelTableOptions {
    /// Options with a header row and lenient writes.
    pub fn with_header() -> Self {
        Self {
            if_has_header: true,
            ..Default::default()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecModelTableReport {
    /// Sheet the call wrote into.
    pub sheet_name: String,
    /// Number of header rows emitted (0 or 1).
    pub n_rows_header: usize,
    /// Number of data rows laid out, one per input record.
    pub n_rows_data: usize,
    /// Number of cells the engine accepted.
    pub n_cells_written: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecModelTableReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
