//! XLSX-backed spreadsheet engine built on `rust_xlsxwriter`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::debug;

use crate::conf::{N_INTEGER_F64_EXACT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX};
use crate::engine::SpreadsheetEngine;
use crate::error::{ModelTableError, ModelTableResult};
use crate::spec::{EnumCellValue, SpecModelTableOptions, SpecModelTableReport, TableRecord};
use crate::table::write_records_into_sheet;
use crate::util::{parse_cell_reference, sanitize_sheet_name};

/// Stateful workbook engine.
///
/// The workbook is buffered in memory until [`Self::close`] is called.
pub struct XlsxWorkbookWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    l_sheet_names: Vec<String>,
    set_sheet_names_existing: BTreeSet<String>,
    n_idx_active: usize,
    if_closed: bool,
}

impl XlsxWorkbookWriter {
    /// Create writer bound to an output path, with no sheets yet.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            l_sheet_names: Vec::new(),
            set_sheet_names_existing: BTreeSet::new(),
            n_idx_active: 0,
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.l_sheet_names
    }

    /// Add a sheet and return its final (sanitized, unique) name.
    ///
    /// The first sheet added becomes the active one.
    pub fn add_sheet(&mut self, name: &str) -> ModelTableResult<String> {
        if self.if_closed {
            return Err(ModelTableError::WorkbookClosed);
        }

        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(name, "_"));
        let mut worksheet = Worksheet::new();
        worksheet.set_name(&sheet_name_unique)?;
        self.workbook.push_worksheet(worksheet);
        self.set_sheet_names_existing.insert(sheet_name_unique.to_lowercase());
        self.l_sheet_names.push(sheet_name_unique.clone());

        if self.l_sheet_names.len() == 1 {
            self.n_idx_active = 0;
        }
        Ok(sheet_name_unique)
    }

    /// Make the sheet at `index` the active one.
    pub fn set_active_sheet(&mut self, index: usize) -> ModelTableResult<()> {
        if index >= self.l_sheet_names.len() {
            return Err(ModelTableError::SheetNotFound(format!("#{index}")));
        }
        if index != self.n_idx_active && self.n_idx_active < self.l_sheet_names.len() {
            self.workbook
                .worksheet_from_index(self.n_idx_active)?
                .set_active(false);
        }
        self.workbook.worksheet_from_index(index)?.set_active(true);
        self.n_idx_active = index;
        Ok(())
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> ModelTableResult<()> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        debug!(path = %self.file_out(), sheets = self.l_sheet_names.len(), "workbook saved");
        Ok(())
    }

    /// Sheet names compare case-insensitively.
    fn derive_unique_sheet_name(&self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(&name.to_lowercase()) {
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let c_suffix = format!("__{n_idx}");
            let base_name: String = name
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len()))
                .collect();
            let candidate = format!("{base_name}{c_suffix}");
            if !self.set_sheet_names_existing.contains(&candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

impl SpreadsheetEngine for XlsxWorkbookWriter {
    fn active_sheet_index(&self) -> usize {
        self.n_idx_active
    }

    fn sheet_name(&self, index: usize) -> String {
        self.l_sheet_names.get(index).cloned().unwrap_or_default()
    }

    fn set_cell_value(
        &mut self,
        sheet_name: &str,
        cell_reference: &str,
        value: &EnumCellValue,
    ) -> ModelTableResult<()> {
        if self.if_closed {
            return Err(ModelTableError::WorkbookClosed);
        }
        let n_idx_sheet = self
            .l_sheet_names
            .iter()
            .position(|c_name| c_name == sheet_name)
            .ok_or_else(|| ModelTableError::SheetNotFound(sheet_name.to_string()))?;
        let (n_row, n_col) = parse_cell_reference(cell_reference)?;

        let worksheet = self.workbook.worksheet_from_index(n_idx_sheet)?;
        match value {
            EnumCellValue::String(val) => {
                worksheet.write_string(n_row, n_col, val)?;
            }
            EnumCellValue::Integer(val) if val.unsigned_abs() <= N_INTEGER_F64_EXACT_MAX => {
                worksheet.write_number(n_row, n_col, *val as f64)?;
            }
            EnumCellValue::Integer(val) => {
                worksheet.write_string(n_row, n_col, val.to_string())?;
            }
            EnumCellValue::Number(val) => {
                worksheet.write_number(n_row, n_col, *val)?;
            }
            EnumCellValue::Boolean(val) => {
                worksheet.write_boolean(n_row, n_col, *val)?;
            }
            EnumCellValue::Record(val) => {
                worksheet.write_string(n_row, n_col, val.to_string())?;
            }
        }
        Ok(())
    }
}

/// Write `records` into a new workbook at `path_file_out` with one sheet.
pub fn write_records_into_file<T: TableRecord>(
    path_file_out: impl Into<PathBuf>,
    sheet_name: &str,
    records: &[T],
    options: Option<&SpecModelTableOptions>,
) -> ModelTableResult<SpecModelTableReport> {
    let mut writer = XlsxWorkbookWriter::new(path_file_out);
    writer.add_sheet(sheet_name)?;
    let report = write_records_into_sheet(Some(&mut writer), records, options)?;
    writer.close()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::SpecFieldDescriptor;

    struct Item {
        name: String,
        qty: i64,
        in_stock: bool,
    }

    impl TableRecord for Item {
        const FIELDS: &'static [SpecFieldDescriptor<Self>] = &[
            SpecFieldDescriptor {
                name: "Name",
                tags: &[("column", "A"), ("columnHeader", "Item")],
                accessor: |r| Some(r.name.clone().into()),
            },
            SpecFieldDescriptor {
                name: "Qty",
                tags: &[("column", "B")],
                accessor: |r| Some(r.qty.into()),
            },
            SpecFieldDescriptor {
                name: "InStock",
                tags: &[("column", "C"), ("columnHeader", "In stock")],
                accessor: |r| Some(r.in_stock.into()),
            },
        ];
    }

    fn read_rows(path: &std::path::Path, sheet_name: &str) -> Vec<Vec<Data>> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range(sheet_name).unwrap();
        range.rows().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn test_write_records_into_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.xlsx");
        let records = vec![
            Item {
                name: "bolt".to_string(),
                qty: 10,
                in_stock: true,
            },
            Item {
                name: "nut".to_string(),
                qty: 0,
                in_stock: false,
            },
        ];

        let report = write_records_into_file(
            &path,
            "Items",
            &records,
            Some(&SpecModelTableOptions::with_header()),
        )
        .unwrap();
        assert_eq!(report.sheet_name, "Items");
        assert_eq!(report.n_cells_written, 9);

        let l_rows = read_rows(&path, "Items");
        assert_eq!(l_rows.len(), 3);
        assert_eq!(
            l_rows[0],
            vec![
                Data::String("Item".to_string()),
                Data::String("Qty".to_string()),
                Data::String("In stock".to_string()),
            ]
        );
        assert_eq!(
            l_rows[1],
            vec![
                Data::String("bolt".to_string()),
                Data::Float(10.0),
                Data::Bool(true),
            ]
        );
        assert_eq!(l_rows[2][0], Data::String("nut".to_string()));
    }

    #[test]
    fn test_write_records_into_file_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.xlsx");
        let records = vec![Item {
            name: "gear".to_string(),
            qty: 3,
            in_stock: true,
        }];

        write_records_into_file(&path, "Plain", &records, None).unwrap();

        let l_rows = read_rows(&path, "Plain");
        assert_eq!(l_rows.len(), 1);
        assert_eq!(l_rows[0][0], Data::String("gear".to_string()));
    }

    #[test]
    fn test_add_sheet_sanitizes_and_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWorkbookWriter::new(dir.path().join("names.xlsx"));

        assert_eq!(writer.add_sheet("a/b").unwrap(), "a_b");
        assert_eq!(writer.add_sheet("a/b").unwrap(), "a_b__2");
        assert_eq!(writer.sheet_names(), &["a_b".to_string(), "a_b__2".to_string()]);
        assert_eq!(writer.active_sheet_index(), 0);

        writer.set_active_sheet(1).unwrap();
        assert_eq!(writer.sheet_name(writer.active_sheet_index()), "a_b__2");
        assert!(writer.set_active_sheet(2).is_err());
    }

    #[test]
    fn test_writer_rejects_unknown_sheet_and_writes_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.xlsx");
        let mut writer = XlsxWorkbookWriter::new(&path);
        writer.add_sheet("Data").unwrap();
        let value = EnumCellValue::Integer(1);

        assert!(matches!(
            writer.set_cell_value("Other", "A1", &value),
            Err(ModelTableError::SheetNotFound(_))
        ));
        writer.set_cell_value("Data", "A1", &value).unwrap();

        writer.close().unwrap();
        writer.close().unwrap();
        assert!(path.exists());
        assert!(matches!(
            writer.set_cell_value("Data", "A2", &value),
            Err(ModelTableError::WorkbookClosed)
        ));
    }

    #[test]
    fn test_writer_without_sheets_reports_skipped_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWorkbookWriter::new(dir.path().join("empty.xlsx"));
        let records = vec![Item {
            name: "pin".to_string(),
            qty: 1,
            in_stock: false,
        }];

        let report = write_records_into_sheet(Some(&mut writer), &records, None).unwrap();

        assert_eq!(report.sheet_name, "");
        assert_eq!(report.n_cells_written, 0);
        assert_eq!(report.warnings.len(), 3);
    }

    #[test]
    fn test_add_sheet_rejected_name_leaves_workbook_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aligned.xlsx");
        let mut writer = XlsxWorkbookWriter::new(&path);

        assert!(matches!(
            writer.add_sheet("'quoted'"),
            Err(ModelTableError::Xlsx(_))
        ));
        assert!(writer.sheet_names().is_empty());

        assert_eq!(writer.add_sheet("Data").unwrap(), "Data");
        writer
            .set_cell_value("Data", "A1", &EnumCellValue::String("hello".to_string()))
            .unwrap();
        writer.close().unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
        let l_rows = read_rows(&path, "Data");
        assert_eq!(l_rows, vec![vec![Data::String("hello".to_string())]]);
    }

    #[test]
    fn test_add_sheet_long_names_stay_unique_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWorkbookWriter::new(dir.path().join("long.xlsx"));
        let c_name = "x".repeat(31);

        let l_names = (0..12)
            .map(|_| writer.add_sheet(&c_name).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(l_names[0], c_name);
        assert_eq!(l_names[1], format!("{}__2", "x".repeat(28)));
        assert_eq!(l_names[10], format!("{}__11", "x".repeat(27)));
        assert!(l_names.iter().all(|name| name.chars().count() <= 31));
        let set_names = l_names.iter().collect::<BTreeSet<_>>();
        assert_eq!(set_names.len(), 12);
        writer.close().unwrap();
    }

    #[test]
    fn test_add_sheet_deduplicates_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWorkbookWriter::new(dir.path().join("case.xlsx"));

        assert_eq!(writer.add_sheet("Data").unwrap(), "Data");
        assert_eq!(writer.add_sheet("data").unwrap(), "data__2");
        assert_eq!(writer.add_sheet("DATA__2").unwrap(), "DATA__2__2");
        writer.close().unwrap();
    }

    #[test]
    fn test_large_integers_are_written_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ints.xlsx");
        let mut writer = XlsxWorkbookWriter::new(&path);
        writer.add_sheet("Ints").unwrap();

        let n_exact = 1i64 << 53;
        writer
            .set_cell_value("Ints", "A1", &EnumCellValue::Integer(n_exact))
            .unwrap();
        writer
            .set_cell_value("Ints", "B1", &EnumCellValue::Integer(n_exact + 1))
            .unwrap();
        writer
            .set_cell_value("Ints", "C1", &EnumCellValue::Integer(i64::MIN))
            .unwrap();
        writer.close().unwrap();

        let l_rows = read_rows(&path, "Ints");
        assert_eq!(
            l_rows[0],
            vec![
                Data::Float(n_exact as f64),
                Data::String("9007199254740993".to_string()),
                Data::String(i64::MIN.to_string()),
            ]
        );
    }
}
