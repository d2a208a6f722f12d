//! Spreadsheet engine boundary and an in-memory engine.

use std::collections::BTreeMap;

use crate::conf::C_SHEET_NAME_DEFAULT;
use crate::error::{ModelTableError, ModelTableResult};
use crate::spec::EnumCellValue;
use crate::util::parse_cell_reference;

/// Operations the table builder needs from a spreadsheet engine.
pub trait SpreadsheetEngine {
    /// Index of the currently active sheet.
    fn active_sheet_index(&self) -> usize;

    /// Name of the sheet at `index`; empty when the index is unknown.
    fn sheet_name(&self, index: usize) -> String;

    /// Store `value` at `cell_reference` (A1-style) on sheet `sheet_name`.
    fn set_cell_value(
        &mut self,
        sheet_name: &str,
        cell_reference: &str,
        value: &EnumCellValue,
    ) -> ModelTableResult<()>;
}

type SheetCells = BTreeMap<(u32, u16), EnumCellValue>;

/// Engine keeping every sheet as a sparse cell map in memory.
#[derive(Debug, Clone)]
pub struct MemorySheetEngine {
    l_sheets: Vec<(String, SheetCells)>,
    n_idx_active: usize,
}

impl Default for MemorySheetEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySheetEngine {
    /// Create an engine holding a single empty `Sheet1`.
    pub fn new() -> Self {
        Self {
            l_sheets: vec![(C_SHEET_NAME_DEFAULT.to_string(), BTreeMap::new())],
            n_idx_active: 0,
        }
    }

    /// Append an empty sheet and return its index. Existing names are reused.
    pub fn add_sheet(&mut self, name: &str) -> usize {
        if let Some(n_idx) = self.find_sheet(name) {
            return n_idx;
        }
        self.l_sheets.push((name.to_string(), BTreeMap::new()));
        self.l_sheets.len() - 1
    }

    /// Make the sheet at `index` active.
    pub fn set_active_sheet(&mut self, index: usize) -> ModelTableResult<()> {
        if index >= self.l_sheets.len() {
            return Err(ModelTableError::SheetNotFound(format!("#{index}")));
        }
        self.n_idx_active = index;
        Ok(())
    }

    /// Return the value stored at `cell_reference`, if any.
    pub fn get_cell_value(
        &self,
        sheet_name: &str,
        cell_reference: &str,
    ) -> Option<&EnumCellValue> {
        let cells = &self.l_sheets[self.find_sheet(sheet_name)?].1;
        let n_pos = parse_cell_reference(cell_reference).ok()?;
        cells.get(&n_pos)
    }

    /// Return the sheet as dense text rows, up to the last used row and column.
    ///
    /// Empty cells become empty strings.
    pub fn rows(&self, sheet_name: &str) -> Vec<Vec<String>> {
        let Some(n_idx) = self.find_sheet(sheet_name) else {
            return vec![];
        };
        let cells = &self.l_sheets[n_idx].1;
        let Some(n_row_max) = cells.keys().map(|(row, _)| *row).max() else {
            return vec![];
        };
        let n_col_max = cells.keys().map(|(_, col)| *col).max().unwrap_or(0);

        (0..=n_row_max)
            .map(|n_row| {
                (0..=n_col_max)
                    .map(|n_col| {
                        cells
                            .get(&(n_row, n_col))
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    fn find_sheet(&self, name: &str) -> Option<usize> {
        self.l_sheets.iter().position(|(c_name, _)| c_name == name)
    }
}

impl SpreadsheetEngine for MemorySheetEngine {
    fn active_sheet_index(&self) -> usize {
        self.n_idx_active
    }

    fn sheet_name(&self, index: usize) -> String {
        self.l_sheets
            .get(index)
            .map(|(c_name, _)| c_name.clone())
            .unwrap_or_default()
    }

    fn set_cell_value(
        &mut self,
        sheet_name: &str,
        cell_reference: &str,
        value: &EnumCellValue,
    ) -> ModelTableResult<()> {
        let n_idx = self
            .find_sheet(sheet_name)
            .ok_or_else(|| ModelTableError::SheetNotFound(sheet_name.to_string()))?;
        let n_pos = parse_cell_reference(cell_reference)?;
        self.l_sheets[n_idx].1.insert(n_pos, value.clone());
        Ok(())
    }
}
