use rust_xlsxwriter::XlsxError;
use thiserror::Error;

pub type ModelTableResult<T> = Result<T, ModelTableError>;

#[derive(Error, Debug)]
pub enum ModelTableError {
    /// The target engine handle is absent.
    #[error("invalid target: no spreadsheet engine")]
    InvalidTarget,

    #[error("failed to write cell {cell_reference}: {message}")]
    CellWrite {
        cell_reference: String,
        message: String,
    },

    #[error("invalid cell reference: {0:?}")]
    CellReference(String),

    #[error("sheet not found: {0:?}")]
    SheetNotFound(String),

    #[error("cannot write after close()")]
    WorkbookClosed,

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
}
