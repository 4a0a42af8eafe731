use thiserror::Error;

/// Errors that can occur while reading or writing workbooks
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Columns not named: {0}")]
    ColumnsNotNamed(String),

    #[error("Duplicate column name: {name}")]
    DuplicateColumnName { name: String },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::XlsxError> for SheetError {
    fn from(err: calamine::XlsxError) -> Self {
        SheetError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Workbook(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
