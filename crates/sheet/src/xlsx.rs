use crate::book::Book;
use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Options for reading Excel files
#[derive(Debug, Clone, Default)]
pub struct XlsxReadOptions {
    /// Whether the first row contains headers
    pub has_headers: bool,
}

impl XlsxReadOptions {
    /// Set whether the first row contains headers
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as days since 1899-12-30
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        // Formula errors (#N/A, #DIV/0!, ...) carry no usable value
        Data::Error(_) => CellValue::Null,
    }
}

fn range_to_sheet(name: &str, range: &Range<Data>, options: &XlsxReadOptions) -> Result<Sheet> {
    let data: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell_value).collect())
        .collect();

    let mut sheet = Sheet::with_name(name);
    *sheet.data_mut() = data;

    if options.has_headers && sheet.row_count() > 0 {
        sheet.name_columns_by_row(0)?;
    }

    Ok(sheet)
}

fn open<P: AsRef<Path>>(path: P) -> Result<Xlsx<BufReader<File>>> {
    Ok(open_workbook(path.as_ref())?)
}

impl Sheet {
    /// Load the first sheet of an Excel file with options
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx_with_options<P: AsRef<Path>>(path: P, options: XlsxReadOptions) -> Result<Self> {
        let mut workbook = open(path)?;

        let Some(first) = workbook.sheet_names().first().cloned() else {
            return Ok(Sheet::new());
        };

        let range = workbook.worksheet_range(&first)?;
        range_to_sheet(&first, &range, &options)
    }

    /// Write sheet data to a worksheet
    fn write_to_worksheet(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(self.name())?;

        for (row_idx, row) in self.data().iter().enumerate() {
            let row_num = row_idx as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num = col_idx as u16;

                match cell {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col_num, *b)?;
                    }
                    CellValue::Int(i) => {
                        // Excel stores all numbers as f64
                        worksheet.write_number(row_num, col_num, *i as f64)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(row_num, col_num, *f)?;
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(row_num, col_num, s)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Book {
    /// Load a book from an Excel file with options
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx_with_options<P: AsRef<Path>>(path: P, options: XlsxReadOptions) -> Result<Self> {
        let mut workbook = open(path)?;

        let sheet_names: Vec<String> = workbook.sheet_names();
        let mut book = Book::new();

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;
            let sheet = range_to_sheet(&sheet_name, &range, &options)?;
            book.add_sheet(&sheet_name, sheet)?;
        }

        Ok(book)
    }

    /// Save the book to an Excel file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();

        for (_, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            sheet.write_to_worksheet(worksheet)?;
        }

        workbook.save(path.as_ref())?;
        Ok(())
    }
}
