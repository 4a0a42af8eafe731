use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use std::collections::HashMap;

/// A sheet representing a 2D grid of cells (row-major storage)
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
    column_names: Option<Vec<String>>,
    column_index: Option<HashMap<String, usize>>,
    header_row: Option<usize>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
            column_names: None,
            column_index: None,
            header_row: None,
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let mut sheet = Self::new();
        sheet.data = converted;
        sheet
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows (including a header row, if any)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Check if the sheet has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Result<&Vec<CellValue>> {
        self.data.get(index).ok_or(SheetError::RowIndexOutOfBounds {
            index,
            count: self.data.len(),
        })
    }

    /// Get the raw cell data
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable access to the raw cell data
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }

    // ===== Named Access =====

    /// Use the specified row as column headers.
    ///
    /// Blank headers become `Unnamed: <index>` and repeated headers get a
    /// `.1`, `.2`, ... suffix, so exports with sloppy header rows still load.
    pub fn name_columns_by_row(&mut self, row_index: usize) -> Result<()> {
        let header_row = self.row(row_index)?;

        let mut names: Vec<String> = Vec::with_capacity(header_row.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (i, cell) in header_row.iter().enumerate() {
            let base = match cell.as_text() {
                Some(text) => text.trim().to_string(),
                None => format!("Unnamed: {i}"),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            names.push(name);
        }

        self.set_column_names(names)?;
        self.header_row = Some(row_index);
        Ok(())
    }

    /// Rename every named column with `f`.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::DuplicateColumnName` if two columns end up with the same name.
    pub fn rename_columns<F>(&mut self, f: F) -> Result<()>
    where
        F: Fn(&str) -> String,
    {
        let names = self.column_names.as_ref().ok_or_else(|| {
            SheetError::ColumnsNotNamed("Call name_columns_by_row() first".to_string())
        })?;
        let renamed: Vec<String> = names.iter().map(|n| f(n)).collect();
        self.set_column_names(renamed)
    }

    /// Get column names (if set)
    #[must_use]
    pub fn column_names(&self) -> Option<&Vec<String>> {
        self.column_names.as_ref()
    }

    /// Check whether a named column exists
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index
            .as_ref()
            .is_some_and(|index| index.contains_key(name))
    }

    /// Get the column position by name
    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.column_index
            .as_ref()
            .ok_or_else(|| {
                SheetError::ColumnsNotNamed("Call name_columns_by_row() first".to_string())
            })?
            .get(name)
            .copied()
            .ok_or_else(|| SheetError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Iterate over the data rows below the header row.
    ///
    /// Sheets without named columns yield every row.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        let skip = self.header_row.map_or(0, |h| h + 1);
        self.data.iter().skip(skip).map(move |cells| Record {
            index: self.column_index.as_ref(),
            cells,
        })
    }

    fn set_column_names(&mut self, names: Vec<String>) -> Result<()> {
        let mut index_map = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index_map.insert(name.clone(), i).is_some() {
                return Err(SheetError::DuplicateColumnName { name: name.clone() });
            }
        }

        self.column_names = Some(names);
        self.column_index = Some(index_map);
        Ok(())
    }
}

static NULL_CELL: CellValue = CellValue::Null;

/// One data row of a sheet, addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    index: Option<&'a HashMap<String, usize>>,
    cells: &'a [CellValue],
}

impl<'a> Record<'a> {
    /// Get a cell by column name.
    ///
    /// Returns `None` when the column does not exist. Rows shorter than the
    /// header read as null in the missing positions.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let col = *self.index?.get(column)?;
        Some(self.cells.get(col).unwrap_or(&NULL_CELL))
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}
