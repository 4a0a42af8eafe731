//! Source workbooks tagged with the fiscal year found in their file name.

use crate::error::{EnergyError, EnergyResult};
use energyboard_sheet::{Book, Sheet, XlsxReadOptions};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}").expect("valid year regex"))
}

/// First 4-digit run in `name`, read as a fiscal year.
pub fn fiscal_year_from_name(name: &str) -> Option<i32> {
    year_pattern().find(name)?.as_str().parse().ok()
}

/// A loaded workbook and the fiscal year it reports.
#[derive(Debug, Clone)]
pub struct Workbook {
    name: String,
    fiscal_year: i32,
    book: Book,
}

impl Workbook {
    /// Open an xlsx export. Sheets are read with their first row as headers.
    pub fn open(path: impl AsRef<Path>) -> EnergyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EnergyError::load(path, "file not found"));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fiscal_year = fiscal_year_from_name(&name)
            .ok_or_else(|| EnergyError::load(path, "no 4-digit fiscal year in file name"))?;

        let book = Book::from_xlsx_with_options(path, XlsxReadOptions::default().with_headers(true))
            .map_err(|e| EnergyError::load(path, e.to_string()))?;

        info!(
            path = %path.display(),
            fiscal_year,
            sheets = book.sheet_count(),
            "loaded workbook"
        );
        Ok(Self {
            name,
            fiscal_year,
            book,
        })
    }

    /// Wrap an in-memory book; the fiscal year is parsed from `name`.
    pub fn from_book(name: &str, book: Book) -> EnergyResult<Self> {
        let fiscal_year = fiscal_year_from_name(name)
            .ok_or_else(|| EnergyError::load(name, "no 4-digit fiscal year in workbook name"))?;
        Ok(Self {
            name: name.to_string(),
            fiscal_year,
            book,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.book.sheet_names()
    }

    /// Sheets in workbook order.
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.book.sheets()
    }
}
