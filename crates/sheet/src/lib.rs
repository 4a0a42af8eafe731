//! Workbook/sheet layer for energyboard
//!
//! Reads multi-sheet spreadsheet exports into an ordered [`Book`] of raw
//! [`Sheet`]s. Cells stay loosely typed here ([`CellValue`]); coercion into
//! typed tables happens in `energyboard-core`.
//!
//! # Examples
//!
//! ```
//! use energyboard_sheet::{Book, Sheet};
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["Property Name", "kWh", "Total Amount"],
//!     vec!["Main St", "120", "31.50"],
//! ]);
//! sheet.name_columns_by_row(0).unwrap();
//!
//! let mut book = Book::new();
//! book.add_sheet("2023-Jan", sheet).unwrap();
//!
//! let record = book.get_sheet("2023-Jan").unwrap().records().next().unwrap();
//! assert_eq!(record.get("kWh").unwrap().to_numeric(), Some(120.0));
//! ```

mod book;
mod cell;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet and row types.
pub use sheet::{Record, Sheet};
/// Re-export XLSX read options.
pub use xlsx::XlsxReadOptions;
