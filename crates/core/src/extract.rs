//! Month extraction: one typed table per billing sheet of a workbook.

use crate::entity::normalize_cell;
use crate::model::{Grouping, Unit, TOTAL_AMOUNT};
use crate::table::{Column, Period, Table};
use crate::workbook::Workbook;
use energyboard_sheet::{CellValue, Record, Sheet};
use tracing::{debug, warn};

const PROPERTY_NAME: &str = "Property_Name";
const SERVICE_ADDRESS: &str = "Service_Address";

/// Whether a sheet belongs to the workbook's fiscal year.
///
/// Fiscal years straddle a calendar boundary, so sheets labelled with the
/// prior year count too.
pub fn is_fiscal_sheet(sheet_name: &str, fiscal_year: i32) -> bool {
    let current = format!("{fiscal_year}-");
    let prior = format!("{}-", fiscal_year - 1);
    sheet_name.contains(&current) || sheet_name.contains(&prior)
}

/// Billing period of a sheet: trailing 3 characters are the month, leading 4 the year.
pub fn sheet_period(sheet_name: &str) -> Period {
    let chars: Vec<char> = sheet_name.chars().collect();
    let month: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    let year: String = chars.iter().take(4).collect();
    Period::new(month, year)
}

/// Extract one table per fiscal-year sheet of `workbook`, in workbook order.
///
/// An empty result is valid: it means no sheet matched the fiscal year.
pub fn extract_months(workbook: &Workbook, unit: Unit) -> Vec<Table> {
    let fiscal_year = workbook.fiscal_year();
    let mut months = Vec::new();

    for (name, sheet) in workbook.sheets() {
        if !is_fiscal_sheet(name, fiscal_year) {
            debug!(workbook = workbook.name(), sheet = name, "skipping sheet outside fiscal year");
            continue;
        }
        if let Some(table) = extract_sheet(name, sheet, unit) {
            months.push(table);
        }
    }

    debug!(
        workbook = workbook.name(),
        fiscal_year,
        months = months.len(),
        "extracted monthly tables"
    );
    months
}

/// Rows of a sheet that did not make it into its table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DroppedRows {
    /// Numeric usage but neither a property name nor a service address.
    no_identity: usize,
    /// Usage missing or not numeric, including blank rows.
    no_usage: usize,
}

/// Extract one sheet into a monthly table keyed by property.
///
/// Returns `None` when the sheet lacks the identity or unit column.
pub fn extract_sheet(name: &str, sheet: &Sheet, unit: Unit) -> Option<Table> {
    let (table, dropped) = extract_rows(name, sheet, unit)?;
    if dropped.no_identity > 0 {
        warn!(
            sheet = name,
            rows = dropped.no_identity,
            "dropped rows without property name or service address"
        );
    }
    if dropped.no_usage > 0 {
        debug!(sheet = name, rows = dropped.no_usage, "dropped rows without numeric usage");
    }
    Some(table)
}

fn extract_rows(name: &str, sheet: &Sheet, unit: Unit) -> Option<(Table, DroppedRows)> {
    let mut sheet = sheet.clone();
    if sheet.column_names().is_none() {
        if sheet.is_empty() {
            debug!(sheet = name, "skipping empty sheet");
            return None;
        }
        sheet.name_columns_by_row(0).ok()?;
    }
    if let Err(err) = sheet.rename_columns(|header| header.replace(' ', "_")) {
        warn!(sheet = name, error = %err, "skipping sheet with clashing headers");
        return None;
    }

    let Some(unit_col) = find_column(&sheet, unit.label()) else {
        warn!(sheet = name, unit = unit.label(), "skipping sheet without unit column");
        return None;
    };
    let name_col = find_column(&sheet, PROPERTY_NAME);
    let address_col = find_column(&sheet, SERVICE_ADDRESS);
    if name_col.is_none() && address_col.is_none() {
        warn!(sheet = name, "skipping sheet without property name or service address");
        return None;
    }
    let amount_col = find_column(&sheet, TOTAL_AMOUNT);

    let period = sheet_period(name);
    let mut table = Table::new(
        Grouping::Property,
        unit,
        vec![Column::quantity(period.clone()), Column::monetary(period)],
    );

    let mut dropped = DroppedRows::default();
    for record in sheet.records() {
        let Some(usage) = record.get(&unit_col).and_then(CellValue::to_numeric) else {
            dropped.no_usage += 1;
            continue;
        };
        let Some(key) = cell(&record, name_col.as_deref())
            .and_then(normalize_cell)
            .or_else(|| cell(&record, address_col.as_deref()).and_then(normalize_cell))
            .filter(|key| !key.is_empty())
        else {
            dropped.no_identity += 1;
            continue;
        };
        let amount = cell(&record, amount_col.as_deref()).and_then(CellValue::to_numeric);
        table.accumulate(&key, &[Some(usage), amount]);
    }

    Some((table, dropped))
}

fn cell<'a>(record: &Record<'a>, column: Option<&str>) -> Option<&'a CellValue> {
    record.get(column?)
}

/// Resolve a canonical header, tolerating case differences between exports.
fn find_column(sheet: &Sheet, wanted: &str) -> Option<String> {
    if sheet.has_column(wanted) {
        return Some(wanted.to_string());
    }
    sheet
        .column_names()?
        .iter()
        .find(|name| name.eq_ignore_ascii_case(wanted))
        .cloned()
}
