//! Year merger: fold a workbook's monthly tables into one yearly table.

use crate::error::{EnergyError, EnergyResult};
use crate::table::Table;
use tracing::debug;

/// Outer-join `months` left to right on entity key, then zero-fill.
///
/// An entity missing from a month had nothing billed that month, so the gap
/// becomes `0` rather than staying missing.
pub fn merge_months(months: Vec<Table>) -> EnergyResult<Table> {
    let mut months = months.into_iter();
    let first = months
        .next()
        .ok_or_else(|| EnergyError::empty_merge("no monthly tables for the fiscal year"))?;

    let year = months.fold(first, |acc, month| acc.outer_join(&month));
    debug!(
        entities = year.row_count(),
        columns = year.columns().len(),
        "merged monthly tables"
    );
    Ok(year.fill_missing(0.0))
}
