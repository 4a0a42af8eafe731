//! Cross-year aggregation: combine yearly tables, attach offices, split views.

use crate::entity::EntityDirectory;
use crate::error::{EnergyError, EnergyResult};
use crate::model::{Grouping, Metric};
use crate::published::PublishedTable;
use crate::table::Table;
use tracing::debug;

/// The three views of one (fuel, grouping) combination.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Combined table with both quantity and monetary columns.
    pub total: Table,
    pub usage: PublishedTable,
    pub spending: PublishedTable,
}

impl Dataset {
    pub fn view(&self, metric: Metric) -> &PublishedTable {
        match metric {
            Metric::Usage => &self.usage,
            Metric::Spending => &self.spending,
        }
    }
}

/// Outer-join yearly tables in order. Earlier years win duplicate columns.
///
/// Unlike the monthly merge, gaps stay missing: an entity absent from a whole
/// fiscal year has no data for it, which is not the same as billing zero.
pub fn combine_years(years: &[Table]) -> EnergyResult<Table> {
    let (first, rest) = years
        .split_first()
        .ok_or_else(|| EnergyError::empty_merge("no yearly tables to combine"))?;

    let combined = rest
        .iter()
        .fold(first.clone(), |acc, year| acc.outer_join(year));
    debug!(
        years = years.len(),
        entities = combined.row_count(),
        columns = combined.columns().len(),
        "combined yearly tables"
    );
    Ok(combined)
}

/// Build the `{total, usage, spending}` views for one grouping.
pub fn aggregate_years(
    years: &[Table],
    directory: &EntityDirectory,
    grouping: Grouping,
) -> EnergyResult<Dataset> {
    let affiliated = combine_years(years)?.join_affiliation(directory);

    let total = match grouping {
        Grouping::Office => affiliated.regroup_by_office(directory),
        Grouping::Property => affiliated.without_affiliation(),
    };

    Ok(Dataset {
        usage: PublishedTable::project(&total, Metric::Usage),
        spending: PublishedTable::project(&total, Metric::Spending),
        total,
    })
}
