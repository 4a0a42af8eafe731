//! Typed per-entity tables with structurally tagged metric columns.
//!
//! A [`Table`] is keyed by entity key (one row per entity, rows kept in key
//! order) and holds one `Option<f64>` per metric [`Column`]. Each column knows
//! whether it is a quantity or a monetary total and which billing [`Period`] it
//! covers, so projections never have to re-derive that from a header string.

use crate::entity::EntityDirectory;
use crate::model::{Grouping, Unit, TOTAL_AMOUNT};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Billing month label taken from a sheet name, e.g. `Jan` of `2023`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub month: String,
    pub year: String,
}

impl Period {
    pub fn new(month: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            year: year.into(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.month, self.year)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parses the `<month>_<year>` label produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('_') {
            Some((month, year)) if !month.is_empty() && !year.is_empty() => {
                Ok(Period::new(month, year))
            }
            _ => Err(format!("expected <month>_<year>, got {s:?}")),
        }
    }
}

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnTag {
    /// Entity key or office affiliation.
    Identity,
    /// Physical quantity in the fuel's unit.
    Quantity,
    /// Billed amount in currency units.
    Monetary,
}

/// A metric column: a quantity or monetary value for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    tag: ColumnTag,
    period: Period,
}

impl Column {
    pub fn quantity(period: Period) -> Self {
        Self {
            tag: ColumnTag::Quantity,
            period,
        }
    }

    pub fn monetary(period: Period) -> Self {
        Self {
            tag: ColumnTag::Monetary,
            period,
        }
    }

    pub fn tag(&self) -> ColumnTag {
        self.tag
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    /// Header as it would appear in the billing exports, e.g. `kWh_Jan_2023`.
    pub fn header(&self, unit: Unit) -> String {
        match self.tag {
            ColumnTag::Monetary => format!("{TOTAL_AMOUNT}_{}", self.period),
            _ => format!("{}_{}", unit.label(), self.period),
        }
    }
}

/// Per-entity metric table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    grouping: Grouping,
    unit: Unit,
    columns: Vec<Column>,
    rows: BTreeMap<String, Vec<Option<f64>>>,
    affiliation: Option<BTreeMap<String, Option<String>>>,
}

impl Table {
    /// Create an empty table with the given metric columns.
    pub fn new(grouping: Grouping, unit: Unit, columns: Vec<Column>) -> Self {
        Self {
            grouping,
            unit,
            columns,
            rows: BTreeMap::new(),
            affiliation: None,
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entity keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Rows as `(key, values)` in key order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn row(&self, key: &str) -> Option<&[Option<f64>]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Position of the column with `tag` for `period`.
    pub fn position(&self, tag: ColumnTag, period: &Period) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.tag == tag && &c.period == period)
    }

    pub fn value(&self, key: &str, tag: ColumnTag, period: &Period) -> Option<f64> {
        let col = self.position(tag, period)?;
        self.rows.get(key)?.get(col).copied().flatten()
    }

    /// Office affiliation of each row, once joined.
    pub fn affiliation(&self, key: &str) -> Option<&str> {
        self.affiliation.as_ref()?.get(key)?.as_deref()
    }

    pub fn has_affiliation(&self) -> bool {
        self.affiliation.is_some()
    }

    /// Every column header with its tag, identity columns first.
    pub fn headers(&self) -> Vec<(String, ColumnTag)> {
        let mut headers = vec![(self.grouping.key_column().to_string(), ColumnTag::Identity)];
        if self.affiliation.is_some() {
            headers.push((Grouping::Office.key_column().to_string(), ColumnTag::Identity));
        }
        headers.extend(self.columns.iter().map(|c| (c.header(self.unit), c.tag)));
        headers
    }

    /// Add `values` into the row for `key`, creating it if needed.
    ///
    /// Missing values are skipped, so a row only stays missing in a column
    /// when every contribution to it was missing.
    pub fn accumulate(&mut self, key: &str, values: &[Option<f64>]) {
        let width = self.columns.len();
        let row = self
            .rows
            .entry(key.to_string())
            .or_insert_with(|| vec![None; width]);
        for (cell, value) in row.iter_mut().zip(values) {
            if let Some(v) = value {
                *cell = Some(cell.unwrap_or(0.0) + v);
            }
        }
    }

    /// Outer join on entity key.
    ///
    /// The result has this table's columns followed by the other table's
    /// columns. A column present on both sides keeps this table's values and
    /// the other side's copy is discarded. Cells with no contributing row are
    /// missing.
    pub fn outer_join(self, other: &Table) -> Table {
        let existing: HashSet<&Column> = self.columns.iter().collect();
        let taken: Vec<usize> = other
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !existing.contains(c))
            .map(|(i, _)| i)
            .collect();
        let discarded = other.columns.len() - taken.len();
        if discarded > 0 {
            debug!(discarded, "dropped duplicate columns from right side of join");
        }

        let left_width = self.columns.len();
        let mut columns = self.columns;
        columns.extend(taken.iter().map(|&i| other.columns[i].clone()));

        let mut rows = self.rows;
        for values in rows.values_mut() {
            values.resize(columns.len(), None);
        }
        for (key, values) in &other.rows {
            let row = rows
                .entry(key.clone())
                .or_insert_with(|| vec![None; columns.len()]);
            for (offset, &i) in taken.iter().enumerate() {
                row[left_width + offset] = values.get(i).copied().flatten();
            }
        }

        Table {
            grouping: self.grouping,
            unit: self.unit,
            columns,
            rows,
            affiliation: self.affiliation,
        }
    }

    /// Replace every missing metric with `value`.
    #[must_use]
    pub fn fill_missing(mut self, value: f64) -> Table {
        for cell in self.rows.values_mut().flatten() {
            cell.get_or_insert(value);
        }
        self
    }

    /// Attach each row's office from the directory (left join).
    ///
    /// Rows absent from the directory stay, with no office.
    #[must_use]
    pub fn join_affiliation(mut self, directory: &EntityDirectory) -> Table {
        let affiliation = self
            .rows
            .keys()
            .map(|key| (key.clone(), directory.office_of(key).map(str::to_string)))
            .collect();
        self.affiliation = Some(affiliation);
        self
    }

    /// Drop the office affiliation column.
    #[must_use]
    pub fn without_affiliation(mut self) -> Table {
        self.affiliation = None;
        self
    }

    /// Sum rows sharing an office into one row per directory office.
    ///
    /// Every office in the directory gets a row, zero-filled when none of its
    /// properties billed. Rows without an office are left out. Column order
    /// is unchanged.
    #[must_use]
    pub fn regroup_by_office(self, directory: &EntityDirectory) -> Table {
        let width = self.columns.len();
        let mut rows: BTreeMap<String, Vec<Option<f64>>> = directory
            .offices()
            .iter()
            .map(|office| (office.clone(), vec![Some(0.0); width]))
            .collect();

        let affiliation = self.affiliation.unwrap_or_default();
        let mut unaffiliated = 0usize;
        for (key, values) in self.rows {
            let Some(office) = affiliation.get(&key).cloned().flatten() else {
                unaffiliated += 1;
                continue;
            };
            let row = rows.entry(office).or_insert_with(|| vec![Some(0.0); width]);
            for (total, value) in row.iter_mut().zip(values) {
                *total = Some(total.unwrap_or(0.0) + value.unwrap_or(0.0));
            }
        }
        if unaffiliated > 0 {
            warn!(unaffiliated, "rows without an office left out of office totals");
        }

        Table {
            grouping: Grouping::Office,
            unit: self.unit,
            columns: self.columns,
            rows,
            affiliation: None,
        }
    }

    /// Keep only the metric columns carrying `tag`.
    #[must_use]
    pub fn select(&self, tag: ColumnTag) -> Table {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.tag == tag)
            .map(|(i, _)| i)
            .collect();

        Table {
            grouping: self.grouping,
            unit: self.unit,
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|(key, values)| (key.clone(), keep.iter().map(|&i| values[i]).collect()))
                .collect(),
            affiliation: self.affiliation.clone(),
        }
    }

    /// Sum of every present value in columns carrying `tag`.
    pub fn total(&self, tag: ColumnTag) -> f64 {
        let cols: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.tag == tag)
            .map(|(i, _)| i)
            .collect();
        self.rows
            .values()
            .flat_map(|values| cols.iter().filter_map(move |&i| values[i]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan() -> Period {
        Period::new("Jan", "2023")
    }

    fn feb() -> Period {
        Period::new("Feb", "2023")
    }

    fn month_table(period: Period, rows: &[(&str, f64, f64)]) -> Table {
        let mut table = Table::new(
            Grouping::Property,
            Unit::Kwh,
            vec![Column::quantity(period.clone()), Column::monetary(period)],
        );
        for (key, kwh, amount) in rows {
            table.accumulate(key, &[Some(*kwh), Some(*amount)]);
        }
        table
    }

    #[test]
    fn test_period_label_roundtrip() {
        let period: Period = "Jan_2023".parse().unwrap();
        assert_eq!(period, jan());
        assert_eq!(period.to_string(), "Jan_2023");
        assert!("Jan".parse::<Period>().is_err());
        assert!("_2023".parse::<Period>().is_err());
    }

    #[test]
    fn test_headers_render_from_tags() {
        let table = month_table(jan(), &[]);
        let headers: Vec<String> = table.headers().into_iter().map(|(h, _)| h).collect();
        assert_eq!(headers, vec!["Property_Name", "kWh_Jan_2023", "Total_Amount_Jan_2023"]);
    }

    #[test]
    fn test_accumulate_sums_duplicates() {
        let table = month_table(jan(), &[("a", 10.0, 1.0), ("a", 5.0, 2.0)]);
        assert_eq!(table.row("a").unwrap(), &[Some(15.0), Some(3.0)]);
    }

    #[test]
    fn test_accumulate_skips_missing() {
        let mut table = month_table(jan(), &[]);
        table.accumulate("a", &[Some(1.0), None]);
        assert_eq!(table.row("a").unwrap(), &[Some(1.0), None]);
        table.accumulate("a", &[None, Some(4.0)]);
        assert_eq!(table.row("a").unwrap(), &[Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_outer_join_keeps_all_keys() {
        let joined = month_table(jan(), &[("a", 10.0, 1.0)])
            .outer_join(&month_table(feb(), &[("b", 5.0, 2.0)]));

        assert_eq!(joined.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(joined.row("a").unwrap(), &[Some(10.0), Some(1.0), None, None]);
        assert_eq!(joined.row("b").unwrap(), &[None, None, Some(5.0), Some(2.0)]);
    }

    #[test]
    fn test_outer_join_duplicate_column_keeps_left() {
        let joined = month_table(jan(), &[("a", 10.0, 1.0)])
            .outer_join(&month_table(jan(), &[("a", 99.0, 99.0), ("b", 7.0, 7.0)]));

        assert_eq!(joined.columns().len(), 2);
        assert_eq!(joined.value("a", ColumnTag::Quantity, &jan()), Some(10.0));
        // the right side's copy is discarded even where the left has no row
        assert_eq!(joined.value("b", ColumnTag::Quantity, &jan()), None);
        assert!(joined.row("b").is_some());
    }

    #[test]
    fn test_fill_missing() {
        let filled = month_table(jan(), &[("a", 10.0, 1.0)])
            .outer_join(&month_table(feb(), &[("b", 5.0, 2.0)]))
            .fill_missing(0.0);
        assert_eq!(filled.row("a").unwrap(), &[Some(10.0), Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_regroup_by_office() {
        let directory = EntityDirectory::from_pairs([
            ("a", Some("Assessor")),
            ("b", Some("Assessor")),
            ("c", Some("Clerk")),
            ("d", Some("Treasurer")),
        ]);
        let table = month_table(jan(), &[("a", 10.0, 1.0), ("b", 5.0, 2.0), ("c", 1.0, 1.0), ("z", 3.0, 3.0)])
            .join_affiliation(&directory);
        assert_eq!(table.affiliation("a"), Some("assessor"));
        assert_eq!(table.affiliation("z"), None);

        let offices = table.regroup_by_office(&directory);
        assert_eq!(offices.grouping(), Grouping::Office);
        assert_eq!(offices.keys().collect::<Vec<_>>(), vec!["assessor", "clerk", "treasurer"]);
        assert_eq!(offices.row("assessor").unwrap(), &[Some(15.0), Some(3.0)]);
        assert_eq!(offices.row("treasurer").unwrap(), &[Some(0.0), Some(0.0)]);
        assert!(!offices.has_affiliation());
    }

    #[test]
    fn test_select_by_tag() {
        let table = month_table(jan(), &[("a", 10.0, 1.0)])
            .outer_join(&month_table(feb(), &[("a", 5.0, 2.0)]));

        let usage = table.select(ColumnTag::Quantity);
        assert!(usage.columns().iter().all(|c| c.tag() == ColumnTag::Quantity));
        assert_eq!(usage.row("a").unwrap(), &[Some(10.0), Some(5.0)]);
        assert!((table.total(ColumnTag::Monetary) - 3.0).abs() < 1e-9);
    }
}
