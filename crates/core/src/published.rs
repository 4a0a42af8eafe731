//! Read-only tables handed to the presentation layer.

use crate::model::{Grouping, Metric};
use crate::table::{ColumnTag, Period, Table};
use indexmap::IndexMap;
use serde::Serialize;

/// One entity's row in a published table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedRow {
    pub key: String,
    pub values: Vec<Option<f64>>,
}

/// A usage or spending view: one row per entity, one column per billing period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedTable {
    grouping: Grouping,
    metric: Metric,
    unit: String,
    periods: Vec<Period>,
    rows: Vec<PublishedRow>,
}

impl PublishedTable {
    /// Project the columns of `table` that belong to `metric`.
    pub fn project(table: &Table, metric: Metric) -> Self {
        let tag = match metric {
            Metric::Usage => ColumnTag::Quantity,
            Metric::Spending => ColumnTag::Monetary,
        };
        let view = table.select(tag);
        let unit = match metric {
            Metric::Usage => table.unit().label().to_string(),
            Metric::Spending => "$".to_string(),
        };

        Self {
            grouping: table.grouping(),
            metric,
            unit,
            periods: view.columns().iter().map(|c| c.period().clone()).collect(),
            rows: view
                .rows()
                .map(|(key, values)| PublishedRow {
                    key: key.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Unit of every value: the fuel's unit for usage, `$` for spending.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Identity column name (`Office` or `Property_Name`).
    pub fn key_column(&self) -> &'static str {
        self.grouping.key_column()
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Bare `<month>_<year>` labels in column order.
    pub fn column_labels(&self) -> Vec<String> {
        self.periods.iter().map(ToString::to_string).collect()
    }

    pub fn rows(&self) -> &[PublishedRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, key: &str) -> Option<&PublishedRow> {
        self.rows
            .binary_search_by(|row| row.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn value(&self, key: &str, period: &Period) -> Option<f64> {
        let col = self.periods.iter().position(|p| p == period)?;
        self.row(key)?.values.get(col).copied().flatten()
    }

    /// Values of one entity for `periods`; anything absent reads as 0.
    pub fn series(&self, key: &str, periods: &[Period]) -> Vec<f64> {
        periods
            .iter()
            .map(|period| self.value(key, period).unwrap_or(0.0))
            .collect()
    }

    /// Sum of every present value.
    pub fn total(&self) -> f64 {
        self.rows.iter().flat_map(|r| r.values.iter().flatten()).sum()
    }

    /// Rows as ordered `column -> value` maps, identity column first.
    pub fn to_records(&self) -> Vec<IndexMap<String, serde_json::Value>> {
        let labels = self.column_labels();
        self.rows
            .iter()
            .map(|row| {
                let mut record = IndexMap::with_capacity(labels.len() + 1);
                record.insert(
                    self.key_column().to_string(),
                    serde_json::Value::String(row.key.clone()),
                );
                for (label, value) in labels.iter().zip(&row.values) {
                    record.insert(label.clone(), serde_json::json!(value));
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Unit;
    use crate::table::Column;

    fn combined() -> Table {
        let jan = Period::new("Jan", "2023");
        let feb = Period::new("Feb", "2023");
        let mut table = Table::new(
            Grouping::Property,
            Unit::Therms,
            vec![
                Column::quantity(jan.clone()),
                Column::monetary(jan),
                Column::quantity(feb.clone()),
                Column::monetary(feb),
            ],
        );
        table.accumulate("annex", &[Some(10.0), Some(8.5), Some(12.0), None]);
        table.accumulate("main_st", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        table
    }

    #[test]
    fn test_usage_and_spending_are_disjoint() {
        let table = combined();
        let usage = PublishedTable::project(&table, Metric::Usage);
        let spending = PublishedTable::project(&table, Metric::Spending);

        assert_eq!(usage.column_labels(), vec!["Jan_2023", "Feb_2023"]);
        assert_eq!(spending.column_labels(), vec!["Jan_2023", "Feb_2023"]);
        assert_eq!(usage.row("annex").unwrap().values, vec![Some(10.0), Some(12.0)]);
        assert_eq!(spending.row("annex").unwrap().values, vec![Some(8.5), None]);
        assert_eq!(usage.unit(), "therms");
        assert_eq!(spending.unit(), "$");
    }

    #[test]
    fn test_series_reads_absent_as_zero() {
        let usage = PublishedTable::project(&combined(), Metric::Usage);
        let periods = vec![
            Period::new("Feb", "2023"),
            Period::new("Mar", "2023"),
        ];

        assert_eq!(usage.series("annex", &periods), vec![12.0, 0.0]);
        assert_eq!(usage.series("stadium", &periods), vec![0.0, 0.0]);
    }

    #[test]
    fn test_records_keep_column_order() {
        let spending = PublishedTable::project(&combined(), Metric::Spending);
        let records = spending.to_records();

        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["Property_Name", "Jan_2023", "Feb_2023"]);
        assert_eq!(records[0]["Property_Name"], serde_json::json!("annex"));
        assert_eq!(records[0]["Feb_2023"], serde_json::Value::Null);
    }

    #[test]
    fn test_total() {
        let usage = PublishedTable::project(&combined(), Metric::Usage);
        assert!((usage.total() - 26.0).abs() < 1e-9);
    }
}
