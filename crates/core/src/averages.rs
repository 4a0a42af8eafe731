//! Per-entity monthly figures across both fuels, with their averages.

use crate::entity::normalize;
use crate::error::EnergyResult;
use crate::model::{Fuel, Grouping, Metric};
use crate::registry::DatasetRegistry;
use crate::table::Period;
use serde::Serialize;

/// The four figures tracked for an entity in one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelMetrics {
    pub electricity_spending: f64,
    pub electricity_usage: f64,
    pub gas_spending: f64,
    pub gas_usage: f64,
}

impl FuelMetrics {
    fn columns() -> [(Fuel, Metric); 4] {
        [
            (Fuel::Electricity, Metric::Spending),
            (Fuel::Electricity, Metric::Usage),
            (Fuel::Gas, Metric::Spending),
            (Fuel::Gas, Metric::Usage),
        ]
    }

    fn from_array([es, eu, gs, gu]: [f64; 4]) -> Self {
        Self {
            electricity_spending: es,
            electricity_usage: eu,
            gas_spending: gs,
            gas_usage: gu,
        }
    }

    fn to_array(self) -> [f64; 4] {
        [
            self.electricity_spending,
            self.electricity_usage,
            self.gas_spending,
            self.gas_usage,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRow {
    pub period: Period,
    #[serde(flatten)]
    pub metrics: FuelMetrics,
}

/// Monthly rows for one entity, most recent request first, and their mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageTable {
    pub grouping: Grouping,
    pub entity: String,
    pub rows: Vec<AverageRow>,
    /// `None` when no periods were requested.
    pub mean: Option<FuelMetrics>,
}

/// Round half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl DatasetRegistry {
    /// Monthly spending and usage of one entity for both fuels.
    ///
    /// `entity` is normalized before lookup. Entities or periods missing from
    /// a table read as 0. With no `periods`, every period of the electricity
    /// usage table is used. Rows are listed in reverse request order.
    pub fn averages(&self, grouping: Grouping, entity: &str, periods: &[Period]) -> EnergyResult<AverageTable> {
        let key = normalize(entity);
        let [es, eu, gs, gu] = FuelMetrics::columns().map(|(fuel, metric)| self.get_table(fuel, metric, grouping));
        let tables = [es?, eu?, gs?, gu?];

        let periods = if periods.is_empty() {
            tables[1].periods()
        } else {
            periods
        };

        let series = tables.map(|table| table.series(&key, periods));
        let rows: Vec<AverageRow> = periods
            .iter()
            .enumerate()
            .rev()
            .map(|(i, period)| AverageRow {
                period: period.clone(),
                metrics: FuelMetrics::from_array(std::array::from_fn(|c| round2(series[c][i]))),
            })
            .collect();

        let mean = (!rows.is_empty()).then(|| {
            let mut sums = [0.0; 4];
            for row in &rows {
                for (sum, value) in sums.iter_mut().zip(row.metrics.to_array()) {
                    *sum += value;
                }
            }
            let count = rows.len() as f64;
            FuelMetrics::from_array(sums.map(|sum| round2(sum / count)))
        });

        Ok(AverageTable {
            grouping,
            entity: key,
            rows,
            mean,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDirectory;
    use crate::error::EnergyError;
    use crate::registry::FuelSource;
    use crate::workbook::Workbook;
    use energyboard_sheet::{Book, CellValue, Sheet};

    fn workbook(name: &str, unit: &str, sheets: &[(&str, f64, f64)]) -> Workbook {
        let mut book = Book::new();
        for (sheet_name, qty, amount) in sheets {
            let mut sheet = Sheet::from_data(vec![
                vec![
                    CellValue::from("Property Name"),
                    CellValue::from(unit),
                    CellValue::from("Total Amount"),
                ],
                vec![CellValue::from("Annex"), CellValue::Float(*qty), CellValue::Float(*amount)],
            ]);
            sheet.name_columns_by_row(0).unwrap();
            book.add_sheet(sheet_name, sheet).unwrap();
        }
        Workbook::from_book(name, book).unwrap()
    }

    fn registry() -> DatasetRegistry {
        let directory = EntityDirectory::from_pairs([("Annex", Some("Clerk"))]);
        DatasetRegistry::from_sources(
            &directory,
            vec![
                FuelSource::new(
                    Fuel::Electricity,
                    vec![workbook(
                        "originalElectricity2023",
                        "kWh",
                        &[("2023-Jan", 100.0, 10.004), ("2023-Feb", 50.0, 5.0)],
                    )],
                ),
                FuelSource::new(
                    Fuel::Gas,
                    vec![workbook("originalGas2023", "therms", &[("2023-Jan", 3.0, 1.5)])],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_round2() {
        assert!((round2(1.005_1) - 1.01).abs() < 1e-12);
        assert!((round2(2.344) - 2.34).abs() < 1e-12);
        assert!((round2(-0.125_1) + 0.13).abs() < 1e-12);
    }

    #[test]
    fn test_averages_for_property() {
        let periods = vec![Period::new("Jan", "2023"), Period::new("Feb", "2023")];
        let table = registry().averages(Grouping::Property, "Annex", &periods).unwrap();

        assert_eq!(table.entity, "annex");
        let labels: Vec<String> = table.rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(labels, vec!["Feb_2023", "Jan_2023"]);
        assert_eq!(table.rows[1].metrics.electricity_spending, 10.0);
        assert_eq!(table.rows[0].metrics.gas_usage, 0.0);

        let mean = table.mean.unwrap();
        assert_eq!(mean.electricity_usage, 75.0);
        assert_eq!(mean.electricity_spending, 7.5);
        assert_eq!(mean.gas_usage, 1.5);
        assert_eq!(mean.gas_spending, 0.75);
    }

    #[test]
    fn test_unknown_entity_reads_as_zero() {
        let periods = vec![Period::new("Jan", "2023")];
        let table = registry().averages(Grouping::Office, "Treasurer", &periods).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.mean.unwrap().to_array(), [0.0; 4]);
    }

    #[test]
    fn test_default_periods_come_from_electricity_usage() {
        let table = registry().averages(Grouping::Office, "clerk", &[]).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!((table.mean.unwrap().electricity_usage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_registry() {
        let err = DatasetRegistry::default()
            .averages(Grouping::Office, "clerk", &[])
            .unwrap_err();
        assert!(matches!(err, EnergyError::UnknownKey { .. }));
    }
}
