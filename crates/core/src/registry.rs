//! The dataset registry: builds every published table once, then serves lookups.

use crate::aggregate::aggregate_years;
use crate::config::PipelineConfig;
use crate::entity::EntityDirectory;
use crate::error::{EnergyError, EnergyResult};
use crate::extract::extract_months;
use crate::merge::merge_months;
use crate::model::{Fuel, Grouping, Metric};
use crate::published::PublishedTable;
use crate::table::Table;
use crate::workbook::Workbook;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Lookup key of a published table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DatasetKey {
    pub fuel: Fuel,
    pub metric: Metric,
    pub grouping: Grouping,
}

impl DatasetKey {
    pub fn new(fuel: Fuel, metric: Metric, grouping: Grouping) -> Self {
        Self {
            fuel,
            metric,
            grouping,
        }
    }
}

/// One fuel's workbooks, ordered by fiscal year.
#[derive(Debug, Clone)]
pub struct FuelSource {
    pub fuel: Fuel,
    pub workbooks: Vec<Workbook>,
}

impl FuelSource {
    pub fn new(fuel: Fuel, workbooks: Vec<Workbook>) -> Self {
        Self { fuel, workbooks }
    }
}

/// Immutable `(fuel, metric, grouping) -> table` mapping plus the entity lists.
///
/// The default registry is empty; every lookup on it fails with
/// [`EnergyError::UnknownKey`].
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    tables: HashMap<DatasetKey, PublishedTable>,
    properties: Vec<String>,
    offices: Vec<String>,
}

impl DatasetRegistry {
    /// Load every workbook named by `config` and build all tables.
    pub fn build(config: &PipelineConfig) -> EnergyResult<Self> {
        config.validate()?;
        let directory = EntityDirectory::load(config.directory_path())?;

        let sources = Fuel::ALL
            .into_iter()
            .map(|fuel| -> EnergyResult<FuelSource> {
                let workbooks = config
                    .years
                    .iter()
                    .map(|&year| Workbook::open(config.workbook_path(fuel, year)))
                    .collect::<EnergyResult<Vec<_>>>()?;
                Ok(FuelSource::new(fuel, workbooks))
            })
            .collect::<EnergyResult<Vec<_>>>()?;

        Self::from_sources(&directory, sources)
    }

    /// Build all tables from already loaded workbooks.
    ///
    /// Each fuel's yearly tables are computed once and shared by both
    /// groupings.
    pub fn from_sources(directory: &EntityDirectory, sources: Vec<FuelSource>) -> EnergyResult<Self> {
        let mut tables = HashMap::new();

        for source in sources {
            let unit = source.fuel.unit();
            let yearly = source
                .workbooks
                .iter()
                .map(|workbook| merge_months(extract_months(workbook, unit)))
                .collect::<EnergyResult<Vec<Table>>>()?;

            for grouping in Grouping::ALL {
                let dataset = aggregate_years(&yearly, directory, grouping)?;
                for metric in Metric::ALL {
                    let table = dataset.view(metric).clone();
                    info!(
                        fuel = %source.fuel,
                        metric = %metric,
                        grouping = %grouping,
                        rows = table.row_count(),
                        periods = table.periods().len(),
                        "published table"
                    );
                    tables.insert(DatasetKey::new(source.fuel, metric, grouping), table);
                }
            }
        }

        Ok(Self {
            tables,
            properties: directory.properties().to_vec(),
            offices: directory.offices().to_vec(),
        })
    }

    pub fn get_table(&self, fuel: Fuel, metric: Metric, grouping: Grouping) -> EnergyResult<&PublishedTable> {
        self.tables
            .get(&DatasetKey::new(fuel, metric, grouping))
            .ok_or_else(|| EnergyError::unknown_key(fuel.as_str(), metric.as_str(), grouping.key_column()))
    }

    /// Look up a table by its textual key, e.g. `("electricity", "usage", "Office")`.
    pub fn get_table_str(&self, fuel: &str, metric: &str, grouping: &str) -> EnergyResult<&PublishedTable> {
        let unknown = || EnergyError::unknown_key(fuel, metric, grouping);
        let (Ok(f), Ok(m), Ok(g)) = (fuel.parse::<Fuel>(), metric.parse::<Metric>(), grouping.parse::<Grouping>())
        else {
            return Err(unknown());
        };
        self.get_table(f, m, g)
    }

    /// Keys of every published table, sorted.
    pub fn keys(&self) -> Vec<DatasetKey> {
        let mut keys: Vec<DatasetKey> = self.tables.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Distinct property keys from the directory, sorted.
    pub fn list_properties(&self) -> &[String] {
        &self.properties
    }

    /// Distinct office keys from the directory, sorted.
    pub fn list_offices(&self) -> &[String] {
        &self.offices
    }
}
