//! # energyboard-core
//!
//! Aggregation pipeline for county utility billing exports.
//!
//! Raw electricity and gas workbooks (one per fiscal year) go in; eight
//! published tables come out, keyed by fuel, metric and grouping:
//!
//! - [`Workbook`] loads an export and tags it with its fiscal year
//! - [`extract_months`] turns each billing sheet into a typed [`Table`]
//! - [`merge_months`] folds a year of months into one table
//! - [`aggregate_years`] joins the years, attaches offices and splits usage from spending
//! - [`DatasetRegistry`] runs all of the above once and serves read-only lookups
//!
//! ```no_run
//! use energyboard_core::{DatasetRegistry, Fuel, Grouping, Metric, PipelineConfig};
//!
//! let config = PipelineConfig::from_yaml_file("energyboard.yaml")?;
//! let registry = DatasetRegistry::build(&config)?;
//! let usage = registry.get_table(Fuel::Electricity, Metric::Usage, Grouping::Office)?;
//! assert_eq!(usage.row_count(), registry.list_offices().len());
//! # Ok::<(), energyboard_core::EnergyError>(())
//! ```

/// Cross-year aggregation into published views.
pub mod aggregate;
/// Per-entity monthly averages across both fuels.
pub mod averages;
/// Pipeline configuration.
pub mod config;
/// Entity keys and the property/office directory.
pub mod entity;
/// Error types and result aliases.
pub mod error;
/// Monthly table extraction from billing sheets.
pub mod extract;
/// Monthly tables folded into a fiscal year.
pub mod merge;
/// Lookup dimensions: fuel, metric, grouping.
pub mod model;
/// Read-only published tables.
pub mod published;
/// The dataset registry.
pub mod registry;
/// Typed entity tables.
pub mod table;
/// Source workbook loading.
pub mod workbook;

pub use aggregate::{aggregate_years, combine_years, Dataset};
pub use averages::{round2, AverageRow, AverageTable, FuelMetrics};
pub use config::PipelineConfig;
pub use entity::{normalize, normalize_cell, EntityDirectory};
pub use error::{EnergyError, EnergyResult};
pub use extract::{extract_months, extract_sheet, is_fiscal_sheet, sheet_period};
pub use merge::merge_months;
pub use model::{Fuel, Grouping, Metric, ParseKeyError, Unit, TOTAL_AMOUNT};
pub use published::{PublishedRow, PublishedTable};
pub use registry::{DatasetKey, DatasetRegistry, FuelSource};
pub use table::{Column, ColumnTag, Period, Table};
pub use workbook::{fiscal_year_from_name, Workbook};
