//! Pipeline configuration: where the exports live and which fiscal years to merge.

use crate::error::{EnergyError, EnergyResult};
use crate::model::Fuel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const YEAR_PLACEHOLDER: &str = "{year}";

/// Locations and naming conventions of the source workbooks.
///
/// Every field has a default, so an empty YAML document is a valid config.
///
/// ```
/// use energyboard_core::PipelineConfig;
///
/// let config = PipelineConfig::from_yaml_str("data_dir: /srv/energy\nyears: [2023, 2024]").unwrap();
/// assert_eq!(config.years, vec![2023, 2024]);
/// assert!(config.directory_path().starts_with("/srv/energy"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory containing the workbooks.
    pub data_dir: PathBuf,
    /// Property → office directory workbook, relative to `data_dir` unless absolute.
    pub directory_file: PathBuf,
    /// Fiscal years to merge, in order; earlier years win duplicate columns.
    pub years: Vec<i32>,
    /// File name template for electricity workbooks.
    pub electricity_file: String,
    /// File name template for gas workbooks.
    pub gas_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            directory_file: PathBuf::from("propertyNamesAndOffices.xlsx"),
            years: vec![2022, 2023],
            electricity_file: "originalElectricity{year}.xlsx".to_string(),
            gas_file: "originalGas{year}.xlsx".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml_str(source: &str) -> EnergyResult<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> EnergyResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&source)
    }

    /// Reject configs that cannot produce a registry.
    pub fn validate(&self) -> EnergyResult<()> {
        if self.years.is_empty() {
            return Err(EnergyError::Config("at least one fiscal year is required".into()));
        }
        for template in [&self.electricity_file, &self.gas_file] {
            if !template.contains(YEAR_PLACEHOLDER) {
                return Err(EnergyError::Config(format!(
                    "file template {template:?} has no {YEAR_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(())
    }

    /// Path of the workbook for one fuel and fiscal year.
    pub fn workbook_path(&self, fuel: Fuel, year: i32) -> PathBuf {
        let template = match fuel {
            Fuel::Electricity => &self.electricity_file,
            Fuel::Gas => &self.gas_file,
        };
        self.data_dir
            .join(template.replace(YEAR_PLACEHOLDER, &year.to_string()))
    }

    /// Path of the property → office directory workbook.
    pub fn directory_path(&self) -> PathBuf {
        self.data_dir.join(&self.directory_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.workbook_path(Fuel::Electricity, 2022),
            PathBuf::from("./data/originalElectricity2022.xlsx")
        );
        assert_eq!(
            config.workbook_path(Fuel::Gas, 2023),
            PathBuf::from("./data/originalGas2023.xlsx")
        );
        assert_eq!(
            config.directory_path(),
            PathBuf::from("./data/propertyNamesAndOffices.xlsx")
        );
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = PipelineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_absolute_directory_file() {
        let config =
            PipelineConfig::from_yaml_str("directory_file: /etc/energy/offices.xlsx").unwrap();
        assert_eq!(
            config.directory_path(),
            PathBuf::from("/etc/energy/offices.xlsx")
        );
    }

    #[test]
    fn test_rejects_empty_years() {
        let err = PipelineConfig::from_yaml_str("years: []").unwrap_err();
        assert!(matches!(err, EnergyError::Config(_)));
    }

    #[test]
    fn test_rejects_template_without_year() {
        let err = PipelineConfig::from_yaml_str("gas_file: gas.xlsx").unwrap_err();
        assert!(matches!(err, EnergyError::Config(_)));
    }

    #[test]
    fn test_bad_yaml() {
        let err = PipelineConfig::from_yaml_str("years: nope").unwrap_err();
        assert!(matches!(err, EnergyError::Yaml(_)));
    }
}
