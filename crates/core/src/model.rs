//! The three lookup dimensions of a published table, and the units behind them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of the monetary column in billing exports (after header normalization).
pub const TOTAL_AMOUNT: &str = "Total_Amount";

/// Returned when a dimension value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseKeyError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseKeyError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Tracked utility commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fuel {
    Electricity,
    Gas,
}

impl Fuel {
    pub const ALL: [Fuel; 2] = [Fuel::Electricity, Fuel::Gas];

    /// Unit of the quantity column in this fuel's exports.
    pub fn unit(self) -> Unit {
        match self {
            Fuel::Electricity => Unit::Kwh,
            Fuel::Gas => Unit::Therms,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Fuel::Electricity => "electricity",
            Fuel::Gas => "gas",
        }
    }
}

impl fmt::Display for Fuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fuel {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electricity" | "electric" | "elec" => Ok(Fuel::Electricity),
            "gas" => Ok(Fuel::Gas),
            _ => Err(ParseKeyError::new("fuel", s)),
        }
    }
}

/// Physical unit of a fuel's quantity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "kWh")]
    Kwh,
    #[serde(rename = "therms")]
    Therms,
}

impl Unit {
    /// Column header used by the billing exports.
    pub fn label(self) -> &'static str {
        match self {
            Unit::Kwh => "kWh",
            Unit::Therms => "therms",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a bill a published table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Usage,
    Spending,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Usage, Metric::Spending];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Usage => "usage",
            Metric::Spending => "spending",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usage" => Ok(Metric::Usage),
            "spending" | "spend" => Ok(Metric::Spending),
            _ => Err(ParseKeyError::new("metric", s)),
        }
    }
}

/// Row granularity of a table: one row per property or per owning office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grouping {
    #[serde(rename = "Office")]
    Office,
    #[serde(rename = "Property_Name")]
    Property,
}

impl Grouping {
    pub const ALL: [Grouping; 2] = [Grouping::Office, Grouping::Property];

    /// Name of the identity column keyed by this grouping.
    pub fn key_column(self) -> &'static str {
        match self {
            Grouping::Office => "Office",
            Grouping::Property => "Property_Name",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_column())
    }
}

impl FromStr for Grouping {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "office" | "offices" => Ok(Grouping::Office),
            "property_name" | "property" | "properties" => Ok(Grouping::Property),
            _ => Err(ParseKeyError::new("grouping", s)),
        }
    }
}
