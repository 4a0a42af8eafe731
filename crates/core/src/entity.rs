//! Entity keys and the property → office directory.

use crate::error::{EnergyError, EnergyResult};
use crate::model::Grouping;
use energyboard_sheet::{CellValue, Sheet, XlsxReadOptions};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;
use tracing::{info, warn};

/// Characters dropped outright from entity names.
const STRIPPED: [char; 6] = ['-', '.', '#', '&', '(', ')'];

/// Normalize a free-text property or office name into an entity key.
///
/// Lower-cases and trims, strips punctuation and possessives, then turns
/// spaces into single underscores. The result is stable under re-application.
///
/// ```
/// use energyboard_core::normalize;
///
/// assert_eq!(normalize("O'Hare #2 - Annex"), "ohare_2_annex");
/// assert_eq!(normalize("Main St."), normalize("  main st  "));
/// ```
pub fn normalize(label: &str) -> String {
    let lowered = label.to_lowercase();
    let stripped: String = lowered.trim().chars().filter(|c| !STRIPPED.contains(c)).collect();
    let stripped = stripped.replace("'s", "").replace('\'', "");

    let mut key = String::with_capacity(stripped.len());
    for ch in stripped.trim().chars() {
        let ch = if ch == ' ' { '_' } else { ch };
        if ch == '_' && key.ends_with('_') {
            continue;
        }
        key.push(ch);
    }
    key
}

/// Normalize a raw cell; missing cells have no key.
pub fn normalize_cell(cell: &CellValue) -> Option<String> {
    cell.as_text().map(|text| normalize(&text))
}

/// Canonical property list with each property's owning office.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    offices_by_property: BTreeMap<String, Option<String>>,
    properties: Vec<String>,
    offices: Vec<String>,
}

impl EntityDirectory {
    /// Build a directory from `(property, office)` name pairs.
    ///
    /// Names are normalized. When a property is listed twice the first
    /// affiliation wins.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut offices_by_property: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (property, office) in pairs {
            let property = normalize(property);
            if property.is_empty() {
                continue;
            }
            let office = office.map(normalize).filter(|o| !o.is_empty());
            match offices_by_property.entry(property) {
                Entry::Vacant(slot) => {
                    slot.insert(office);
                }
                Entry::Occupied(existing) => {
                    if existing.get() != &office {
                        warn!(
                            property = %existing.key(),
                            kept = ?existing.get(),
                            ignored = ?office,
                            "property listed under two offices"
                        );
                    }
                }
            }
        }
        Self::from_map(offices_by_property)
    }

    /// Build a directory from a sheet with `Property_Name` and `Office` columns.
    pub fn from_sheet(sheet: &Sheet) -> EnergyResult<Self> {
        let property_col = Grouping::Property.key_column();
        let office_col = Grouping::Office.key_column();
        for column in [property_col, office_col] {
            if !sheet.has_column(column) {
                return Err(EnergyError::load(
                    sheet.name(),
                    format!("directory sheet has no {column} column"),
                ));
            }
        }

        let rows: Vec<(String, Option<String>)> = sheet
            .records()
            .filter_map(|record| {
                let property = record.get(property_col)?.as_text()?;
                let office = record.get(office_col).and_then(CellValue::as_text);
                Some((property, office))
            })
            .collect();

        Ok(Self::from_pairs(
            rows.iter().map(|(p, o)| (p.as_str(), o.as_deref())),
        ))
    }

    /// Load the directory from the first sheet of a workbook.
    pub fn load(path: impl AsRef<Path>) -> EnergyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EnergyError::load(path, "file not found"));
        }
        let sheet = Sheet::from_xlsx_with_options(path, XlsxReadOptions::default().with_headers(true))
            .map_err(|e| EnergyError::load(path, e.to_string()))?;
        let directory = Self::from_sheet(&sheet)?;
        info!(
            path = %path.display(),
            properties = directory.properties.len(),
            offices = directory.offices.len(),
            "loaded entity directory"
        );
        Ok(directory)
    }

    fn from_map(offices_by_property: BTreeMap<String, Option<String>>) -> Self {
        let properties: Vec<String> = offices_by_property.keys().cloned().collect();
        let mut offices: Vec<String> = offices_by_property
            .values()
            .flatten()
            .cloned()
            .collect();
        offices.sort();
        offices.dedup();
        Self {
            offices_by_property,
            properties,
            offices,
        }
    }

    /// Office owning `property`, if the property is listed and affiliated.
    pub fn office_of(&self, property: &str) -> Option<&str> {
        self.offices_by_property.get(property)?.as_deref()
    }

    /// Whether `property` appears in the directory at all.
    pub fn contains_property(&self, property: &str) -> bool {
        self.offices_by_property.contains_key(property)
    }

    /// Distinct property keys, sorted ascending.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Distinct office keys, sorted ascending.
    pub fn offices(&self) -> &[String] {
        &self.offices
    }
}
