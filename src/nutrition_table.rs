use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{InvalidNutrientEntry, StorageError};
use crate::storage::read_json;

// Expected CSV column headers
const NAME_COL: &str = "name";
const CALORIES_COL: &str = "calories";
const CARBS_COL: &str = "carbs";
const FAT_COL: &str = "fat";
const PROTEIN_COL: &str = "protein";

/// Nutrients per 100 g of a canonical food item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionEntry {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub protein: f64,
    /// Survey portion description -> gram weight.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub portions: BTreeMap<String, f64>,
}

impl NutritionEntry {
    pub fn new(calories: f64, carbs: f64, fat: f64, protein: f64) -> Self {
        Self { calories, carbs, fat, protein, portions: BTreeMap::new() }
    }

    fn check(&self) -> Result<(), String> {
        for (field, value) in [
            ("calories", self.calories),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("protein", self.protein),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} is {value}"));
            }
        }
        Ok(())
    }
}

/// Canonical food name -> nutrition. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutritionTable {
    entries: BTreeMap<String, NutritionEntry>,
}

impl NutritionTable {
    /// Loads the table from JSON, or from CSV when the file has a `.csv` extension.
    /// A missing table is an error: nothing can be computed without it.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        let entries = if is_csv { load_csv(path)? } else { read_json(path)? };
        let table = Self::from_entries(entries).map_err(|e| StorageError::InvalidEntry {
            path: path.to_path_buf(),
            name: e.name,
            reason: e.reason,
        })?;
        info!(path = %path.display(), items = table.len(), "nutrition table loaded");
        Ok(table)
    }

    /// Builds a table, rejecting negative or non-finite nutrient values.
    pub fn from_entries(entries: BTreeMap<String, NutritionEntry>) -> Result<Self, InvalidNutrientEntry> {
        for (name, entry) in &entries {
            entry
                .check()
                .map_err(|reason| InvalidNutrientEntry { name: name.clone(), reason })?;
        }
        Ok(Self { entries })
    }

    pub fn get(&self, canonical_name: &str) -> Option<&NutritionEntry> {
        self.entries.get(canonical_name)
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.entries.contains_key(canonical_name)
    }

    /// Canonical names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_csv(csv_path: &Path) -> Result<BTreeMap<String, NutritionEntry>, StorageError> {
    let csv_error = |source: csv::Error| StorageError::Csv { path: csv_path.to_path_buf(), source };
    let invalid = |name: &str, reason: String| StorageError::InvalidEntry {
        path: csv_path.to_path_buf(),
        name: name.to_string(),
        reason,
    };

    let file = match std::fs::File::open(csv_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound { path: csv_path.to_path_buf() })
        }
        Err(source) => return Err(StorageError::Io { path: csv_path.to_path_buf(), source }),
    };
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let column = |col: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(col))
            .ok_or_else(|| invalid("<header>", format!("column '{col}' not found")))
    };
    let name_idx = column(NAME_COL)?;
    let calories_idx = column(CALORIES_COL)?;
    let carbs_idx = column(CARBS_COL)?;
    let fat_idx = column(FAT_COL)?;
    let protein_idx = column(PROTEIN_COL)?;

    let mut entries = BTreeMap::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let name = record.get(name_idx).unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }
        // Blank cells mean "not measured" and count as zero.
        let number = |idx: usize| -> Result<f64, StorageError> {
            let cell = record.get(idx).unwrap_or_default();
            if cell.is_empty() {
                return Ok(0.0);
            }
            cell.parse::<f64>()
                .map_err(|_| invalid(&name, format!("'{cell}' is not a number")))
        };
        let entry = NutritionEntry::new(
            number(calories_idx)?,
            number(carbs_idx)?,
            number(fat_idx)?,
            number(protein_idx)?,
        );
        entries.insert(name, entry);
    }
    Ok(entries)
}
