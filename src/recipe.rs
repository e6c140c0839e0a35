use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

use crate::error::ValidationError;

/// Quantity of a fresh ingredient. Exactly one of weight or count, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAmount", into = "RawAmount")]
pub enum FreshAmount {
    /// Mass in grams.
    Weight(f64),
    /// Discrete units (eggs, cloves...).
    Count(f64),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RawAmount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<f64>,
}

impl FreshAmount {
    pub fn new(weight: Option<f64>, count: Option<f64>) -> Result<Self, String> {
        let amount = match (weight, count) {
            (Some(w), None) => FreshAmount::Weight(w),
            (None, Some(c)) => FreshAmount::Count(c),
            (Some(_), Some(_)) => return Err("has both weight and count".to_string()),
            (None, None) => return Err("has neither weight nor count".to_string()),
        };
        let value = amount.value();
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("has a non-positive quantity {value}"));
        }
        Ok(amount)
    }

    pub fn value(&self) -> f64 {
        match self {
            FreshAmount::Weight(v) | FreshAmount::Count(v) => *v,
        }
    }

    /// Grams, when the amount is mass-based.
    pub fn weight(&self) -> Option<f64> {
        match self {
            FreshAmount::Weight(grams) => Some(*grams),
            FreshAmount::Count(_) => None,
        }
    }
}

impl TryFrom<RawAmount> for FreshAmount {
    type Error = String;

    fn try_from(raw: RawAmount) -> Result<Self, Self::Error> {
        FreshAmount::new(raw.weight, raw.count)
    }
}

impl From<FreshAmount> for RawAmount {
    fn from(amount: FreshAmount) -> Self {
        match amount {
            FreshAmount::Weight(w) => RawAmount { weight: Some(w), count: None },
            FreshAmount::Count(c) => RawAmount { weight: None, count: Some(c) },
        }
    }
}

/// A JSON object whose key order is kept exactly as read. Duplicate keys are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces in place, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of ingredient names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate ingredient '{key}'")));
                    }
                    entries.push((key, value));
                }
                Ok(OrderedMap { entries })
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngredientsDetailed {
    #[serde(default)]
    pub fresh_ingredient: OrderedMap<FreshAmount>,
    /// Unquantified seasonings; never counted towards nutrition.
    #[serde(default)]
    pub condiment: OrderedMap<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// Free-text ingredient lines as written in the recipe.
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub ingredients_detailed: IngredientsDetailed,
    /// Any other fields present on disk, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Older stores wrote ids as numbers.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// A recipe that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub ingredients_detailed: IngredientsDetailed,
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("<unnamed>", "recipe name is empty"));
        }
        if let Some(blank) = self.ingredients_detailed.fresh_ingredient.keys().find(|k| k.trim().is_empty()) {
            return Err(ValidationError::new(
                &self.name,
                format!("fresh ingredient with blank name '{blank}'"),
            ));
        }
        Ok(())
    }

    pub fn with_id(self, id: String) -> Recipe {
        Recipe {
            id,
            name: self.name,
            ingredients: self.ingredients,
            instructions: self.instructions,
            ingredients_detailed: self.ingredients_detailed,
            extra: serde_json::Map::new(),
        }
    }
}
