//! Vorberechnete Ähnlichkeiten zwischen Fähigkeiten.
//!
//! Die Tabelle wird außerhalb berechnet (z. B. über Satz-Embeddings) und hier
//! nur als fertige Daten eingelesen. Format auf der Platte ist ein
//! verschachteltes JSON-Objekt:
//!
//! ```json
//! { "wipe": { "sweep": 0.5 }, "sweep": { "wipe": 0.45 } }
//! ```
//!
//! Symmetrie wird weder angenommen noch erzwungen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("failed to read similarity table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse similarity table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("similarity {from} -> {to} is not finite")]
    NonFinite { from: String, to: String },
    #[error("similarity {from} -> {to} = {value} is outside [-1, 1]")]
    OutOfRange { from: String, to: String, value: f64 },
}

/// Nachbarn einer Fähigkeit mit ihrem Ähnlichkeitswert.
pub type Neighbours = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SimilarityTable {
    entries: BTreeMap<String, Neighbours>,
}

impl SimilarityTable {
    /// Übernimmt eine fertige Abbildung; Selbstbezüge (`A -> A`) werden
    /// verworfen.
    pub fn from_map(map: BTreeMap<String, Neighbours>) -> Result<Self, SimilarityError> {
        let mut entries = BTreeMap::new();
        for (ability, neighbours) in map {
            let mut kept = Neighbours::new();
            for (other, value) in neighbours {
                if other == ability {
                    continue;
                }
                if !value.is_finite() {
                    return Err(SimilarityError::NonFinite { from: ability, to: other });
                }
                if !(-1.0..=1.0).contains(&value) {
                    return Err(SimilarityError::OutOfRange {
                        from: ability,
                        to: other,
                        value,
                    });
                }
                kept.insert(other, value);
            }
            entries.insert(ability, kept);
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(s: &str) -> Result<Self, SimilarityError> {
        let map: BTreeMap<String, Neighbours> = serde_json::from_str(s)?;
        Self::from_map(map)
    }

    pub fn from_path(path: &Path) -> Result<Self, SimilarityError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Jede geordnete Paarung verschiedener Fähigkeiten erhält `value`.
    ///
    /// Mit `0.0` entfällt die Weitergabe von Teilpunkten komplett.
    pub fn uniform<S: AsRef<str>>(catalog: &[S], value: f64) -> Result<Self, SimilarityError> {
        let mut names: Vec<&str> = Vec::with_capacity(catalog.len());
        for name in catalog {
            names.push(name.as_ref());
        }
        let map = names
            .iter()
            .map(|a| {
                let neighbours = names
                    .iter()
                    .filter(|b| *b != a)
                    .map(|b| ((*b).to_string(), value))
                    .collect();
                ((*a).to_string(), neighbours)
            })
            .collect();
        Self::from_map(map)
    }

    /// `None` ist ein definiertes Fehlen, kein Fehler.
    #[must_use]
    pub fn neighbours(&self, ability: &str) -> Option<&Neighbours> {
        self.entries.get(ability)
    }

    #[must_use]
    pub fn similarity(&self, from: &str, to: &str) -> Option<f64> {
        self.entries.get(from)?.get(to).copied()
    }

    /// Fähigkeiten aus dem Katalog ohne eigenen Eintrag in der Tabelle.
    #[must_use]
    pub fn missing_for<S: AsRef<str>>(&self, catalog: &[S]) -> Vec<String> {
        let mut names: Vec<&str> = Vec::with_capacity(catalog.len());
        for name in catalog {
            names.push(name.as_ref());
        }
        names
            .into_iter()
            .filter(|a| !self.entries.contains_key(*a))
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for SimilarityTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = BTreeMap::<String, Neighbours>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_json_and_drops_self_entries() {
        let table = SimilarityTable::from_json_str(
            r#"{"wipe": {"wipe": 1.0, "sweep": 0.5}, "sweep": {"wipe": 0.45}}"#,
        )
        .expect("valid table");
        assert_eq!(table.similarity("wipe", "sweep"), Some(0.5));
        assert_eq!(table.similarity("sweep", "wipe"), Some(0.45));
        assert_eq!(table.similarity("wipe", "wipe"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn absent_ability_is_not_an_error() {
        let table = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": 0.5}}"#).expect("valid");
        assert!(table.neighbours("dust").is_none());
        assert_eq!(
            table.missing_for(&["wipe", "sweep", "dust"]),
            vec!["sweep".to_string(), "dust".to_string()]
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": 1.5}}"#)
            .expect_err("1.5 is out of range");
        assert!(matches!(err, SimilarityError::OutOfRange { .. }));

        let negative = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": -0.3}}"#);
        assert!(negative.is_ok());
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut inner = Neighbours::new();
        inner.insert("sweep".to_string(), f64::NAN);
        let mut map = BTreeMap::new();
        map.insert("wipe".to_string(), inner);
        assert!(matches!(
            SimilarityTable::from_map(map),
            Err(SimilarityError::NonFinite { .. })
        ));
    }

    #[test]
    fn uniform_table_covers_all_distinct_pairs() {
        let table = SimilarityTable::uniform(&["a", "b", "c"], 0.25).expect("valid");
        assert_eq!(table.similarity("a", "b"), Some(0.25));
        assert_eq!(table.similarity("c", "a"), Some(0.25));
        assert_eq!(table.similarity("b", "b"), None);
        assert_eq!(table.neighbours("a").map(BTreeMap::len), Some(2));
    }

    #[test]
    fn serde_roundtrip_keeps_schema() {
        let table = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": 0.5}}"#).expect("valid");
        let json = serde_json::to_string(&table).expect("serialize");
        assert_eq!(json, r#"{"wipe":{"sweep":0.5}}"#);
        let back: SimilarityTable = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, table);
    }
}
