//! Protokollzeile eines Gesprächszyklus.
//!
//! Der Treiber schreibt pro Vorschlag einen [`InteractionRecord`] als JSONL.
//! Dieselben Zeilen dienen als Eingabe für das Replay der Antworten und für
//! die nachträgliche Auswertung.

use crate::Context;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    /// ISO-8601-Zeitstempel des Zyklus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub location: String,
    pub activity: String,
    pub ability: String,
    pub accepted: bool,
    /// Score der Fähigkeit nach dem Update, falls bekannt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_after: Option<f64>,
}

impl InteractionRecord {
    #[must_use]
    pub fn context(&self) -> Context {
        Context::new(self.location.clone(), self.activity.clone())
    }
}

/// Liest JSONL-Zeilen; Leerzeilen werden übersprungen.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<InteractionRecord>, serde_json::Error> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(serde_json::Error::io)?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
