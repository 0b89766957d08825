//! Konfiguration des Agenten (Orte, Aktivitäten, Fähigkeiten, Lernraten).
//!
//! Dateiformat ist TOML. Jeder Wert hat einen Default, eine leere Datei ergibt
//! also den Standardkatalog.

use crate::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("`{field}` contains duplicate entry `{value}`")]
    Duplicate { field: &'static str, value: String },
    #[error("`{field}` = {value} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "default_activities")]
    pub activities: Vec<String>,
    #[serde(default = "default_abilities")]
    pub abilities: Vec<String>,
    /// Gewicht, mit dem Ähnlichkeiten bei Annahme weitergegeben werden.
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default = "default_initial_score")]
    pub initial_score: f64,
    #[serde(default = "default_acceptance_increment")]
    pub acceptance_increment: f64,
    #[serde(default = "default_rejection_decrement")]
    pub rejection_decrement: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_locations() -> Vec<String> {
    strings(&["bath_room", "bed_room", "living", "kitchen", "laundry"])
}

fn default_activities() -> Vec<String> {
    strings(&["use_internet", "return_from_others", "rest_relax", "cleaning"])
}

fn default_abilities() -> Vec<String> {
    strings(&[
        "check_locks",
        "call_someone",
        "small_talk",
        "check_forgotten_items",
        "organize_documents",
        "find_lost_items",
        "suggest_recipe",
        "pet_care_reminder",
        "check_meeting_time",
        "chore_reminder",
    ])
}

fn default_importance() -> f64 {
    0.5
}

fn default_initial_score() -> f64 {
    1.0
}

fn default_acceptance_increment() -> f64 {
    1.0
}

fn default_rejection_decrement() -> f64 {
    0.5
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            activities: default_activities(),
            abilities: default_abilities(),
            importance: default_importance(),
            initial_score: default_initial_score(),
            acceptance_increment: default_acceptance_increment(),
            rejection_decrement: default_rejection_decrement(),
        }
    }
}

impl AgentConfig {
    /// Liest und validiert eine TOML-Datei.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_set("locations", &self.locations)?;
        check_set("activities", &self.activities)?;
        check_set("abilities", &self.abilities)?;

        if !(0.0..=1.0).contains(&self.importance) {
            return Err(ConfigError::Invalid {
                field: "importance",
                value: self.importance,
                reason: "must be within [0, 1]",
            });
        }
        for (field, value) in [
            ("initial_score", self.initial_score),
            ("acceptance_increment", self.acceptance_increment),
            ("rejection_decrement", self.rejection_decrement),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    value,
                    reason: "must be finite and non-negative",
                });
            }
        }
        Ok(())
    }

    /// Kreuzprodukt aller Orte und Aktivitäten in Konfigurationsreihenfolge.
    #[must_use]
    pub fn contexts(&self) -> Vec<Context> {
        self.locations
            .iter()
            .flat_map(|l| self.activities.iter().map(move |a| Context::new(l.clone(), a.clone())))
            .collect()
    }
}

fn check_set(field: &'static str, values: &[String]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Empty(field));
    }
    let mut seen = BTreeSet::new();
    for v in values {
        if !seen.insert(v.as_str()) {
            return Err(ConfigError::Duplicate {
                field,
                value: v.clone(),
            });
        }
    }
    Ok(())
}
