//! Tabelle der gelernten Präferenzen: (Kontext, Fähigkeit) → Score.

use crate::error::{Result, ScoreError};
use ansprache_core::{AgentConfig, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Immer `>= 0`.
    pub score: f64,
    pub acceptance_count: u64,
}

/// Besitzt den gesamten gelernten Zustand eines Laufs.
///
/// Wird einmal vollständig initialisiert (jede Kombination aus Ort,
/// Aktivität und Fähigkeit) und danach nur noch in-place verändert.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    initial_score: f64,
    entries: BTreeMap<Context, BTreeMap<String, ScoreEntry>>,
    initialized: bool,
}

impl Default for ScoreStore {
    fn default() -> Self {
        Self {
            initial_score: 1.0,
            entries: BTreeMap::new(),
            initialized: false,
        }
    }
}

impl ScoreStore {
    /// Leerer, noch nicht initialisierter Store. Der Startscore muss endlich
    /// und `>= 0` sein.
    pub fn new(initial_score: f64) -> Result<Self> {
        if !initial_score.is_finite() || initial_score < 0.0 {
            return Err(ScoreError::InvalidInitialScore(initial_score));
        }
        Ok(Self {
            initial_score,
            ..Self::default()
        })
    }

    /// Validiert die Konfiguration und legt das volle Raster an.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        let mut store = Self::new(config.initial_score)?;
        store.initialize(&config.locations, &config.activities, &config.abilities)?;
        Ok(store)
    }

    /// Legt für jedes Tripel einen Eintrag mit Startscore und Zähler 0 an.
    ///
    /// Ein zweiter Aufruf ohne [`ScoreStore::reset`] schlägt fehl.
    pub fn initialize<S: AsRef<str>>(
        &mut self,
        locations: &[S],
        activities: &[S],
        abilities: &[S],
    ) -> Result<()> {
        if self.initialized {
            return Err(ScoreError::AlreadyInitialized);
        }
        let fresh = ScoreEntry {
            score: self.initial_score,
            acceptance_count: 0,
        };
        for location in locations {
            let location: &str = location.as_ref();
            for activity in activities {
                let activity: &str = activity.as_ref();
                let row = self.entries.entry(Context::new(location, activity)).or_default();
                for ability in abilities {
                    let ability: &str = ability.as_ref();
                    row.insert(ability.to_string(), fresh);
                }
            }
        }
        self.initialized = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.initialized = false;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn get(&self, ctx: &Context, ability: &str) -> Result<&ScoreEntry> {
        self.entries
            .get(ctx)
            .and_then(|row| row.get(ability))
            .ok_or_else(|| not_found(ctx, ability))
    }

    #[must_use]
    pub fn contains(&self, ctx: &Context, ability: &str) -> bool {
        self.entries.get(ctx).is_some_and(|row| row.contains_key(ability))
    }

    /// Alle Einträge eines Kontexts, nach Fähigkeit sortiert.
    #[must_use]
    pub fn entries_for(&self, ctx: &Context) -> Vec<(&str, &ScoreEntry)> {
        self.entries
            .get(ctx)
            .map(|row| row.iter().map(|(a, e)| (a.as_str(), e)).collect())
            .unwrap_or_default()
    }

    /// `score = max(0, score + delta)`; liefert den neuen Score.
    pub fn apply_delta(&mut self, ctx: &Context, ability: &str, delta: f64) -> Result<f64> {
        let entry = self.entry_mut(ctx, ability)?;
        entry.score = (entry.score + delta).max(0.0);
        Ok(entry.score)
    }

    /// Zählt eine Annahme; liefert den neuen Zählerstand.
    pub fn record_acceptance(&mut self, ctx: &Context, ability: &str) -> Result<u64> {
        let entry = self.entry_mut(ctx, ability)?;
        entry.acceptance_count += 1;
        Ok(entry.acceptance_count)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lesende Sicht pro Kontext, z. B. `{"kitchen/cleaning": {"wipe": {...}}}`.
    pub fn snapshot(&self) -> Result<Value> {
        let mut out = Map::new();
        for (ctx, row) in &self.entries {
            out.insert(ctx.to_string(), serde_json::to_value(row)?);
        }
        Ok(Value::Object(out))
    }

    /// Nur ein einzelner Kontext.
    pub fn snapshot_context(&self, ctx: &Context) -> Result<Value> {
        let row = self
            .entries
            .get(ctx)
            .ok_or_else(|| ScoreError::EmptyContext(ctx.clone()))?;
        Ok(serde_json::to_value(row)?)
    }

    fn entry_mut(&mut self, ctx: &Context, ability: &str) -> Result<&mut ScoreEntry> {
        self.entries
            .get_mut(ctx)
            .and_then(|row| row.get_mut(ability))
            .ok_or_else(|| not_found(ctx, ability))
    }
}

fn not_found(ctx: &Context, ability: &str) -> ScoreError {
    ScoreError::NotFound {
        context: ctx.clone(),
        ability: ability.to_string(),
    }
}
