//! Greedy-Auswahl mit zufälligem Tie-Break.
//!
//! Keine ε-Exploration: eine Fähigkeit, die einmal vorne
//! liegt, bleibt vorne, bis sie abgelehnt wird.

use crate::error::{Result, ScoreError};
use crate::store::ScoreStore;
use ansprache_core::Context;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Ergebnis einer Auswahl.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub ability: String,
    pub score: f64,
    /// Anzahl der Fähigkeiten, die sich den Maximalscore teilten.
    pub tied: usize,
}

#[derive(Debug)]
pub struct Selector<R = StdRng> {
    rng: R,
}

impl Selector<StdRng> {
    /// Reproduzierbare Auswahl, z. B. für Tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Selector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Wählt unter allen Fähigkeiten mit exakt maximalem Score gleichverteilt.
    pub fn select(&mut self, store: &ScoreStore, ctx: &Context) -> Result<Selection> {
        let entries = store.entries_for(ctx);
        if entries.is_empty() {
            return Err(ScoreError::EmptyContext(ctx.clone()));
        }

        let max_score = entries
            .iter()
            .map(|(_, e)| e.score)
            .fold(f64::NEG_INFINITY, f64::max);

        // Exakter Vergleich: viele Einträge starten gleich bei 1.0.
        #[allow(clippy::float_cmp)]
        let candidates: Vec<&str> = entries
            .iter()
            .filter(|(_, e)| e.score == max_score)
            .map(|(a, _)| *a)
            .collect();

        let ability = candidates
            .choose(&mut self.rng)
            .ok_or(ScoreError::Internal("no candidate reached the maximum score"))?;

        Ok(Selection {
            ability: (*ability).to_string(),
            score: max_score,
            tied: candidates.len(),
        })
    }

    /// Nur die gewählte Fähigkeit.
    pub fn select_ability(&mut self, store: &ScoreStore, ctx: &Context) -> Result<String> {
        self.select(store, ctx).map(|s| s.ability)
    }
}
