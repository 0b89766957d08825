//! Score-Update nach Annahme oder Ablehnung eines Vorschlags.
//!
//! Bei Annahme erhält die gewählte Fähigkeit das volle Inkrement, jede andere
//! Fähigkeit desselben Kontexts `importance * similarity` als Teilpunkte.
//! Eine Ablehnung wirkt nur lokal.

use crate::error::{Result, ScoreError};
use crate::log::{debug_event, warn_event};
use crate::store::ScoreStore;
use ansprache_core::{AgentConfig, Context, SimilarityTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Updater {
    /// Gewicht der Ähnlichkeitsweitergabe, `[0, 1]`.
    pub importance: f64,
    pub acceptance_increment: f64,
    pub rejection_decrement: f64,
}

impl Default for Updater {
    fn default() -> Self {
        Self {
            importance: 0.5,
            acceptance_increment: 1.0,
            rejection_decrement: 0.5,
        }
    }
}

/// Was ein einzelnes Update bewirkt hat.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Neuer Score der gewählten Fähigkeit.
    pub score: f64,
    /// Anzahl der Fähigkeiten, die Teilpunkte erhielten.
    pub propagated: usize,
    /// `false`, wenn die Fähigkeit keinen Eintrag in der Ähnlichkeitstabelle hat.
    pub similarity_known: bool,
}

impl Updater {
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            importance: config.importance,
            acceptance_increment: config.acceptance_increment,
            rejection_decrement: config.rejection_decrement,
        }
    }

    pub fn update(
        &self,
        store: &mut ScoreStore,
        table: &SimilarityTable,
        ctx: &Context,
        ability: &str,
        accepted: bool,
    ) -> Result<UpdateOutcome> {
        self.update_with_importance(store, table, ctx, ability, accepted, self.importance)
    }

    pub fn update_with_importance(
        &self,
        store: &mut ScoreStore,
        table: &SimilarityTable,
        ctx: &Context,
        ability: &str,
        accepted: bool,
        importance: f64,
    ) -> Result<UpdateOutcome> {
        // Alle Prüfungen laufen vor der ersten Mutation.
        store.get(ctx, ability)?;

        if !accepted {
            let score = store.apply_delta(ctx, ability, -self.rejection_decrement)?;
            debug_event!("rejected {ability} in {ctx}, score now {score}");
            return Ok(UpdateOutcome {
                score,
                propagated: 0,
                similarity_known: table.neighbours(ability).is_some(),
            });
        }

        if !(0.0..=1.0).contains(&importance) {
            return Err(ScoreError::InvalidImportance(importance));
        }

        let mut propagated = 0;
        let similarity_known = match table.neighbours(ability) {
            Some(neighbours) => {
                for (other, similarity) in neighbours {
                    if other == ability {
                        continue;
                    }
                    if !store.contains(ctx, other) {
                        debug_event!("skip propagation to {other}: not an ability of {ctx}");
                        continue;
                    }
                    store.apply_delta(ctx, other, importance * similarity)?;
                    propagated += 1;
                }
                true
            }
            None => {
                warn_event!("no similarity entry for {ability}; skipping propagation in {ctx}");
                false
            }
        };

        let score = store.apply_delta(ctx, ability, self.acceptance_increment)?;
        store.record_acceptance(ctx, ability)?;
        debug_event!("accepted {ability} in {ctx}, score now {score}, {propagated} neighbours nudged");

        Ok(UpdateOutcome {
            score,
            propagated,
            similarity_known,
        })
    }
}
