//! Kontextbezogene Auswahl von Fähigkeiten mit Lernen aus Annahme/Ablehnung.
//!
//! Der [`ProactiveAgent`] verbindet [`ScoreStore`], [`Selector`] und
//! [`Updater`] und implementiert das
//! [`ProposalPolicy`](ansprache_core::ProposalPolicy)-Trait. Pro Zyklus gilt
//! Idle → Proposed → Accepted | Rejected → Idle; Feedback ohne passenden
//! offenen Vorschlag wird abgewiesen.

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
mod log;
pub mod selector;
pub mod store;
pub mod updater;

pub use error::{Result, ScoreError};
pub use selector::{Selection, Selector};
pub use store::{ScoreEntry, ScoreStore};
pub use updater::{UpdateOutcome, Updater};

use ansprache_core::{AgentConfig, Context, Proposal, ProposalPolicy, SimilarityTable};
use crate::log::{debug_event, warn_event};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct ProactiveAgent<R = StdRng> {
    store: ScoreStore,
    selector: Selector<R>,
    updater: Updater,
    similarity: SimilarityTable,
    pending: Option<(Context, String)>,
    usage: BTreeMap<String, u64>,
}

impl ProactiveAgent<StdRng> {
    /// Reproduzierbarer Agent, z. B. für Tests und Simulationen mit `--seed`.
    pub fn seeded(config: &AgentConfig, similarity: SimilarityTable, seed: u64) -> Result<Self> {
        Self::with_selector(config, similarity, Selector::seeded(seed))
    }

    pub fn from_entropy(config: &AgentConfig, similarity: SimilarityTable) -> Result<Self> {
        Self::with_selector(config, similarity, Selector::from_entropy())
    }
}

impl<R: Rng> ProactiveAgent<R> {
    pub fn new(config: &AgentConfig, similarity: SimilarityTable, rng: R) -> Result<Self> {
        Self::with_selector(config, similarity, Selector::new(rng))
    }

    fn with_selector(
        config: &AgentConfig,
        similarity: SimilarityTable,
        selector: Selector<R>,
    ) -> Result<Self> {
        config.validate()?;
        let store = ScoreStore::from_config(config)?;
        let missing = similarity.missing_for(&config.abilities);
        if !missing.is_empty() {
            warn_event!(
                "similarity table has no entry for {} abilities: {}",
                missing.len(),
                missing.join(", ")
            );
        }
        Ok(Self {
            store,
            selector,
            updater: Updater::from_config(config),
            similarity,
            pending: None,
            usage: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    #[must_use]
    pub fn similarity(&self) -> &SimilarityTable {
        &self.similarity
    }

    #[must_use]
    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    /// Der offene Vorschlag, auf den Feedback erwartet wird.
    #[must_use]
    pub fn pending(&self) -> Option<(&Context, &str)> {
        self.pending.as_ref().map(|(c, a)| (c, a.as_str()))
    }

    /// Wie oft jede Fähigkeit über alle Kontexte beantwortet wurde.
    #[must_use]
    pub fn usage_counts(&self) -> &BTreeMap<String, u64> {
        &self.usage
    }

    #[must_use]
    pub fn entries_for(&self, ctx: &Context) -> Vec<(&str, &ScoreEntry)> {
        self.store.entries_for(ctx)
    }

    /// Verwirft einen offenen Vorschlag, z. B. wenn keine Antwort kam.
    pub fn abandon(&mut self) -> Option<(Context, String)> {
        self.pending.take()
    }

    fn snapshot_value(&self) -> Result<serde_json::Value> {
        Ok(json!({
            "contexts": self.store.snapshot()?,
            "usage_counts": self.usage,
            "pending": self.pending.as_ref().map(|(c, a)| json!({"context": c, "ability": a})),
        }))
    }
}

impl<R: Rng> ProposalPolicy for ProactiveAgent<R> {
    type Error = ScoreError;

    /// Wählt die Fähigkeit mit dem höchsten Score; Gleichstände werden
    /// zufällig aufgelöst.
    fn propose(&mut self, ctx: &Context) -> Result<Proposal> {
        let selection = self.selector.select(&self.store, ctx)?;
        if let Some((old_ctx, old_ability)) = self.pending.take() {
            debug_event!("dropping unanswered proposal {old_ability} in {old_ctx}");
        }
        self.pending = Some((ctx.clone(), selection.ability.clone()));
        Ok(Proposal {
            context: ctx.clone(),
            why: if selection.tied > 1 {
                format!("tie-break among {}", selection.tied)
            } else {
                "max score".into()
            },
            ability: selection.ability,
            score: selection.score,
        })
    }

    fn feedback(&mut self, ctx: &Context, ability: &str, accepted: bool) -> Result<()> {
        let matches = self
            .pending
            .as_ref()
            .is_some_and(|(c, a)| c == ctx && a == ability);
        if !matches {
            return Err(ScoreError::InvalidAcceptanceState {
                context: ctx.clone(),
                ability: ability.to_string(),
            });
        }
        // Offener Vorschlag und Zähler ändern sich nur nach erfolgreichem Update.
        self.updater
            .update(&mut self.store, &self.similarity, ctx, ability, accepted)?;
        self.pending = None;
        *self.usage.entry(ability.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn snapshot(&self) -> serde_json::Value {
        self.snapshot_value()
            .unwrap_or_else(|e| json!({"error": e.to_string()}))
    }
}
