//! Gemeinsame Typen und Traits für den proaktiven Gesprächsagenten.
//!
//! Ein [`Context`] ist das Paar aus Ort und Nutzeraktivität. Eine
//! [`ProposalPolicy`] wählt pro Kontext eine Fähigkeit ("ability") aus und
//! lernt aus Annahme oder Ablehnung. Ob überhaupt angesprochen wird
//! ([`ConversationGate`]) und wie die Antwort zustande kommt
//! ([`ResponseSource`]), liegt außerhalb der Policy.

#![warn(clippy::unwrap_used, clippy::expect_used)]

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod record;
pub mod similarity;

pub use config::AgentConfig;
pub use record::InteractionRecord;
pub use similarity::SimilarityTable;

/// Ort und Aktivität, nach denen gelernte Präferenzen getrennt werden.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Context {
    pub location: String,
    pub activity: String,
}

impl Context {
    pub fn new(location: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            activity: activity.into(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.activity)
    }
}

/// Ein Vorschlag der Policy für einen Kontext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub context: Context,
    pub ability: String,
    /// Score der Fähigkeit zum Zeitpunkt der Auswahl.
    pub score: f64,
    pub why: String,
}

pub trait ProposalPolicy {
    type Error: std::error::Error;

    fn propose(&mut self, ctx: &Context) -> Result<Proposal, Self::Error>;
    fn feedback(&mut self, ctx: &Context, ability: &str, accepted: bool)
        -> Result<(), Self::Error>;
    fn snapshot(&self) -> serde_json::Value;
}

/// Entscheidet pro Zyklus, ob der Agent überhaupt ein Gespräch beginnt.
pub trait ConversationGate {
    fn should_initiate(&mut self, ctx: &Context) -> bool;
}

impl<F> ConversationGate for F
where
    F: FnMut(&Context) -> bool,
{
    fn should_initiate(&mut self, ctx: &Context) -> bool {
        self(ctx)
    }
}

/// Liefert die Reaktion des Nutzers auf einen Vorschlag.
///
/// `None` bedeutet, dass die Quelle erschöpft ist (Ende eines Replay-Logs,
/// EOF auf stdin); der Treiber beendet dann die Simulation.
pub trait ResponseSource {
    fn respond(&mut self, proposal: &Proposal) -> Option<bool>;
}

impl<F> ResponseSource for F
where
    F: FnMut(&Proposal) -> Option<bool>,
{
    fn respond(&mut self, proposal: &Proposal) -> Option<bool> {
        self(proposal)
    }
}
