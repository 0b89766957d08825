use std::io::{self, Read};

use ansprache_core::{AgentConfig, Context, Proposal, ProposalPolicy, SimilarityTable};
use ansprache_scores::ProactiveAgent;
use serde::Serialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Serialize)]
struct ProposalRecord {
    ts: String,
    policy: String,
    context: Context,
    proposal: Proposal,
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Accepts `{"location": .., "activity": ..}`, `"location/activity"` or a bare
/// `location/activity` line. Empty input falls back to the living room.
fn parse_context(input: &str) -> Context {
    let fallback = || Context::new("living", "rest_relax");
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return fallback();
    }
    if let Ok(ctx) = serde_json::from_str::<Context>(trimmed) {
        return ctx;
    }
    let text = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => s,
        _ => trimmed.to_string(),
    };
    match text.split_once('/') {
        Some((location, activity)) => Context::new(location, activity),
        None => fallback(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let ctx = parse_context(&input);

    let config = AgentConfig::default();
    let similarity = SimilarityTable::uniform(&config.abilities, 0.0)?;
    let mut agent = ProactiveAgent::from_entropy(&config, similarity)?;
    let proposal = agent.propose(&ctx)?;

    let record = ProposalRecord {
        ts: iso8601_now(),
        policy: "ansprache-scores".to_string(),
        context: ctx,
        proposal,
    };

    serde_json::to_writer_pretty(io::stdout(), &record)?;
    println!();

    Ok(())
}
