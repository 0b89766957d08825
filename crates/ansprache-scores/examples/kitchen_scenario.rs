//! Zwei Zyklen in der Küche: "wipe" wird angenommen, "sweep" abgelehnt.

use ansprache_core::{AgentConfig, Context, ProposalPolicy, SimilarityTable};
use ansprache_scores::ProactiveAgent;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig {
        locations: vec!["kitchen".into()],
        activities: vec!["cleaning".into()],
        abilities: vec!["wipe".into(), "sweep".into()],
        ..AgentConfig::default()
    };
    let table = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": 0.5}}"#)?;
    let mut agent = ProactiveAgent::seeded(&config, table, 0)?;
    let ctx = Context::new("kitchen", "cleaning");

    for _ in 0..2 {
        let proposal = agent.propose(&ctx)?;
        let accepted = proposal.ability == "wipe";
        println!(
            "{ctx}: {} ({}) -> {}",
            proposal.ability,
            proposal.why,
            if accepted { "accepted" } else { "rejected" }
        );
        agent.feedback(&ctx, &proposal.ability, accepted)?;
    }

    println!("{}", serde_json::to_string_pretty(&agent.snapshot())?);
    Ok(())
}
