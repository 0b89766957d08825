//! Example demonstrating acceptance analysis over a simulated interaction log.
//!
//! Run with: cargo run -p ansprache-feedback --example feedback_analysis

use ansprache_core::InteractionRecord;
use ansprache_feedback::AcceptanceAnalyzer;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== ansprache: Acceptance Analysis ===\n");

    let records = vec![
        // Paperwork in the bedroom is not welcome
        interaction("bed_room", "rest_relax", "organize_documents", false),
        interaction("bed_room", "rest_relax", "organize_documents", false),
        interaction("bed_room", "rest_relax", "organize_documents", false),
        interaction("bed_room", "rest_relax", "organize_documents", false),
        interaction("bed_room", "rest_relax", "organize_documents", true),
        interaction("bed_room", "rest_relax", "organize_documents", false),
        // Coming home: locks and forgotten items go down well
        interaction("living", "return_from_others", "check_locks", true),
        interaction("living", "return_from_others", "check_locks", true),
        interaction("living", "return_from_others", "check_forgotten_items", true),
        interaction("living", "return_from_others", "check_locks", false),
        // Cleaning in the kitchen
        interaction("kitchen", "cleaning", "chore_reminder", true),
        interaction("kitchen", "cleaning", "suggest_recipe", false),
        interaction("kitchen", "cleaning", "chore_reminder", true),
    ];

    println!("📊 Analyzing {} interactions...\n", records.len());

    let analyzer = AcceptanceAnalyzer::default();

    println!("📈 Statistics by ability:");
    let by_ability = analyzer.aggregate(&records, |r| Some(r.ability.clone()));
    for (ability, stats) in &by_ability {
        println!(
            "  {} → accepted: {}/{} ({:.1}%)",
            ability,
            stats.accepted,
            stats.total,
            stats.acceptance_rate() * 100.0
        );
    }
    println!();

    println!("🔍 Identified patterns:");
    let patterns = analyzer.analyze_patterns(&records);
    if patterns.is_empty() {
        println!("  (none detected with current thresholds)");
    }
    for pattern in &patterns {
        println!("  • {pattern}");
    }
    println!();

    match analyzer.report(&records) {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => println!("Not enough interactions for a report."),
    }

    Ok(())
}

fn interaction(location: &str, activity: &str, ability: &str, accepted: bool) -> InteractionRecord {
    InteractionRecord {
        ts: None,
        location: location.to_string(),
        activity: activity.to_string(),
        ability: ability.to_string(),
        accepted,
        score_after: None,
    }
}
