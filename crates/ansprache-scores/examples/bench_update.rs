use ansprache_core::{AgentConfig, Context, SimilarityTable};
use ansprache_scores::{ScoreStore, Selector, Updater};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::default();
    let table = SimilarityTable::uniform(&config.abilities, 0.3)?;
    let mut store = ScoreStore::from_config(&config)?;
    let mut selector = Selector::seeded(0);
    let updater = Updater::from_config(&config);
    let ctx = Context::new("kitchen", "cleaning");

    let iterations: u32 = 1_000_000;

    // Warmup
    for _ in 0..1000 {
        updater.update(&mut store, &table, &ctx, "suggest_recipe", true)?;
    }

    let start = Instant::now();
    for i in 0..iterations {
        updater.update(&mut store, &table, &ctx, "suggest_recipe", i % 3 != 0)?;
    }
    let duration = start.elapsed();
    println!("Update with propagation took: {:?}", duration);
    println!("Average per call: {:?}", duration / iterations);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = selector.select(&store, &ctx)?;
    }
    let duration = start.elapsed();
    println!("Selection over {} abilities took: {:?}", config.abilities.len(), duration);
    println!("Average per call: {:?}", duration / iterations);

    Ok(())
}
