use ansprache_core::record::read_jsonl;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut by_ability: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for record in read_jsonl(reader)? {
        let entry = by_ability.entry(record.ability).or_default();
        entry.0 += 1;
        if record.accepted {
            entry.1 += 1;
        }
    }

    for (ability, (proposed, accepted)) in by_ability {
        let rate = f64::from(accepted) / f64::from(proposed);
        println!("{rate:.2}\t{ability}\t{accepted}/{proposed}");
    }

    Ok(())
}
