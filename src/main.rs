use bst_containers::{TreeMap, TreeSet};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Instant;

struct Config {
    seed: u64,
    ops: usize,
    key_range: u32,
}

impl Config {
    const DEFAULT_SEED: u64 = 12345;
    const DEFAULT_OPS: usize = 10_000;
    const DEFAULT_KEY_RANGE: u32 = 1_000;

    fn from_env() -> Self {
        Config {
            seed: env_or("BST_DEMO_SEED", Self::DEFAULT_SEED),
            ops: env_or("BST_DEMO_OPS", Self::DEFAULT_OPS),
            key_range: env_or("BST_DEMO_KEY_RANGE", Self::DEFAULT_KEY_RANGE).max(1),
        }
    }
}

fn env_or<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{}={:?} is not valid, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn main() {
    env_logger::init();
    let config = Config::from_env();
    info!(
        "seed={} ops={} key_range={}",
        config.seed, config.ops, config.key_range
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut map = TreeMap::new();
    let mut model = BTreeMap::new();
    let mut mismatches = 0usize;

    let start = Instant::now();
    for op_idx in 0..config.ops {
        let key = rng.gen_range(0..config.key_range);
        match rng.gen_range(0..10u8) {
            0..=4 => {
                let (_, inserted) = map.insert(key, op_idx);
                if inserted {
                    model.insert(key, op_idx);
                }
            }
            5 => {
                map.insert_or_assign(key, op_idx);
                model.insert(key, op_idx);
            }
            6..=7 => {
                if map.remove(&key) != model.remove(&key) {
                    mismatches += 1;
                }
            }
            _ => {
                if map.at(&key).ok() != model.get(&key) {
                    debug!("lookup mismatch for key {}", key);
                    mismatches += 1;
                }
            }
        }
    }
    let elapsed = start.elapsed();

    if !map.iter().eq(model.iter()) {
        mismatches += 1;
    }
    info!(
        "{} ops in {:?}, {} entries, {} mismatches",
        config.ops,
        elapsed,
        map.len(),
        mismatches
    );

    // Walk back from the end, STL style.
    let mut pos = map.end();
    let mut tail = Vec::new();
    for _ in 0..5 {
        pos.move_prev(&map);
        match map.entry_at(pos) {
            Ok((k, _)) => tail.push(*k),
            Err(_) => break,
        }
    }
    println!("largest keys: {:?}", tail);

    let evens: TreeSet<u32> = map.keys().copied().filter(|k| k % 2 == 0).collect();
    let mut odds: TreeSet<u32> = map.keys().copied().filter(|k| k % 2 == 1).collect();
    let mut all = evens.clone();
    all.merge(&mut odds);
    println!(
        "{} entries, {} even keys, merged set holds {} keys, {} mismatches",
        map.len(),
        evens.len(),
        all.len(),
        mismatches
    );

    if mismatches > 0 {
        std::process::exit(1);
    }
}
