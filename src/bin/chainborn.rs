//! Chainborn CLI: genesis, allocation plans, evolution replays and pool churn
//!
//! Commands:
//!   chainborn genesis  build a population from a block seed
//!   chainborn plan     show a role allocation
//!   chainborn evolve   replay confirmation counts through the engine
//!   chainborn pool     random acquire/release churn with an integrity check
//!   chainborn demo     all of the above with the default config

use chainborn_core::allocation::AllocationPlanner;
use chainborn_core::pool::{Particle, ParticleInit, ParticlePool, SlotHandle};
use chainborn_core::{ChainbornConfig, Organism, Population, Role, RngState, Seed, TraitSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::str::FromStr;

fn print_usage() {
    println!(
        r#"
Chainborn: block-seeded organisms

Usage: chainborn <command> [options]

Commands:
  genesis <seed> [population]            Build a population and list a sample
  plan    <seed> <total> <base>          Role allocation for a seed
  evolve  <seed> <from> <to> [step]      Advance confirmations, print mutations
  pool    <capacity> <ops>               Pool churn + validate
  demo                                   Run every stage with defaults

Seeds accept decimal or 0x-prefixed hex. Set CHAINBORN_CONFIG to a JSON
config file to override the defaults.

Examples:
  chainborn genesis 0x75bcd15
  chainborn plan 123456789 500 40
  chainborn evolve 42 0 1000000 5000
  chainborn pool 640 100000
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let outcome = match args[1].as_str() {
        "genesis" => cmd_genesis(&args[2..]),
        "plan" => cmd_plan(&args[2..]),
        "evolve" => cmd_evolve(&args[2..]),
        "pool" => cmd_pool(&args[2..]),
        "demo" => cmd_demo(),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("  Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn parse<T: FromStr>(value: Option<&String>, what: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T::Err: std::fmt::Display,
{
    let raw = value.ok_or_else(|| format!("missing <{}>", what))?;
    raw.parse::<T>()
        .map_err(|e| format!("invalid <{}> '{}': {}", what, raw, e).into())
}

/// Defaults, or the file named by CHAINBORN_CONFIG
fn load_config() -> Result<ChainbornConfig, Box<dyn std::error::Error>> {
    match env::var("CHAINBORN_CONFIG") {
        Ok(path) => {
            let config = ChainbornConfig::load(&path)?;
            println!("  Loaded config from {}", path);
            Ok(config)
        }
        Err(_) => Ok(ChainbornConfig::default()),
    }
}

fn cmd_genesis(args: &[String]) -> CliResult {
    let seed: Seed = parse(args.first(), "seed")?;
    let mut config = load_config()?;
    if let Some(raw) = args.get(1) {
        config.initial_population = parse(Some(raw), "population")?;
        config.pool_capacity = config.pool_capacity.max(config.initial_population as usize);
        config.base_count_per_role = config
            .base_count_per_role
            .min(config.initial_population / Role::ALL.len() as u32);
    }

    let population = Population::genesis(config, seed)?;
    println!("\n  Population of {} from seed {}", population.len(), seed);
    print_role_counts(&population);
    println!("\n  Sample:");
    for organism in population.organisms().take(5) {
        println!("  {}", organism.summary());
    }
    Ok(())
}

fn cmd_plan(args: &[String]) -> CliResult {
    let seed: Seed = parse(args.first(), "seed")?;
    let total: u32 = parse(args.get(1), "total")?;
    let base: u32 = parse(args.get(2), "base")?;

    let config = load_config()?;
    let planner = AllocationPlanner::new(config.planner);
    let mut rng = RngState::seed(seed).derive("allocation");
    let plan = planner.plan_roles(total, base, &mut rng)?;

    println!("\n  Allocation of {} (base {}) for seed {}:", total, base, seed);
    for (role, count) in &plan {
        println!("  {:<10} {:>6}", role, count);
    }
    println!("  {:<10} {:>6}", "total", plan.values().sum::<u32>());
    Ok(())
}

fn cmd_evolve(args: &[String]) -> CliResult {
    let seed: Seed = parse(args.first(), "seed")?;
    let from: u64 = parse(args.get(1), "from")?;
    let to: u64 = parse(args.get(2), "to")?;
    let step: u64 = match args.get(3) {
        Some(raw) => parse(Some(raw), "step")?,
        None => 1_000,
    };
    if step == 0 || to < from {
        return Err("need step > 0 and to >= from".into());
    }

    let mut population = Population::genesis(load_config()?, seed)?;
    let mut count = from;
    let mut total = 0;
    loop {
        // Each block along the way supplies its own nonce
        let nonce = Seed::new(RngState::seed(seed).derive(&format!("block:{}", count)).raw());
        for event in population.advance(count, nonce) {
            println!("  {}", event.summary());
            total += 1;
        }
        if count == to {
            break;
        }
        count = count.saturating_add(step).min(to);
    }

    let stats = population.engine().stats();
    println!(
        "\n  {} -> {}: {} rolls, {} successes, {} events, population {}",
        from, to, stats.rolls, stats.successes, total, population.len()
    );
    Ok(())
}

fn cmd_pool(args: &[String]) -> CliResult {
    let capacity: usize = parse(args.first(), "capacity")?;
    let ops: usize = parse(args.get(1), "ops")?;

    let mut pool: ParticlePool<Particle> = ParticlePool::new(capacity)?;
    let mut live: Vec<SlotHandle> = Vec::new();
    let mut rng = StdRng::seed_from_u64(capacity as u64 ^ ops as u64);
    let mut refused = 0u64;

    for n in 0..ops {
        if live.is_empty() || rng.gen_bool(0.55) {
            let organism = Organism::new(Seed::new(n as u32), Role::Wanderer, TraitSet::default(), n as u64);
            match pool.acquire(ParticleInit { organism, position: [0.0; 3] }) {
                Ok(handle) => live.push(handle),
                Err(_) => refused += 1,
            }
        } else {
            let handle = live.swap_remove(rng.gen_range(0..live.len()));
            pool.release(handle)?;
        }
    }

    let report = pool.validate();
    let stats = pool.stats();
    println!("\n  Pool of {} after {} ops:", capacity, ops);
    println!(
        "  active={} free={} peak={} refused={}",
        pool.active_count(),
        pool.free_count(),
        stats.peak_active,
        refused
    );
    println!("  {}", report.summary());
    Ok(())
}

fn print_role_counts(population: &Population) {
    for (role, count) in population.role_counts() {
        println!("  {:<10} {:>6}", role, count);
    }
}

fn cmd_demo() -> CliResult {
    println!("\n  Chainborn demo");
    println!("  {}", "-".repeat(60));

    let seed = Seed::new(123_456_789);
    println!("\nStep 1: Genesis from seed {}", seed);
    let mut population = Population::genesis(load_config()?, seed)?;
    print_role_counts(&population);

    println!("\nStep 2: Ambient drift");
    let mut drift = RngState::seed(seed).derive("drift");
    for round in 1..=3 {
        let records = population.mutate_all(&mut drift);
        println!("  round {}: {} trait changes", round, records);
    }

    println!("\nStep 3: Confirmations 0 -> 1,000,000");
    let mut confirmations = 0u64;
    while confirmations < 1_000_000 {
        confirmations += 10_000;
        let nonce = Seed::new(RngState::seed(seed).derive(&format!("block:{}", confirmations)).raw());
        for event in population.advance(confirmations, nonce) {
            println!("  {}", event.summary());
        }
    }

    println!("\nStep 4: Integrity check");
    let report = population.validate();
    println!("  {}", report.pool.summary());
    println!("  population {} / {} slots", population.len(), population.pool().capacity());
    Ok(())
}
