//! District Opt CLI - Inspect configurations and checkpoints.

use std::fs;
use std::ops::Range;
use std::path::Path;

use district_opt::{
    compute::evolution::load_checkpoint,
    schema::{Checkpoint, OptimizationConfig, SearchSpace},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => print_example_config(),
        "bounds" if args.len() > 2 => print_bounds(Path::new(&args[2])),
        "inspect" if args.len() > 2 => print_checkpoint(Path::new(&args[2])),
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command>", program);
    eprintln!();
    eprintln!("Inspect district optimization configurations and checkpoints.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  --example                  Print an example configuration");
    eprintln!("  bounds <config.json>       Validate a configuration and print gene bounds");
    eprintln!("  inspect <checkpoint.json>  Summarize a saved checkpoint");
}

fn print_example_config() {
    let config = OptimizationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_bounds(path: &Path) {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: OptimizationConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let space = SearchSpace::from_layout(&config.layout);
    let blocks = space.blocks();

    println!("District Search Space");
    println!("=====================");
    println!(
        "Genes: {} ({} discrete, {} continuous)",
        space.len(),
        space.discrete_count(),
        space.len() - space.discrete_count()
    );
    println!();

    let named: [(&str, &Range<usize>); 6] = [
        ("Technology activation", &blocks.technology_activation),
        ("Heat recovery", &blocks.heat_recovery),
        ("Solar activation", &blocks.solar_activation),
        ("Building connections", &blocks.connections),
        ("Technology shares", &blocks.technology_shares),
        ("Solar shares", &blocks.solar_shares),
    ];

    for (name, range) in named {
        println!("{} [{}..{}]:", name, range.start, range.end);
        for i in range.clone() {
            let (lo, hi) = space.bounds(i);
            if space.is_discrete(i) {
                println!("  gene {:>3}: {}..={}", i, lo, hi);
            } else {
                println!("  gene {:>3}: {:.1}..={:.1}", i, lo, hi);
            }
        }
    }
}

fn print_checkpoint(path: &Path) {
    let checkpoint: Checkpoint = load_checkpoint(path).unwrap_or_else(|e| {
        eprintln!("Error loading checkpoint: {}", e);
        std::process::exit(1);
    });

    println!("Checkpoint {}", path.display());
    println!("==========");
    println!("Generation: {}", checkpoint.generation);
    println!("Population: {}", checkpoint.population.len());
    println!("Last offspring batch: {}", checkpoint.tested_population.len());
    println!("Network patterns: {}", checkpoint.network_list.len());

    if checkpoint.eps_indicator.is_empty() {
        println!("Eps indicator: none");
    } else {
        println!("Eps indicator:");
        for (g, eps) in checkpoint.eps_indicator.iter().enumerate() {
            println!("  Generation {}: {:.6}", g + 1, eps);
        }
    }
    println!();

    println!("Front (cost, co2, primary energy):");
    let mut front = checkpoint.population_fitness.clone();
    front.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    for fitness in front {
        if fitness.is_penalty() {
            println!("  failed evaluation");
        } else {
            println!(
                "  {:>14.4} {:>14.4} {:>14.4}",
                fitness.cost, fitness.co2, fitness.primary_energy
            );
        }
    }
}
