use anyhow::Result;
use clap::Parser;
use log::warn;
use pyramid_solver::cards::Deck;
use pyramid_solver::solver::{SolveError, Solver};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Solve a batch of seeded random deals", long_about = None)]
struct Args {
    /// Number of deals to solve
    #[clap(short, long, default_value_t = 20)]
    deals: u64,

    /// Seed of the first deal; later deals use consecutive seeds
    #[clap(short = 's', long, default_value_t = 0)]
    start_seed: u64,

    /// Skip a deal after expanding this many search nodes
    #[clap(short, long, default_value_t = 5_000_000)]
    max_expansions: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Solving {} deals starting at seed {}...", args.deals, args.start_seed);

    let mut lengths: Vec<usize> = Vec::new();
    let mut unsolvable = 0;
    let mut skipped = 0;
    let mut total_time = Duration::ZERO;

    for seed in args.start_seed..args.start_seed + args.deals {
        let mut solver = Solver::new(Deck::new_random_with_seed(seed))
            .with_max_expansions(args.max_expansions);
        let outcome = solver.solve();
        let stats = solver.stats();
        total_time += stats.elapsed;

        match outcome {
            Ok(Some(solution)) => {
                println!(
                    "  Seed {:<6}: {:>3} steps ({} expanded, {:.2?})",
                    seed,
                    solution.len(),
                    stats.expanded,
                    stats.elapsed
                );
                lengths.push(solution.len());
            }
            Ok(None) => {
                println!("  Seed {:<6}: no solution ({} expanded)", seed, stats.expanded);
                unsolvable += 1;
            }
            Err(e @ SolveError::BudgetExhausted { .. }) => {
                warn!("seed {}: {}", seed, e);
                println!("  Seed {:<6}: skipped", seed);
                skipped += 1;
            }
        }
    }

    println!("\n--- Survey Complete ---");
    println!("Solved:     {}", lengths.len());
    println!("Unsolvable: {}", unsolvable);
    println!("Skipped:    {}", skipped);
    if !lengths.is_empty() {
        let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        let shortest = lengths.iter().min().copied().unwrap_or_default();
        let longest = lengths.iter().max().copied().unwrap_or_default();
        println!(
            "Steps:      average {:.2}, shortest {}, longest {}",
            average, shortest, longest
        );
    }
    println!("Total time: {:.2?}", total_time);
    Ok(())
}
