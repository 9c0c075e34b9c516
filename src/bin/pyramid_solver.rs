use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use pyramid_solver::cards::Deck;
use pyramid_solver::solver::Solver;
use pyramid_solver::state::State;
use pyramid_solver::utils::{format_actions, format_state, read_deck_file};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to a deck file: 52 cards like "Ah Td 2c", pyramid first, then the stock
    deck_file: Option<PathBuf>,

    /// Solve a random deal generated from this seed instead of reading a file
    #[clap(short, long, conflicts_with = "deck_file")]
    seed: Option<u64>,

    /// Give up after expanding this many search nodes
    #[clap(short, long)]
    max_expansions: Option<u64>,
}

fn load_deck(args: &Args) -> Result<Deck> {
    match (&args.deck_file, args.seed) {
        (Some(path), _) => read_deck_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load deck from {}", path.display())),
        (None, Some(seed)) => Ok(Deck::new_random_with_seed(seed)),
        (None, None) => bail!("Pass a deck file or --seed"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let deck = load_deck(&args)?;
    println!("Initial deal:\n{}\n", format_state(&deck, State::initial()));

    let mut solver = Solver::new(deck);
    if let Some(limit) = args.max_expansions {
        info!("limiting search to {} expansions", limit);
        solver = solver.with_max_expansions(limit);
    }

    match solver.solve()? {
        Some(solution) => {
            println!("Clear the board in {} steps:", solution.len());
            println!("{}", format_actions(&solution.actions));
        }
        None => println!("The pyramid cannot be cleared."),
    }

    let stats = solver.stats();
    println!(
        "\nExpanded {} nodes, {} distinct states, {} pyramid boards in {:.2?}",
        stats.expanded, stats.seen_states, stats.cached_boards, stats.elapsed
    );
    Ok(())
}
