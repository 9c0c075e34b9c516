//! # Pyramid Solver Library
//!
//! This library finds the shortest way to clear the 28-card pyramid in Pyramid Solitaire
//! for a fully known deal, or proves that the pyramid cannot be cleared. It uses A* over a
//! packed 64-bit game state with an admissible heuristic and a cheap unwinnable-state
//! check.
//!
//! It is used by two binaries:
//! - `pyramid_solver`: Solves a deal read from a file (or a seeded random deal) and prints
//!   the actions.
//! - `deal_survey`: Solves a batch of seeded random deals and reports how many can be
//!   cleared.
//!
//! ## Modules
//! - `cards`: `Card`, `Suit` and the validated 52-card `Deck`.
//! - `state`: The packed `State` codec.
//! - `engine`: Pyramid geometry, `Action`, and the `RuleEngine` with its per-occupancy cache.
//! - `heuristics`: The admissible cost estimate and the partner masks behind unwinnable
//!   detection.
//! - `queue`: `BucketQueue`, a FIFO priority queue for small integer priorities.
//! - `solver`: Search nodes, the A* driver and solution replay.
//! - `utils`: Deck files and text rendering.
//!
//! # Examples
//! ```
//! use pyramid_solver::cards::Deck;
//! use pyramid_solver::solve;
//!
//! let actions = solve(&Deck::sorted()).expect("the sorted deck can be cleared");
//! assert_eq!(actions.len(), 27);
//! ```

pub mod cards;
pub mod engine;
pub mod heuristics;
pub mod queue;
pub mod solver;
pub mod state;
pub mod utils;

pub use crate::solver::{replay, solve};
