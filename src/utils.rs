use crate::cards::{Deck, PYRAMID_SIZE};
use crate::engine::{Action, PYRAMID_ROWS};
use crate::state::State;
use std::fs;
use std::path::Path;

/// Reads a deal from a text file.
///
/// The file holds the 52 cards as whitespace-separated two character tokens (rank from
/// `A23456789TJQK`, suit from `cdhs`) in deal order: the 28 pyramid cards from the apex
/// down, then the 24 stock cards from the top. Any layout works, so the pyramid is
/// usually drawn as a triangle with the stock on the last line.
///
/// # Arguments
/// * `path`: The file to read.
///
/// # Returns
/// * `Ok(Deck)` if the file holds a valid deal.
/// * `Err(String)` describing an unreadable file or the malformed, missing or duplicate
///   cards found in it.
pub fn read_deck_file(path: &Path) -> Result<Deck, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    content
        .parse::<Deck>()
        .map_err(|e| format!("Invalid deck in {}: {}", path.display(), e))
}

/// Renders the pyramid cards still in play as a triangle, followed by the stock and
/// waste piles. Removed pyramid cards are shown as `..`.
///
/// # Examples
/// ```
/// use pyramid_solver::cards::Deck;
/// use pyramid_solver::state::State;
/// use pyramid_solver::utils::format_state;
///
/// let text = format_state(&Deck::sorted(), State::initial());
/// assert!(text.starts_with("            Ac\n"));
/// assert!(text.contains("Stock: 3h 4h"));
/// assert!(text.contains("Waste: (empty)"));
/// ```
pub fn format_state(deck: &Deck, state: State) -> String {
    let mut output = String::new();
    let mut cell = 0;
    for row in 0..PYRAMID_ROWS {
        output.push_str(&" ".repeat(2 * (PYRAMID_ROWS - 1 - row)));
        let cards: Vec<String> = (0..=row)
            .map(|offset| {
                let index = cell + offset;
                if state.is_in_play(index) {
                    deck.card(index).to_string()
                } else {
                    "..".to_string()
                }
            })
            .collect();
        output.push_str(&cards.join("  "));
        output.push('\n');
        cell += row + 1;
    }
    debug_assert_eq!(cell, PYRAMID_SIZE);

    let pile = |indexes: Vec<usize>| {
        if indexes.is_empty() {
            "(empty)".to_string()
        } else {
            indexes
                .iter()
                .map(|&i| deck.card(i).to_string())
                .collect::<Vec<_>>()
                .join(" ")
        }
    };
    output.push_str(&format!("Stock: {}\n", pile(state.stock_indexes().collect())));
    output.push_str(&format!("Waste: {}\n", pile(state.waste_indexes().collect())));
    output.push_str(&format!("Recycles used: {}", state.recycle_count()));
    output
}

/// Formats actions as a numbered list, one per line.
pub fn format_actions(actions: &[Action]) -> String {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| format!("{:>3}. {}", i + 1, action))
        .collect::<Vec<_>>()
        .join("\n")
}
