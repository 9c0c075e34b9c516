//! Rules of Pyramid Solitaire over packed `State`s.
//!
//! This module defines:
//! - Pyramid geometry: which cells cover which (`COVER_MASKS`) and when a cell is exposed.
//! - `Action`: one player action, with enough detail for a caller to perform it on screen.
//! - `RuleEngine`: successor generation, unwinnable detection and heuristic costs for one
//!   deal, memoized per pyramid occupancy.
//!
//! Rule variant: the top stock card is face up and playable, and the waste pile may be
//! recycled into the stock `MAX_RECYCLES` times (three passes through the stock).
use crate::cards::{cards_are_removable, Card, Deck, DECK_SIZE, PYRAMID_SIZE};
use crate::heuristics::{heuristic_cost, king_cells, partner_masks};
use crate::state::State;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Number of rows in the pyramid.
pub const PYRAMID_ROWS: usize = 7;

/// All 28 pyramid cells.
pub const PYRAMID_MASK: u32 = (1 << PYRAMID_SIZE) - 1;

/// How many times the waste pile may be turned back into the stock.
pub const MAX_RECYCLES: u8 = 2;

const fn cover_masks() -> [u32; PYRAMID_SIZE] {
    let mut masks = [0u32; PYRAMID_SIZE];
    let mut row = PYRAMID_ROWS;
    while row > 0 {
        row -= 1;
        let mut col = 0;
        while col <= row {
            let cell = row * (row + 1) / 2 + col;
            let mut mask = 1u32 << cell;
            if row + 1 < PYRAMID_ROWS {
                let below = (row + 1) * (row + 2) / 2 + col;
                mask |= masks[below] | masks[below + 1];
            }
            masks[cell] = mask;
            col += 1;
        }
    }
    masks
}

/// For each cell, its own bit plus the bits of every cell covering it from below.
///
/// A cell is exposed once all the covering cells are empty.
pub const COVER_MASKS: [u32; PYRAMID_SIZE] = cover_masks();

/// Returns true if the card at `cell` is still in the pyramid and nothing covers it.
pub fn is_exposed(cell: usize, pyramid_flags: u32) -> bool {
    pyramid_flags & COVER_MASKS[cell] == 1 << cell
}

/// Cells that can never share a removal with `cell`: itself, the cells covering it, and
/// the cells it covers.
pub fn related_cells(cell: usize) -> u32 {
    (0..PYRAMID_SIZE)
        .filter(|&other| COVER_MASKS[other] & (1 << cell) != 0)
        .fold(COVER_MASKS[cell], |mask, other| mask | (1 << other))
}

/// Converts a pyramid cell index into (row, column), both 0-based from the apex.
pub fn cell_position(cell: usize) -> (usize, usize) {
    let mut row = 0;
    while (row + 1) * (row + 2) / 2 <= cell {
        row += 1;
    }
    (row, cell - row * (row + 1) / 2)
}

/// Where a removed card was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// A pyramid cell, numbered 0..28 from the apex, row by row.
    Pyramid(usize),
    /// The top of the stock pile.
    Stock,
    /// The top of the waste pile.
    Waste,
}

/// A card leaving play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Removal {
    pub card: Card,
    pub location: Location,
}

/// One player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the top stock card onto the waste pile.
    Draw,
    /// Turn the waste pile over to form a new stock.
    Recycle,
    /// Remove a King.
    Remove(Removal),
    /// Remove two cards whose values add to 13.
    RemovePair(Removal, Removal),
}

impl Action {
    /// Compares actions, treating the two halves of a pair as unordered.
    pub fn same_as(&self, other: &Action) -> bool {
        match (self, other) {
            (Action::RemovePair(a, b), Action::RemovePair(c, d)) => {
                (a == c && b == d) || (a == d && b == c)
            }
            _ => self == other,
        }
    }

    /// The cards this action takes out of play.
    pub fn removed_cards(&self) -> Vec<Card> {
        match self {
            Action::Draw | Action::Recycle => Vec::new(),
            Action::Remove(r) => vec![r.card],
            Action::RemovePair(a, b) => vec![a.card, b.card],
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Pyramid(cell) => {
                let (row, col) = cell_position(*cell);
                write!(f, "pyramid row {} col {}", row + 1, col + 1)
            }
            Location::Stock => write!(f, "stock"),
            Location::Waste => write!(f, "waste"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Draw => write!(f, "Draw"),
            Action::Recycle => write!(f, "Recycle"),
            Action::Remove(r) => write!(f, "Remove {} ({})", r.card, r.location),
            Action::RemovePair(a, b) => write!(
                f,
                "Remove {} ({}) and {} ({})",
                a.card, a.location, b.card, b.location
            ),
        }
    }
}

/// Everything about a pyramid occupancy that does not depend on the stock and waste.
#[derive(Clone, Debug)]
struct PyramidCache {
    is_clear: bool,
    heuristic_cost: u8,
    /// Exposed cells holding a card other than a King, candidates for stock/waste pairs.
    pairable_cells: Vec<u8>,
    /// Deck-index masks of removals using only pyramid cards: lone Kings and exposed pairs.
    pyramid_removals: Vec<u64>,
}

impl PyramidCache {
    fn new(deck: &Deck, pyramid_flags: u32) -> Self {
        let exposed: Vec<usize> = (0..PYRAMID_SIZE)
            .filter(|&cell| is_exposed(cell, pyramid_flags))
            .collect();

        let mut pairable_cells = Vec::new();
        let mut pyramid_removals = Vec::new();
        for (n, &i) in exposed.iter().enumerate() {
            let card = deck.card(i);
            if cards_are_removable(card, None) {
                pyramid_removals.push(1u64 << i);
                continue;
            }
            pairable_cells.push(i as u8);
            for &j in &exposed[n + 1..] {
                if cards_are_removable(card, Some(deck.card(j))) {
                    pyramid_removals.push((1u64 << i) | (1u64 << j));
                }
            }
        }

        PyramidCache {
            is_clear: pyramid_flags == 0,
            heuristic_cost: heuristic_cost(deck, pyramid_flags),
            pairable_cells,
            pyramid_removals,
        }
    }
}

fn cache_entry<'a>(
    cache: &'a mut HashMap<u32, PyramidCache>,
    deck: &Deck,
    pyramid_flags: u32,
) -> &'a PyramidCache {
    cache
        .entry(pyramid_flags)
        .or_insert_with(|| PyramidCache::new(deck, pyramid_flags))
}

/// The rules of the game for one deal.
///
/// Work that depends only on which pyramid cells are occupied (exposed cards, pyramid-only
/// removals, heuristic cost) is computed once per occupancy and kept for the lifetime of
/// the engine. A `RuleEngine` is meant to be owned by a single solve.
///
/// # Examples
/// ```
/// use pyramid_solver::cards::Deck;
/// use pyramid_solver::engine::RuleEngine;
/// use pyramid_solver::state::State;
///
/// let mut engine = RuleEngine::new(Deck::sorted());
/// let start = State::initial();
/// assert!(!engine.is_pyramid_clear(start));
/// assert!(!engine.successors(start).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct RuleEngine {
    deck: Deck,
    partner_masks: [u64; PYRAMID_SIZE],
    king_cells: u32,
    cache: HashMap<u32, PyramidCache>,
}

impl RuleEngine {
    pub fn new(deck: Deck) -> Self {
        let partner_masks = partner_masks(&deck);
        let king_cells = king_cells(&deck);
        RuleEngine {
            deck,
            partner_masks,
            king_cells,
            cache: HashMap::new(),
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Number of distinct pyramid occupancies seen so far.
    pub fn cached_boards(&self) -> usize {
        self.cache.len()
    }

    /// Drops every memoized occupancy. Results are pure, so this only costs time.
    pub fn clear_cache(&mut self) {
        debug!("dropping {} cached pyramid boards", self.cache.len());
        self.cache.clear();
    }

    fn entry(&mut self, pyramid_flags: u32) -> &PyramidCache {
        cache_entry(&mut self.cache, &self.deck, pyramid_flags)
    }

    pub fn is_pyramid_clear(&mut self, state: State) -> bool {
        self.entry(state.pyramid_flags()).is_clear
    }

    /// Admissible estimate of the actions needed to clear the pyramid cells in
    /// `pyramid_flags`.
    pub fn heuristic_cost(&mut self, pyramid_flags: u32) -> u8 {
        self.entry(pyramid_flags).heuristic_cost
    }

    /// Returns true if some pyramid card can provably never be removed.
    ///
    /// A card other than a King needs a partner of complementary value that is still in
    /// play and not on the card's own cover chain. The check ignores how hard the partner
    /// is to reach, so it never rejects a state that can still be cleared.
    pub fn is_unwinnable(&self, state: State) -> bool {
        let deck_flags = state.deck_flags();
        let mut cells = state.pyramid_flags() & !self.king_cells;
        while cells != 0 {
            let cell = cells.trailing_zeros() as usize;
            if deck_flags & self.partner_masks[cell] == 0 {
                return true;
            }
            cells &= cells - 1;
        }
        false
    }

    /// All states reachable from `state` by exactly one action. Each result is distinct.
    pub fn successors(&mut self, state: State) -> Vec<State> {
        let entry = cache_entry(&mut self.cache, &self.deck, state.pyramid_flags());
        let deck = &self.deck;

        let mut results = Vec::with_capacity(entry.pyramid_removals.len() + 8);
        results.extend(entry.pyramid_removals.iter().map(|&mask| state.remove(mask)));

        let stock = (!state.is_stock_empty()).then(|| state.stock_index());
        let waste = (!state.is_waste_empty()).then(|| state.waste_index());
        let stock_card = stock.map(|i| deck.card(i));
        let waste_card = waste.map(|i| deck.card(i));

        match stock {
            Some(index) => {
                results.push(state.draw());
                if deck.card(index).is_king() {
                    results.push(state.remove(1 << index));
                }
            }
            None => {
                if waste.is_some() && state.recycle_count() < MAX_RECYCLES {
                    results.push(state.recycle());
                }
            }
        }
        if let (Some(index), Some(card)) = (waste, waste_card) {
            if card.is_king() {
                results.push(state.remove(1 << index));
            }
        }
        if let (Some(s), Some(w)) = (stock, waste) {
            if cards_are_removable(deck.card(s), Some(deck.card(w))) {
                results.push(state.remove((1 << s) | (1 << w)));
            }
        }
        for &cell in &entry.pairable_cells {
            let card = deck.card(cell as usize);
            if let (Some(s), Some(other)) = (stock, stock_card) {
                if cards_are_removable(card, Some(other)) {
                    results.push(state.remove((1 << cell) | (1 << s)));
                }
            }
            if let (Some(w), Some(other)) = (waste, waste_card) {
                if cards_are_removable(card, Some(other)) {
                    results.push(state.remove((1 << cell) | (1 << w)));
                }
            }
        }
        results
    }

    /// The action that turns `from` into `to`, or `None` if no single legal action does.
    pub fn action_between(&mut self, from: State, to: State) -> Option<Action> {
        if !self.successors(from).contains(&to) {
            return None;
        }
        let removed = from.deck_flags() & !to.deck_flags();
        if removed == 0 {
            return Some(if to.recycle_count() != from.recycle_count() {
                Action::Recycle
            } else {
                Action::Draw
            });
        }

        let removals: Vec<Removal> = (0..DECK_SIZE)
            .filter(|&i| removed & (1 << i) != 0)
            .map(|i| Removal {
                card: self.deck.card(i),
                location: if i < PYRAMID_SIZE {
                    Location::Pyramid(i)
                } else if i == from.stock_index() {
                    Location::Stock
                } else {
                    Location::Waste
                },
            })
            .collect();
        match removals.as_slice() {
            [one] => Some(Action::Remove(*one)),
            [a, b] => Some(Action::RemovePair(*a, *b)),
            _ => None,
        }
    }

    /// Performs `action` on `state`, or returns `None` if it is not legal there.
    pub fn apply(&mut self, state: State, action: &Action) -> Option<State> {
        self.successors(state).into_iter().find(|&next| {
            self.action_between(state, next)
                .is_some_and(|candidate| candidate.same_as(action))
        })
    }
}
