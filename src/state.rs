//! Compact game state for Pyramid Solitaire.
//!
//! A `State` packs everything that changes during a game into one `u64`. It refers to
//! cards by their index in the `Deck`, so it only has meaning together with the deal it
//! was produced from.
//!
//! Layout:
//! - bits 0..52: one flag per deck index, set while that card is still in play. The low
//!   28 bits are the pyramid occupancy.
//! - bits 52..58: the stock index, the deck index of the top stock card. Cards above it
//!   that are still in play form the stock; cards from 28 up to it that are still in play
//!   form the waste pile. 52 means the stock is empty.
//! - bits 58..60: how many times the waste pile has been recycled.
//!
//! The stock index always points at a card still in play (or is 52), so every game
//! position has exactly one encoding.
use crate::cards::{DECK_SIZE, PYRAMID_SIZE};
use std::fmt;

const DECK_FLAGS_MASK: u64 = (1 << DECK_SIZE) - 1;
const PYRAMID_FLAGS_MASK: u64 = (1 << PYRAMID_SIZE) - 1;
const STOCK_INDEX_SHIFT: u32 = 52;
const STOCK_INDEX_MASK: u64 = 0b11_1111;
const RECYCLE_SHIFT: u32 = 58;
const RECYCLE_MASK: u64 = 0b11;

/// Stock index of an empty stock pile.
pub const EMPTY_STOCK: usize = DECK_SIZE;

/// Waste index of an empty waste pile.
pub const EMPTY_WASTE: usize = PYRAMID_SIZE - 1;

/// Deck index of the first stock card.
pub const FIRST_STOCK_INDEX: usize = PYRAMID_SIZE;

/// A packed Pyramid Solitaire position.
///
/// States can only be created through `State::initial` and the transitions in this
/// module, which keep the stock index normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(u64);

impl State {
    /// The state at the start of every game: all cards in play, no cards drawn yet.
    ///
    /// # Examples
    /// ```
    /// use pyramid_solver::state::State;
    /// let state = State::initial();
    /// assert_eq!(state.pyramid_flags(), (1 << 28) - 1);
    /// assert_eq!(state.stock_index(), 28);
    /// assert_eq!(state.waste_index(), 27);
    /// assert_eq!(state.recycle_count(), 0);
    /// ```
    pub fn initial() -> Self {
        State(((FIRST_STOCK_INDEX as u64) << STOCK_INDEX_SHIFT) | DECK_FLAGS_MASK)
    }

    /// Builds a state from its parts and moves the stock index forward to the next card
    /// still in play.
    fn normalized(deck_flags: u64, stock_index: usize, recycle_count: u8) -> Self {
        debug_assert!(deck_flags & !DECK_FLAGS_MASK == 0);
        debug_assert!((FIRST_STOCK_INDEX..=EMPTY_STOCK).contains(&stock_index));
        let mut index = stock_index;
        while index < EMPTY_STOCK && deck_flags & (1 << index) == 0 {
            index += 1;
        }
        State(
            ((recycle_count as u64 & RECYCLE_MASK) << RECYCLE_SHIFT)
                | ((index as u64) << STOCK_INDEX_SHIFT)
                | deck_flags,
        )
    }

    /// The raw packed value, usable as a hash key.
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// One flag per deck index, set while the card is in play.
    pub fn deck_flags(&self) -> u64 {
        self.0 & DECK_FLAGS_MASK
    }

    /// One flag per pyramid cell, set while the cell still holds its card.
    pub fn pyramid_flags(&self) -> u32 {
        (self.0 & PYRAMID_FLAGS_MASK) as u32
    }

    pub fn is_pyramid_clear(&self) -> bool {
        self.pyramid_flags() == 0
    }

    pub fn is_in_play(&self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Deck index of the top stock card, or `EMPTY_STOCK`.
    pub fn stock_index(&self) -> usize {
        ((self.0 >> STOCK_INDEX_SHIFT) & STOCK_INDEX_MASK) as usize
    }

    /// Deck index of the top waste card, or `EMPTY_WASTE`.
    pub fn waste_index(&self) -> usize {
        let mut index = self.stock_index() - 1;
        while index > EMPTY_WASTE && !self.is_in_play(index) {
            index -= 1;
        }
        index
    }

    pub fn recycle_count(&self) -> u8 {
        ((self.0 >> RECYCLE_SHIFT) & RECYCLE_MASK) as u8
    }

    pub fn is_stock_empty(&self) -> bool {
        self.stock_index() == EMPTY_STOCK
    }

    pub fn is_waste_empty(&self) -> bool {
        self.waste_index() == EMPTY_WASTE
    }

    /// Deck indexes of the cards left in the stock, top first.
    pub fn stock_indexes(&self) -> impl Iterator<Item = usize> + '_ {
        (self.stock_index()..EMPTY_STOCK).filter(|&i| self.is_in_play(i))
    }

    /// Deck indexes of the cards in the waste pile, bottom first (the last one is on top).
    pub fn waste_indexes(&self) -> impl Iterator<Item = usize> + '_ {
        (FIRST_STOCK_INDEX..self.stock_index()).filter(|&i| self.is_in_play(i))
    }

    /// Moves the top stock card onto the waste pile.
    pub(crate) fn draw(&self) -> Self {
        debug_assert!(!self.is_stock_empty());
        State::normalized(
            self.deck_flags(),
            self.stock_index() + 1,
            self.recycle_count(),
        )
    }

    /// Turns the waste pile back over into the stock.
    pub(crate) fn recycle(&self) -> Self {
        debug_assert!(self.is_stock_empty());
        State::normalized(
            self.deck_flags(),
            FIRST_STOCK_INDEX,
            self.recycle_count() + 1,
        )
    }

    /// Takes the cards whose deck-index bits are set in `mask` out of play.
    pub(crate) fn remove(&self, mask: u64) -> Self {
        debug_assert!(self.deck_flags() & mask == mask);
        State::normalized(
            self.deck_flags() & !mask,
            self.stock_index(),
            self.recycle_count(),
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State({:#x}: pyramid {:#09x}, stock {}, waste {}, recycles {})",
            self.0,
            self.pyramid_flags(),
            self.stock_index(),
            self.waste_index(),
            self.recycle_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(stock_index: usize, recycles: u8, removed: &[usize]) -> State {
        let mask = removed.iter().fold(0u64, |m, &i| m | (1 << i));
        State::normalized(DECK_FLAGS_MASK & !mask, stock_index, recycles)
    }

    #[test]
    fn test_initial_state_bits() {
        assert_eq!(State::initial().bits(), 0x1CF_FFFF_FFFF_FFFF);
        assert_eq!(State::initial().deck_flags(), DECK_FLAGS_MASK);
        assert!(!State::initial().is_pyramid_clear());
    }

    #[test]
    fn test_waste_index_skips_removed_cards() {
        assert_eq!(state_with(52, 0, &[]).waste_index(), 51);
        assert_eq!(state_with(52, 0, &[48, 49, 50, 51]).waste_index(), 47);
        assert_eq!(state_with(30, 0, &[28, 29]).waste_index(), EMPTY_WASTE);
    }

    #[test]
    fn test_stock_index_normalized_past_removed_cards() {
        let state = state_with(28, 0, &[28, 29]);
        assert_eq!(state.stock_index(), 30);
        let empty = state_with(50, 1, &[50, 51]);
        assert!(empty.is_stock_empty());
        assert_eq!(empty.recycle_count(), 1);
    }

    #[test]
    fn test_draw_recycle_remove_transitions() {
        let start = State::initial();
        let drawn = start.draw();
        assert_eq!(drawn.stock_index(), 29);
        assert_eq!(drawn.waste_index(), 28);

        let removed = drawn.remove(1 << 29);
        assert_eq!(removed.stock_index(), 30);
        assert_eq!(removed.waste_index(), 28);

        let mut exhausted = start;
        while !exhausted.is_stock_empty() {
            exhausted = exhausted.draw();
        }
        let recycled = exhausted.recycle();
        assert_eq!(recycled.stock_index(), 28);
        assert_eq!(recycled.recycle_count(), 1);
        assert!(recycled.is_waste_empty());
        assert_ne!(recycled, start);
    }

    #[test]
    fn test_pile_iterators() {
        let state = state_with(31, 0, &[29, 40]);
        assert_eq!(state.waste_indexes().collect::<Vec<_>>(), vec![28, 30]);
        assert_eq!(state.stock_indexes().count(), 52 - 31 - 1);
        assert_eq!(state.stock_indexes().next(), Some(31));
    }

    #[test]
    fn test_pyramid_clear_ignores_stock() {
        let pyramid: Vec<usize> = (0..PYRAMID_SIZE).collect();
        let state = state_with(28, 0, &pyramid);
        assert!(state.is_pyramid_clear());
        assert_eq!(state.stock_indexes().count(), 24);
    }
}
