use crate::cards::{Deck, PYRAMID_SIZE};
use crate::engine::related_cells;

/// Calculates a lower bound on the number of actions needed to clear the pyramid.
///
/// Every King still in the pyramid needs its own action. For each pair of values that add
/// to 13 (Ace and Queen, 2 and Jack, ... 6 and 7), one action removes at most one card of
/// each value, so at least `max(count(v), count(13 - v))` actions are needed for that pair.
/// The stock and waste piles can only help by supplying partners, never by removing two
/// pyramid cards of the same value at once, so the bound never overestimates.
///
/// A single action lowers the bound by at most one, which makes it consistent as well as
/// admissible.
///
/// # Arguments
/// * `deck`: The deal the pyramid flags refer to.
/// * `pyramid_flags`: One bit per pyramid cell still holding its card.
///
/// # Returns
/// The minimum number of remaining removal actions. Zero iff the pyramid is clear.
///
/// # Examples
/// ```
/// use pyramid_solver::cards::Deck;
/// use pyramid_solver::heuristics::heuristic_cost;
/// let deck = Deck::sorted();
/// // Cell 0 is Ac, cell 12 is Kc, cell 11 is Qc.
/// assert_eq!(heuristic_cost(&deck, 1 << 12), 1);
/// assert_eq!(heuristic_cost(&deck, (1 << 0) | (1 << 11)), 1);
/// assert_eq!(heuristic_cost(&deck, (1 << 0) | (1 << 13)), 2);
/// assert_eq!(heuristic_cost(&deck, 0), 0);
/// ```
pub fn heuristic_cost(deck: &Deck, pyramid_flags: u32) -> u8 {
    let mut counts = [0u8; 14];
    for cell in 0..PYRAMID_SIZE {
        if pyramid_flags & (1 << cell) != 0 {
            counts[deck.card(cell).value() as usize] += 1;
        }
    }
    let pairs: u8 = (1..=6).map(|v| counts[v].max(counts[13 - v])).sum();
    counts[13] + pairs
}

/// For each pyramid cell, the deck-index mask of cards that could ever be removed together
/// with that cell's card.
///
/// A partner must have the complementary value and must not sit on the same cover chain:
/// cards that cover a cell have to leave before it is exposed, and a cell's card has to
/// leave before the cards it covers are exposed. Stock and waste cards are always
/// candidates. King cells get an empty mask since they never need a partner.
pub fn partner_masks(deck: &Deck) -> [u64; PYRAMID_SIZE] {
    let mut masks = [0u64; PYRAMID_SIZE];
    for (cell, mask) in masks.iter_mut().enumerate() {
        let card = deck.card(cell);
        if card.is_king() {
            continue;
        }
        let blocked = related_cells(cell) as u64;
        for (index, other) in deck.cards().iter().enumerate() {
            if card.value() + other.value() == 13 && blocked & (1 << index) == 0 {
                *mask |= 1 << index;
            }
        }
    }
    masks
}

/// Mask of the pyramid cells holding Kings.
pub fn king_cells(deck: &Deck) -> u32 {
    (0..PYRAMID_SIZE)
        .filter(|&cell| deck.card(cell).is_king())
        .fold(0u32, |mask, cell| mask | (1 << cell))
}
