//! Cards and the fixed deal used by one Pyramid Solitaire game.
//!
//! This module defines:
//! - `Suit` and `Card`: an immutable playing card with a Pyramid Solitaire value.
//! - `Deck`: the ordered 52-card deal. Indexes `0..28` are the pyramid cells from the apex
//!   down, row by row; indexes `28..52` are the stock, top card first.
//! - `DeckError`: why a list of cards is not a valid deal.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Rank characters in value order: Ace is 1, King is 13.
pub const RANKS: &str = "A23456789TJQK";

/// Suit characters in the order used by `Deck::sorted`.
pub const SUITS: &str = "cdhs";

/// Number of cards in a deal.
pub const DECK_SIZE: usize = 52;

/// Number of cards dealt into the pyramid.
pub const PYRAMID_SIZE: usize = 28;

/// The four card suits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    /// All suits in `SUITS` order.
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Converts the suit to its character representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use pyramid_solver::cards::Suit;
    /// assert_eq!(Suit::Hearts.to_char(), 'h');
    /// ```
    pub fn to_char(&self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        match c {
            'c' => Some(Suit::Clubs),
            'd' => Some(Suit::Diamonds),
            'h' => Some(Suit::Hearts),
            's' => Some(Suit::Spades),
            _ => None,
        }
    }
}

/// A playing card.
///
/// The rank is stored as its Pyramid Solitaire value: Ace is 1, Jack 11, Queen 12 and
/// King 13. Two cards can be removed together when their values add up to 13, and a King
/// can be removed by itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    rank: u8,
    suit: Suit,
}

impl Card {
    /// Creates a card from a rank value (1..=13) and a suit.
    ///
    /// # Panics
    /// Panics if `rank` is outside `1..=13`.
    pub fn new(rank: u8, suit: Suit) -> Self {
        assert!((1..=13).contains(&rank), "card rank {} out of range", rank);
        Card { rank, suit }
    }

    /// The card's numeric value for pairing purposes.
    pub fn value(&self) -> u8 {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn is_king(&self) -> bool {
        self.rank == 13
    }

    /// The rank as its display character.
    pub fn rank_char(&self) -> char {
        RANKS.as_bytes()[(self.rank - 1) as usize] as char
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_char(), self.suit.to_char())
    }
}

impl FromStr for Card {
    type Err = DeckError;

    /// Parses a two character card such as `"Ah"` or `"Td"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pyramid_solver::cards::{Card, Suit};
    /// let card: Card = "Qs".parse().unwrap();
    /// assert_eq!(card.value(), 12);
    /// assert_eq!(card.suit(), Suit::Spades);
    /// assert!("QS".parse::<Card>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DeckError::Malformed(vec![s.to_string()]);
        let mut chars = s.chars();
        let (rank_c, suit_c) = match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(c), None) => (r, c),
            _ => return Err(malformed()),
        };
        let rank = RANKS.find(rank_c).ok_or_else(malformed)? as u8 + 1;
        let suit = Suit::from_char(suit_c).ok_or_else(malformed)?;
        Ok(Card::new(rank, suit))
    }
}

/// Returns true if the card, or the pair of cards, can be removed together.
///
/// Kings can be removed by themselves, and pairs of cards whose values add to 13.
///
/// # Examples
///
/// ```
/// use pyramid_solver::cards::{cards_are_removable, Card};
/// let king: Card = "Kc".parse().unwrap();
/// let six: Card = "6d".parse().unwrap();
/// let seven: Card = "7h".parse().unwrap();
/// assert!(cards_are_removable(king, None));
/// assert!(cards_are_removable(six, Some(seven)));
/// assert!(!cards_are_removable(six, None));
/// ```
pub fn cards_are_removable(first: Card, second: Option<Card>) -> bool {
    first.value() + second.map_or(0, |c| c.value()) == 13
}

/// Reasons a sequence of cards is not a valid 52-card deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    /// Tokens that do not name a card.
    Malformed(Vec<String>),
    /// Standard cards absent from the deal, in `Deck::sorted` order.
    Missing(Vec<Card>),
    /// Cards appearing more than once; a card repeated N times is listed N times.
    Duplicates(Vec<Card>),
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::Malformed(tokens) => write!(f, "malformed cards: {}", tokens.join(" ")),
            DeckError::Missing(cards) => write!(f, "missing cards: {}", join_cards(cards)),
            DeckError::Duplicates(cards) => {
                write!(f, "duplicate cards: {}", join_cards(cards))
            }
        }
    }
}

impl std::error::Error for DeckError {}

/// An ordered, validated deal of all 52 cards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
}

impl Deck {
    /// Creates a deck from exactly 52 distinct cards.
    ///
    /// Duplicates are reported before missing cards, since a duplicate always implies a
    /// missing card as well. A list of the wrong length always has one or the other.
    pub fn new(cards: Vec<Card>) -> Result<Self, DeckError> {
        let mut counts: HashMap<Card, usize> = HashMap::new();
        for card in &cards {
            *counts.entry(*card).or_insert(0) += 1;
        }

        let duplicates: Vec<Card> = cards
            .iter()
            .copied()
            .filter(|c| counts[c] > 1)
            .collect();
        if !duplicates.is_empty() {
            return Err(DeckError::Duplicates(duplicates));
        }

        let missing: Vec<Card> = Deck::standard_cards()
            .filter(|c| !counts.contains_key(c))
            .collect();
        if !missing.is_empty() {
            return Err(DeckError::Missing(missing));
        }

        // 52 distinct standard cards with none missing.
        Ok(Deck {
            cards: std::array::from_fn(|i| cards[i]),
        })
    }

    /// The standard deck order: clubs, diamonds, hearts, spades, each Ace to King.
    pub fn sorted() -> Self {
        Deck {
            cards: std::array::from_fn(|i| Card::new((i % 13) as u8 + 1, Suit::ALL[i / 13])),
        }
    }

    /// Creates a shuffled deck from a seed.
    ///
    /// The same seed always produces the same deal.
    ///
    /// # Examples
    /// ```
    /// use pyramid_solver::cards::Deck;
    /// assert_eq!(Deck::new_random_with_seed(7), Deck::new_random_with_seed(7));
    /// assert_ne!(Deck::new_random_with_seed(7), Deck::sorted());
    /// ```
    pub fn new_random_with_seed(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut cards = Deck::sorted().cards;
        cards.shuffle(&mut rng);
        Deck { cards }
    }

    fn standard_cards() -> impl Iterator<Item = Card> {
        Suit::ALL
            .into_iter()
            .flat_map(|suit| (1..=13).map(move |rank| Card::new(rank, suit)))
    }

    /// Returns the card at a deck index (0..52).
    pub fn card(&self, index: usize) -> Card {
        self.cards[index]
    }

    pub fn cards(&self) -> &[Card; DECK_SIZE] {
        &self.cards
    }

    /// The 28 pyramid cards, apex first.
    pub fn pyramid(&self) -> &[Card] {
        &self.cards[..PYRAMID_SIZE]
    }

    /// The 24 stock cards, top first.
    pub fn stock(&self) -> &[Card] {
        &self.cards[PYRAMID_SIZE..]
    }
}

impl FromStr for Deck {
    type Err = DeckError;

    /// Parses whitespace-separated cards in deal order.
    ///
    /// Layout is free-form, so the pyramid may be written as a triangle followed by the
    /// stock on one line. Every malformed token is reported at once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        let mut malformed = Vec::new();
        for token in s.split_whitespace() {
            match token.parse::<Card>() {
                Ok(card) => cards.push(card),
                Err(_) => malformed.push(token.to_string()),
            }
        }
        if !malformed.is_empty() {
            return Err(DeckError::Malformed(malformed));
        }
        Deck::new(cards)
    }
}
