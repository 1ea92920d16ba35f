use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn letter(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Suit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "♣" => Ok(Suit::Clubs),
            "d" | "♦" => Ok(Suit::Diamonds),
            "h" | "♥" => Ok(Suit::Hearts),
            "s" | "♠" => Ok(Suit::Spades),
            _ => Err(format!("Invalid suit '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Face value with the ace high (2..=14).
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "T",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "2" => Ok(Rank::Two),
            "3" => Ok(Rank::Three),
            "4" => Ok(Rank::Four),
            "5" => Ok(Rank::Five),
            "6" => Ok(Rank::Six),
            "7" => Ok(Rank::Seven),
            "8" => Ok(Rank::Eight),
            "9" => Ok(Rank::Nine),
            "T" | "10" => Ok(Rank::Ten),
            "J" => Ok(Rank::Jack),
            "Q" => Ok(Rank::Queen),
            "K" => Ok(Rank::King),
            "A" => Ok(Rank::Ace),
            _ => Err(format!("Invalid rank '{s}'")),
        }
    }
}

/// A single playing card. Rank and suit together are its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.short_label(), self.suit.symbol())
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.short_label(), self.suit.letter())
    }
}

impl FromStr for Card {
    type Err = String;

    /// Parses `As`, `Td`, `10h` or `Q♠`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (split, _) = s
            .char_indices()
            .last()
            .ok_or_else(|| "Empty card".to_string())?;
        let rank = s[..split].parse()?;
        let suit = s[split..].parse()?;
        Ok(Card::new(rank, suit))
    }
}

/// Parses a whitespace separated list of cards, e.g. `"As Ks Qs Js Ts"`.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, String> {
    s.split_whitespace().map(str::parse).collect()
}

pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(52);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card::new(rank, suit));
        }
    }
    cards
}

/// An ordered pile of cards dealt from the front.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = standard_deck();
        cards.shuffle(rng);
        Self::from_cards(cards)
    }

    /// A deck that deals exactly `cards`, in order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Removes and returns the next `count` cards.
    pub fn deal(&mut self, count: usize) -> SimResult<Vec<Card>> {
        if count > self.cards.len() {
            return Err(SimError::DeckExhausted {
                requested: count,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..count).collect())
    }
}

/// Supplies one fresh deck per round.
pub trait DeckSource {
    fn fresh_deck(&mut self) -> Deck;
}

/// Uniformly shuffled 52-card decks drawn from an RNG.
#[derive(Debug, Clone)]
pub struct Shuffler<R> {
    rng: R,
}

impl<R: Rng> Shuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> DeckSource for Shuffler<R> {
    fn fresh_deck(&mut self) -> Deck {
        Deck::shuffled(&mut self.rng)
    }
}

/// Replays a fixed sequence of card orders, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct StackedDecks {
    decks: Vec<Vec<Card>>,
    next: usize,
}

impl StackedDecks {
    pub fn new(decks: Vec<Vec<Card>>) -> Self {
        Self { decks, next: 0 }
    }

    /// Places `top` at the head of an otherwise standard-ordered deck, skipping duplicates.
    pub fn with_top(top: &[Card]) -> Vec<Card> {
        let mut cards = top.to_vec();
        cards.extend(standard_deck().into_iter().filter(|card| !top.contains(card)));
        cards
    }
}

impl DeckSource for StackedDecks {
    fn fresh_deck(&mut self) -> Deck {
        if self.decks.is_empty() {
            return Deck::from_cards(standard_deck());
        }
        let cards = self.decks[self.next % self.decks.len()].clone();
        self.next += 1;
        Deck::from_cards(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ascii_and_symbol_notation() {
        let ace: Card = "As".parse().unwrap();
        assert_eq!(ace, Card::new(Rank::Ace, Suit::Spades));
        let ten: Card = "10h".parse().unwrap();
        assert_eq!(ten, Card::new(Rank::Ten, Suit::Hearts));
        let queen: Card = "Q♠".parse().unwrap();
        assert_eq!(queen.to_string(), "Qs");
        assert!("Xs".parse::<Card>().is_err());
    }

    #[test]
    fn deal_removes_from_front_and_reports_exhaustion() {
        let mut deck = Deck::from_cards(parse_cards("As Kd 2c").unwrap());
        assert_eq!(deck.deal(2).unwrap(), parse_cards("As Kd").unwrap());
        assert_eq!(deck.remaining(), 1);
        assert_eq!(
            deck.deal(2),
            Err(SimError::DeckExhausted {
                requested: 2,
                remaining: 1
            })
        );
    }
}
