use super::card::Card;
use super::hand::Hand;
use super::hole::Hole;

/// The undrawn cards of a single hand.
///
/// Wraps a [`Hand`] representing the remaining cards, with methods for
/// drawing uniformly at random. A fresh deck is created for every hand;
/// draws go through `rand::rng()`, an OS-seeded CSPRNG, so the shuffle is
/// cryptographically strong without an explicit permutation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deck(Hand);

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// Creates a fresh 52-card deck.
    pub fn new() -> Self {
        Self(Hand::from(Hand::mask()))
    }
    /// Cards remaining.
    pub fn size(&self) -> usize {
        self.0.size()
    }
    /// Tests whether a card is still in the deck.
    pub fn contains(&self, card: &Card) -> bool {
        self.0.contains(card)
    }
    /// Draws and removes a uniformly random card from the deck.
    pub fn draw(&mut self) -> Card {
        debug_assert!(self.0.size() > 0);
        let n = self.0.size();
        let i = rand::random_range(0..n);
        let mut deck = u64::from(self.0);
        for _ in 0..i {
            deck &= deck - 1;
        }
        let card = Card::from(deck.trailing_zeros() as u8);
        self.0.remove(card);
        card
    }
    /// Burns the top card.
    pub fn burn(&mut self) {
        let _ = self.draw();
    }
    /// Draws n cards as a set.
    pub fn deal(&mut self, n: usize) -> Hand {
        (0..n)
            .map(|_| self.draw())
            .map(Hand::from)
            .fold(Hand::empty(), Hand::add)
    }
    /// Deals two cards as a player's hole cards.
    pub fn hole(&mut self) -> Hole {
        let a = self.draw();
        let b = self.draw();
        Hole::from((a, b))
    }
}

impl From<Deck> for Hand {
    fn from(deck: Deck) -> Self {
        deck.0
    }
}
impl From<Hand> for Deck {
    fn from(hand: Hand) -> Self {
        Self(hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_unique() {
        let mut deck = Deck::new();
        let mut seen = Hand::empty();
        for _ in 0..52 {
            let card = deck.draw();
            assert!(!seen.contains(&card));
            seen = Hand::add(seen, Hand::from(card));
        }
        assert_eq!(deck.size(), 0);
        assert_eq!(seen.size(), 52);
    }

    #[test]
    fn hole_removes_two() {
        let mut deck = Deck::new();
        let hole = deck.hole();
        assert_eq!(deck.size(), 50);
        for card in Hand::from(hole) {
            assert!(!deck.contains(&card));
        }
    }
}
