use super::card::Card;

/// An unordered set of cards as a bitstring of 52 bits stored in a u64.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hand(u64);

impl Hand {
    /// All 52 cards.
    pub const fn mask() -> u64 {
        (1 << 52) - 1
    }
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }
    /// Union of two hands. Panics in debug if they overlap.
    pub fn add(lhs: Self, rhs: Self) -> Self {
        debug_assert!(lhs.0 & rhs.0 == 0);
        Self(lhs.0 | rhs.0)
    }
    /// Union without the disjointness requirement.
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self(lhs.0 | rhs.0)
    }
    /// Set membership.
    pub fn contains(&self, card: &Card) -> bool {
        self.0 & u64::from(*card) != 0
    }
    /// Removes a card from the set.
    pub fn remove(&mut self, card: Card) {
        self.0 &= !u64::from(card);
    }
    /// Number of cards in the set.
    pub fn size(&self) -> usize {
        self.0.count_ones() as usize
    }
    /// The cards NOT in this set.
    pub fn complement(&self) -> Self {
        Self(!self.0 & Self::mask())
    }
}

/// u64 isomorphism
impl From<u64> for Hand {
    fn from(n: u64) -> Self {
        Self(n)
    }
}
impl From<Hand> for u64 {
    fn from(hand: Hand) -> Self {
        hand.0
    }
}

impl From<Card> for Hand {
    fn from(card: Card) -> Self {
        Self(u64::from(card))
    }
}

/// Vec<Card> isomorphism
impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Self(cards.into_iter().map(u64::from).fold(0, |acc, c| acc | c))
    }
}
impl From<Hand> for Vec<Card> {
    fn from(hand: Hand) -> Self {
        let mut value = hand.0;
        let mut cards = Vec::with_capacity(hand.size());
        while value != 0 {
            let index = value.trailing_zeros() as u8;
            cards.push(Card::from(index));
            value &= value - 1;
        }
        cards
    }
}

impl IntoIterator for Hand {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;
    fn into_iter(self) -> Self::IntoIter {
        Vec::<Card>::from(self).into_iter()
    }
}

impl TryFrom<&str> for Hand {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Card::parse(s).map(Self::from)
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            Vec::<Card>::from(*self)
                .into_iter()
                .map(|c| c.to_string())
                .collect::<Vec<String>>()
                .join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_deck_size() {
        assert_eq!(Hand::from(Hand::mask()).size(), 52);
    }

    #[test]
    fn add_remove_contains() {
        let card = Card::try_from("As").unwrap();
        let mut hand = Hand::add(Hand::empty(), Hand::from(card));
        assert!(hand.contains(&card));
        hand.remove(card);
        assert!(!hand.contains(&card));
        assert_eq!(hand, Hand::empty());
    }

    #[test]
    fn complement_partitions() {
        let hand = Hand::try_from("As Kd 2c").unwrap();
        assert_eq!(hand.size() + hand.complement().size(), 52);
        assert_eq!(Hand::or(hand, hand.complement()), Hand::from(Hand::mask()));
    }

    #[test]
    fn roundtrip_str() {
        let hand = Hand::try_from("2c 5d As").unwrap();
        assert_eq!(hand, Hand::try_from(hand.to_string().as_str()).unwrap());
    }
}
