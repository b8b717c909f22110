use super::rank::Rank;

/// A poker hand's category with its defining rank(s).
///
/// Ordered by hand strength; the kicker cards held in [`Kickers`] break ties
/// within a category. A royal flush is `StraightFlush(Rank::Ace)` and is the
/// strict maximum of the order.
///
/// [`Kickers`]: super::kicks::Kickers
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard(Rank),        // 4 kickers
    OnePair(Rank),         // 3 kickers
    TwoPair(Rank, Rank),   // 1 kicker
    ThreeOAK(Rank),        // 2 kickers
    Straight(Rank),        // 0 kickers
    Flush(Rank),           // 4 kickers, suit-restricted
    FullHouse(Rank, Rank), // 0 kickers
    FourOAK(Rank),         // 1 kicker
    StraightFlush(Rank),   // 0 kickers
}

impl Ranking {
    /// How many kicker cards are needed to resolve any tie at this category.
    pub fn n_kickers(&self) -> usize {
        match self {
            Ranking::HighCard(_) => 4,
            Ranking::OnePair(_) => 3,
            Ranking::ThreeOAK(_) => 2,
            Ranking::Flush(_) => 4,
            Ranking::FourOAK(_) | Ranking::TwoPair(_, _) => 1,
            _ => 0,
        }
    }

    /// Rank mask EXCLUDING the defining ranks; kickers are drawn from here.
    pub fn mask(&self) -> u16 {
        match *self {
            Ranking::TwoPair(hi, lo) => !(u16::from(hi) | u16::from(lo)),
            Ranking::HighCard(hi)
            | Ranking::OnePair(hi)
            | Ranking::FourOAK(hi)
            | Ranking::ThreeOAK(hi) => !(u16::from(hi)),
            Ranking::FullHouse(..)
            | Ranking::StraightFlush(..)
            | Ranking::Straight(..)
            | Ranking::Flush(..) => unreachable!(),
        }
    }

    /// Wire label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            Ranking::HighCard(_) => "high_card",
            Ranking::OnePair(_) => "one_pair",
            Ranking::TwoPair(_, _) => "two_pair",
            Ranking::ThreeOAK(_) => "three_of_a_kind",
            Ranking::Straight(_) => "straight",
            Ranking::Flush(_) => "flush",
            Ranking::FullHouse(_, _) => "full_house",
            Ranking::FourOAK(_) => "four_of_a_kind",
            Ranking::StraightFlush(Rank::Ace) => "royal_flush",
            Ranking::StraightFlush(_) => "straight_flush",
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Ranking::FullHouse(r1, r2) => write!(f, "FullHouse     {}{}", r1, r2),
            Ranking::TwoPair(r1, r2) => write!(f, "TwoPair       {}{}", r1, r2),
            Ranking::HighCard(r) => write!(f, "HighCard      {} ", r),
            Ranking::OnePair(r) => write!(f, "OnePair       {} ", r),
            Ranking::ThreeOAK(r) => write!(f, "ThreeOfAKind  {} ", r),
            Ranking::Straight(r) => write!(f, "Straight      {} ", r),
            Ranking::FourOAK(r) => write!(f, "FourOfAKind   {} ", r),
            Ranking::Flush(r) => write!(f, "Flush         {} ", r),
            Ranking::StraightFlush(r) => write!(f, "StraightFlush {} ", r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order() {
        assert!(Ranking::OnePair(Rank::Two) > Ranking::HighCard(Rank::Ace));
        assert!(Ranking::Straight(Rank::Five) > Ranking::ThreeOAK(Rank::Ace));
        assert!(Ranking::Flush(Rank::Seven) > Ranking::Straight(Rank::Ace));
        assert!(Ranking::FullHouse(Rank::Two, Rank::Three) > Ranking::Flush(Rank::Ace));
        assert!(Ranking::StraightFlush(Rank::Five) > Ranking::FourOAK(Rank::Ace));
    }

    #[test]
    fn wheel_below_six_high() {
        assert!(Ranking::Straight(Rank::Five) < Ranking::Straight(Rank::Six));
    }

    #[test]
    fn royal_is_maximum() {
        let royal = Ranking::StraightFlush(Rank::Ace);
        assert_eq!(royal.label(), "royal_flush");
        assert!(royal > Ranking::StraightFlush(Rank::King));
        assert!(royal > Ranking::FourOAK(Rank::Ace));
    }
}
