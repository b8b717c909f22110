use super::card::Card;
use super::hand::Hand;
use super::kicks::Kickers;
use super::rank::Rank;
use super::ranking::Ranking;
use super::suit::Suit;

/// A lazy evaluator for a hand's strength.
///
/// Using the compact bitset representation of [`Hand`], the best category is
/// found by bitwise operations over rank and suit masks. The evaluator is
/// total for any input of five or more distinct cards; callers guarantee
/// uniqueness because every card is drawn from one deck without replacement.
pub struct Evaluator(Hand);

impl From<Hand> for Evaluator {
    fn from(h: Hand) -> Self {
        debug_assert!(h.size() >= 5);
        Self(h)
    }
}

impl Evaluator {
    /// The best category present in the hand.
    pub fn find_ranking(&self) -> Ranking {
        None.or_else(|| self.find_flush())
            .or_else(|| self.find_4_oak())
            .or_else(|| self.find_3_oak_2_oak())
            .or_else(|| self.find_straight())
            .or_else(|| self.find_3_oak())
            .or_else(|| self.find_2_oak_2_oak())
            .or_else(|| self.find_2_oak())
            .or_else(|| self.find_1_oak())
            .expect("at least one card in Hand")
    }

    /// The kicker cards for a category, truncated to exactly the number
    /// needed to resolve any tie at that category.
    pub fn find_kickers(&self, value: Ranking) -> Kickers {
        let n = value.n_kickers();
        if n == 0 {
            return Kickers::default();
        }
        let bits = match value {
            // flush kickers live inside the flushed suit
            Ranking::Flush(hi) => {
                let suit = self.find_suit_of_flush().expect("flush suit");
                self.suit_masks()[suit as usize] & !u16::from(hi)
            }
            _ => value.mask() & self.rank_masks(),
        };
        Kickers::from(Self::keep_highest(bits, n))
    }

    /// The five-card subset that realizes the ranking.
    pub fn find_besthand(&self) -> Hand {
        let value = self.find_ranking();
        let kicks = self.find_kickers(value);
        let cards = match value {
            Ranking::HighCard(hi) => self.ranked_cards(hi, 1) | self.kicker_cards(kicks),
            Ranking::OnePair(hi) => self.ranked_cards(hi, 2) | self.kicker_cards(kicks),
            Ranking::TwoPair(hi, lo) => {
                self.ranked_cards(hi, 2) | self.ranked_cards(lo, 2) | self.kicker_cards(kicks)
            }
            Ranking::ThreeOAK(hi) => self.ranked_cards(hi, 3) | self.kicker_cards(kicks),
            Ranking::FourOAK(hi) => self.ranked_cards(hi, 4) | self.kicker_cards(kicks),
            Ranking::FullHouse(trips, pair) => {
                self.ranked_cards(trips, 3) | self.ranked_cards(pair, 2)
            }
            Ranking::Straight(hi) => Self::run(hi)
                .into_iter()
                .map(|r| self.ranked_cards(r, 1))
                .fold(0, |acc, c| acc | c),
            Ranking::Flush(hi) => {
                let suit = self.find_suit_of_flush().expect("flush suit");
                std::iter::once(hi)
                    .chain(kicks.ranks())
                    .map(|r| u64::from(Card::from((r, suit))))
                    .fold(0, |acc, c| acc | c)
            }
            Ranking::StraightFlush(hi) => {
                let suit = self.find_straight_flush_suit(hi).expect("flush suit");
                Self::run(hi)
                    .into_iter()
                    .map(|r| u64::from(Card::from((r, suit))))
                    .fold(0, |acc, c| acc | c)
            }
        };
        debug_assert_eq!(cards.count_ones(), 5);
        Hand::from(cards)
    }

    ///

    fn find_1_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(1).map(Ranking::HighCard)
    }
    fn find_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2).map(Ranking::OnePair)
    }
    fn find_3_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3).map(Ranking::ThreeOAK)
    }
    fn find_4_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(4).map(Ranking::FourOAK)
    }
    fn find_2_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2).and_then(|hi| {
            self.find_rank_of_n_oak_under(2, Some(hi))
                .map(|lo| Ranking::TwoPair(hi, lo))
                .or_else(|| Some(Ranking::OnePair(hi)))
        })
    }
    fn find_3_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3).and_then(|trips| {
            self.find_rank_of_n_oak_under(2, Some(trips))
                .map(|pairs| Ranking::FullHouse(trips, pairs))
        })
    }
    fn find_straight(&self) -> Option<Ranking> {
        Self::find_rank_of_straight(self.rank_masks()).map(Ranking::Straight)
    }
    fn find_flush(&self) -> Option<Ranking> {
        self.find_suit_of_flush().map(|suit| {
            let bits = self.suit_masks()[suit as usize];
            Self::find_rank_of_straight(bits)
                .map(Ranking::StraightFlush)
                .unwrap_or_else(|| Ranking::Flush(Rank::from(bits)))
        })
    }

    ///

    fn find_rank_of_straight(hand: u16) -> Option<Rank> {
        const WHEEL: u16 = 0b_1000000001111;
        let mut bits = hand;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        if bits > 0 {
            Some(Rank::from(bits))
        } else if WHEEL == (WHEEL & hand) {
            Some(Rank::Five)
        } else {
            None
        }
    }
    fn find_suit_of_flush(&self) -> Option<Suit> {
        self.suit_count()
            .iter()
            .position(|&n| n >= 5)
            .map(|i| Suit::from(i as u8))
    }
    fn find_straight_flush_suit(&self, hi: Rank) -> Option<Suit> {
        self.find_suit_of_flush().filter(|suit| {
            Self::find_rank_of_straight(self.suit_masks()[*suit as usize]) == Some(hi)
        })
    }
    fn find_rank_of_n_oak_under(&self, oak: usize, below: Option<Rank>) -> Option<Rank> {
        let ceiling = below.map(u8::from).unwrap_or(13) as u64;
        let hand = u64::from(self.0) & ((1u64 << (4 * ceiling)) - 1);
        let mut mask = 0b_1111_u64 << (4 * ceiling) >> 4;
        while mask > 0 {
            if oak <= (hand & mask).count_ones() as usize {
                let rank = mask.trailing_zeros() / 4;
                return Some(Rank::from(rank as u8));
            }
            mask >>= 4;
        }
        None
    }
    fn find_rank_of_n_oak(&self, n: usize) -> Option<Rank> {
        self.find_rank_of_n_oak_under(n, None)
    }

    ///

    /// Clears the lowest set bits until exactly n remain.
    fn keep_highest(mut bits: u16, n: usize) -> u16 {
        while bits.count_ones() as usize > n {
            bits &= bits - 1;
        }
        bits
    }
    /// The n lowest-suited cards of a rank present in the hand.
    fn ranked_cards(&self, rank: Rank, n: usize) -> u64 {
        let mut bits = u64::from(self.0) & (0b_1111_u64 << (4 * u8::from(rank)));
        debug_assert!(bits.count_ones() as usize >= n);
        while bits.count_ones() as usize > n {
            bits &= !(1 << (63 - bits.leading_zeros()));
        }
        bits
    }
    /// One card for each kicker rank.
    fn kicker_cards(&self, kicks: Kickers) -> u64 {
        kicks
            .ranks()
            .into_iter()
            .map(|r| self.ranked_cards(r, 1))
            .fold(0, |acc, c| acc | c)
    }
    /// The five ranks of a straight topped by hi, wheel-aware.
    fn run(hi: Rank) -> [Rank; 5] {
        match hi {
            Rank::Five => [Rank::Five, Rank::Four, Rank::Three, Rank::Two, Rank::Ace],
            _ => std::array::from_fn(|i| Rank::from(u8::from(hi) - i as u8)),
        }
    }

    ///

    /// Which ranks are in the hand, neglecting suit.
    fn rank_masks(&self) -> u16 {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| c.rank())
            .map(u16::from)
            .fold(0, |acc, r| acc | r)
    }
    /// How many cards of each suit are in the hand.
    fn suit_count(&self) -> [u8; 4] {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| c.suit())
            .fold([0; 4], |mut counts, s| {
                counts[s as usize] += 1;
                counts
            })
    }
    /// Which ranks are in the hand, grouped by suit.
    fn suit_masks(&self) -> [u16; 4] {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| (c.suit(), c.rank()))
            .map(|(s, r)| (u8::from(s), u16::from(r)))
            .fold([0; 4], |mut suits, (s, r)| {
                suits[s as usize] |= r;
                suits
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(s: &str) -> Ranking {
        Evaluator::from(Hand::try_from(s).unwrap()).find_ranking()
    }
    fn kickers(s: &str) -> Kickers {
        let eval = Evaluator::from(Hand::try_from(s).unwrap());
        eval.find_kickers(eval.find_ranking())
    }
    fn besthand(s: &str) -> Hand {
        Evaluator::from(Hand::try_from(s).unwrap()).find_besthand()
    }

    #[test]
    fn high_card() {
        assert_eq!(ranking("As Kh Qd Jc 9s"), Ranking::HighCard(Rank::Ace));
    }

    #[test]
    fn one_pair() {
        assert_eq!(ranking("As Ah Kd Qc Js"), Ranking::OnePair(Rank::Ace));
    }

    #[test]
    fn two_pair() {
        assert_eq!(
            ranking("As Ah Kd Kc Qs"),
            Ranking::TwoPair(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn three_oak() {
        assert_eq!(ranking("As Ah Ad Kc Qs"), Ranking::ThreeOAK(Rank::Ace));
    }

    #[test]
    fn straight() {
        assert_eq!(ranking("Ts Jh Qd Kc As"), Ranking::Straight(Rank::Ace));
    }

    #[test]
    fn flush() {
        assert_eq!(ranking("As Ks Qs Js 9s"), Ranking::Flush(Rank::Ace));
    }

    #[test]
    fn full_house() {
        assert_eq!(
            ranking("As Ah Ad Kc Ks"),
            Ranking::FullHouse(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn four_oak() {
        assert_eq!(ranking("As Ah Ad Ac Ks"), Ranking::FourOAK(Rank::Ace));
    }

    #[test]
    fn straight_flush() {
        assert_eq!(ranking("Ts Js Qs Ks As"), Ranking::StraightFlush(Rank::Ace));
    }

    #[test]
    fn wheel_straight() {
        assert_eq!(ranking("As 2h 3d 4c 5s"), Ranking::Straight(Rank::Five));
    }

    #[test]
    fn wheel_straight_flush() {
        assert_eq!(ranking("As 2s 3s 4s 5s"), Ranking::StraightFlush(Rank::Five));
    }

    #[test]
    fn wheel_between_trips_and_six_high() {
        let wheel = ranking("As 2h 3d 4c 5s");
        assert!(wheel > Ranking::ThreeOAK(Rank::Ace));
        assert!(wheel < ranking("2h 3d 4c 5s 6h"));
    }

    #[test]
    fn seven_card_hand() {
        assert_eq!(
            ranking("As Ah Kd Kc Qs Jh 9d"),
            Ranking::TwoPair(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn flush_beats_straight() {
        assert_eq!(ranking("4h 6h 7h 8h 9h Ts"), Ranking::Flush(Rank::Nine));
    }

    #[test]
    fn full_house_beats_flush() {
        assert_eq!(
            ranking("As Ah Ad Ks Kh Qs Js"),
            Ranking::FullHouse(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn two_trips_is_full_house() {
        assert_eq!(
            ranking("As Ah Ad Kc Ks Kh Qd"),
            Ranking::FullHouse(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn three_pair_keeps_best_two() {
        assert_eq!(
            ranking("As Ah Kd Kc Qs Qh Jd"),
            Ranking::TwoPair(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn pair_kickers_truncate_to_three() {
        let kicks = kickers("As Ah Kd Qc Js 9h 8d");
        assert_eq!(
            kicks.ranks(),
            vec![Rank::King, Rank::Queen, Rank::Jack]
        );
    }

    #[test]
    fn two_pair_single_kicker() {
        let kicks = kickers("As Ah Kd Kc Qs Jh 9d");
        assert_eq!(kicks.ranks(), vec![Rank::Queen]);
    }

    #[test]
    fn flush_kickers_stay_in_suit() {
        // the Kd does not kick a spade flush
        let kicks = kickers("As Ks Qs 9s 2s Kd Qh");
        assert_eq!(
            kicks.ranks(),
            vec![Rank::King, Rank::Queen, Rank::Nine, Rank::Two]
        );
    }

    #[test]
    fn besthand_is_five_cards() {
        for s in [
            "As Ah Kd Kc Qs Jh 9d",
            "Ts Js Qs Ks As Ah Ad",
            "As 2h 3d 4c 5s 5h 5d",
            "4h 6h 7h 8h 9h Ts 2c",
            "As Ah Ad Ac Ks Kh Qd",
            "2c 5d 8h Jc Ks Qh 3d",
        ] {
            assert_eq!(besthand(s).size(), 5);
        }
    }

    #[test]
    fn besthand_realizes_wheel() {
        let best = besthand("As 2h 3d 4c 5s Kh Qd");
        let ranks: Vec<Rank> = best.into_iter().map(|c| c.rank()).collect();
        assert!(ranks.contains(&Rank::Ace));
        assert!(ranks.contains(&Rank::Five));
        assert!(!ranks.contains(&Rank::King));
    }

    #[test]
    fn besthand_subset_of_input() {
        let hand = Hand::try_from("As Ah Kd Kc Qs Jh 9d").unwrap();
        let best = Evaluator::from(hand).find_besthand();
        for card in best {
            assert!(hand.contains(&card));
        }
    }
}
