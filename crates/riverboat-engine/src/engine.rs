use super::action::Action;
use super::error::ActionError;
use super::seat::Seat;
use super::seat::State;
use super::settle::Award;
use super::settle::Settlement;
use super::settle::Showing;
use super::stakes::Stakes;
use riverboat_cards::Board;
use riverboat_cards::Card;
use riverboat_cards::Deck;
use riverboat_cards::Evaluator;
use riverboat_cards::Hand;
use riverboat_cards::Hole;
use riverboat_cards::Street;
use riverboat_cards::Strength;
use riverboat_core::Chips;
use riverboat_core::Position;
use riverboat_core::SEATS_MIN;

/// The state machine for a single hand of Texas Hold'em.
///
/// One engine is created per hand and discarded when the hand completes; the
/// game manager owns it under the table's lock and is the only mutator.
/// Identity stays outside: seats are addressed by table seat number, and the
/// manager maps users to numbers.
///
/// Construction IS the hand start: the deck is shuffled, the button moves,
/// blinds post, and hole cards go out in two passes starting left of the
/// dealer. From there the manager drives [`act`](Self::act),
/// [`is_round_complete`](Self::is_round_complete),
/// [`advance_round`](Self::advance_round), and [`settle`](Self::settle).
///
/// All positions held internally are indices into `seats` (which is sorted
/// by seat number); everything crossing the API boundary is a seat number.
#[derive(Debug, Clone)]
pub struct Engine {
    stakes: Stakes,
    deck: Deck,
    board: Board,
    pot: Chips,
    bet: Chips,
    min_raise: Chips,
    seats: Vec<Seat>,
    dealer: Position,
    sb: Position,
    bb: Position,
    actor: Position,
}

/// Hand setup.
impl Engine {
    /// Deals a fresh hand.
    ///
    /// `entrants` are `(seat_number, chip_count)` pairs for every seat that
    /// is playing; `previous_dealer` is the seat number that held the button
    /// last hand, if any. The button advances to the next occupied seat.
    ///
    /// Fails if fewer than two players are dealt in.
    pub fn start(
        stakes: Stakes,
        entrants: Vec<(Position, Chips)>,
        previous_dealer: Option<Position>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            entrants.len() >= SEATS_MIN,
            "need at least {} players to deal",
            SEATS_MIN
        );
        debug_assert!(entrants.iter().all(|(_, stack)| *stack > 0));
        let mut entrants = entrants;
        entrants.sort_by_key(|(number, _)| *number);
        let n = entrants.len();
        let dealer = match previous_dealer {
            None => 0,
            Some(prev) => entrants
                .iter()
                .position(|(number, _)| *number > prev)
                .unwrap_or(0),
        };
        let (sb, bb) = match n {
            2 => (dealer, (dealer + 1) % n),
            _ => ((dealer + 1) % n, (dealer + 2) % n),
        };
        // two passes, one card each, starting left of the dealer
        let mut deck = Deck::new();
        let mut firsts: Vec<Option<Card>> = vec![None; n];
        let mut seconds: Vec<Option<Card>> = vec![None; n];
        for i in 0..n {
            firsts[(sb + i) % n] = Some(deck.draw());
        }
        for i in 0..n {
            seconds[(sb + i) % n] = Some(deck.draw());
        }
        let seats = entrants
            .into_iter()
            .zip(firsts.into_iter().zip(seconds))
            .map(|((number, stack), (a, b))| {
                let hole = Hole::from((a.expect("dealt"), b.expect("dealt")));
                Seat::from((number, stack, hole))
            })
            .collect::<Vec<Seat>>();
        let mut engine = Self {
            stakes,
            deck,
            board: Board::empty(),
            pot: 0,
            bet: 0,
            min_raise: stakes.bblind(),
            seats,
            dealer,
            sb,
            bb,
            actor: bb,
        };
        engine.post(sb, stakes.sblind());
        engine.post(bb, stakes.bblind());
        engine.bet = stakes.bblind();
        engine.actor = engine.next_to_act_after(bb).unwrap_or(bb);
        log::debug!(
            "[engine] new hand, dealer #{}, blinds {}",
            engine.seats[dealer].number(),
            stakes,
        );
        Ok(engine)
    }

    /// Posts a forced blind: short stacks go all-in for what they have.
    fn post(&mut self, pos: Position, blind: Chips) {
        let posted = blind.min(self.seats[pos].stack());
        self.pay(pos, posted);
    }
}

/// Public state accessors.
impl Engine {
    pub fn stakes(&self) -> &Stakes {
        &self.stakes
    }
    pub fn pot(&self) -> Chips {
        self.pot
    }
    /// The bet to match on the current street.
    pub fn current_bet(&self) -> Chips {
        self.bet
    }
    /// The minimum legal raise-to total.
    pub fn to_raise(&self) -> Chips {
        self.bet + self.min_raise
    }
    pub fn board(&self) -> Board {
        self.board
    }
    pub fn street(&self) -> Street {
        self.board.street()
    }
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }
    pub fn dealer_number(&self) -> Position {
        self.seats[self.dealer].number()
    }
    pub fn sb_number(&self) -> Position {
        self.seats[self.sb].number()
    }
    pub fn bb_number(&self) -> Position {
        self.seats[self.bb].number()
    }
    /// Seat number of the player expected to act.
    pub fn actor_number(&self) -> Position {
        self.seats[self.actor].number()
    }
    /// The seat holding a given number, if dealt in.
    pub fn seat(&self, number: Position) -> Option<&Seat> {
        self.position_of(number).map(|pos| &self.seats[pos])
    }
    /// Players still contesting the pot (not folded).
    pub fn in_hand(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.state() != State::Folding)
            .count()
    }
    /// Players who can still make decisions (in hand and not all-in).
    pub fn live(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.state() == State::Betting)
            .count()
    }
    /// True when no further betting is possible this hand.
    pub fn is_betting_over(&self) -> bool {
        self.live() <= 1
    }
    /// True when the current betting round has closed: either the hand is
    /// down to one player, or every live player has acted since the last
    /// aggression and matched the current bet.
    pub fn is_round_complete(&self) -> bool {
        if self.in_hand() <= 1 {
            return true;
        }
        self.seats
            .iter()
            .filter(|s| s.state() == State::Betting)
            .all(|s| s.acted() && s.stake() == self.bet)
    }
}

/// Action processing.
impl Engine {
    /// Applies a player's action.
    ///
    /// Validation happens before any mutation: a rejected action leaves the
    /// engine exactly as it was and does not consume the turn.
    pub fn act(&mut self, number: Position, action: Action) -> Result<(), ActionError> {
        let pos = self.position_of(number).ok_or(ActionError::NotInHand)?;
        match self.seats[pos].state() {
            State::Folding => return Err(ActionError::NotInHand),
            State::Shoving => return Err(ActionError::AlreadyAllIn),
            State::Betting => {}
        }
        if pos != self.actor {
            return Err(ActionError::OutOfTurn);
        }
        let stake = self.seats[pos].stake();
        let stack = self.seats[pos].stack();
        match action {
            Action::Fold => {
                self.seats[pos].fold();
            }
            Action::Check => {
                if stake != self.bet {
                    return Err(ActionError::IllegalCheck);
                }
                self.seats[pos].touch();
            }
            Action::Call => {
                if self.bet <= stake {
                    return Err(ActionError::InvalidAction);
                }
                let owed = self.bet - stake;
                self.pay(pos, owed.min(stack));
                self.seats[pos].touch();
            }
            Action::Bet(amount) => {
                if self.bet != 0 {
                    return Err(ActionError::InvalidAction);
                }
                if amount < self.stakes.bblind() {
                    return Err(ActionError::IllegalBetAmount);
                }
                if amount > stack {
                    return Err(ActionError::InsufficientChips);
                }
                self.pay(pos, amount);
                self.bet = amount;
                self.min_raise = amount;
                self.seats[pos].touch();
                self.reopen(pos);
            }
            Action::Raise(amount) => {
                // amount is the street total raised TO
                if self.bet == 0 {
                    return Err(ActionError::InvalidAction);
                }
                if amount <= self.bet {
                    return Err(ActionError::IllegalRaiseAmount);
                }
                let added = amount - stake;
                if added > stack {
                    return Err(ActionError::InsufficientChips);
                }
                if amount < self.bet + self.min_raise {
                    if added != stack {
                        return Err(ActionError::IllegalRaiseAmount);
                    }
                    // short all-in: the call portion goes in but the action
                    // does not reopen for players who already acted
                    self.pay(pos, added);
                    self.seats[pos].touch();
                } else {
                    self.pay(pos, added);
                    self.min_raise = amount - self.bet;
                    self.bet = amount;
                    self.seats[pos].touch();
                    self.reopen(pos);
                }
            }
            Action::AllIn => {
                let total = stake + stack;
                self.pay(pos, stack);
                self.seats[pos].touch();
                if self.bet == 0 {
                    self.bet = total;
                    self.min_raise = total.max(self.stakes.bblind());
                    self.reopen(pos);
                } else if total >= self.bet + self.min_raise {
                    self.min_raise = total - self.bet;
                    self.bet = total;
                    self.reopen(pos);
                }
                // else: a calling all-in, possibly short; action stays closed
            }
        }
        log::debug!("[engine] #{} {} (pot {})", number, action, self.pot);
        Ok(())
    }

    /// Advances the turn to the next live unacted seat.
    pub fn next_actor(&mut self) -> Position {
        debug_assert!(!self.is_round_complete());
        self.actor = self
            .next_to_act_after(self.actor)
            .expect("incomplete round has an actor");
        self.actor_number()
    }

    /// Folds a live seat regardless of turn order (disconnect, timeout).
    /// All-in players stay in the hand; their cards play.
    /// Returns true if the seat was folded.
    pub fn retire(&mut self, number: Position) -> bool {
        match self.position_of(number) {
            Some(pos) if self.seats[pos].state() == State::Betting => {
                self.seats[pos].fold();
                log::debug!("[engine] #{} retired", number);
                true
            }
            _ => false,
        }
    }

    /// Folds a seat unconditionally, all-in included (the player is leaving
    /// the table and forfeits the hand). Returns true if the seat folded.
    pub fn abandon(&mut self, number: Position) -> bool {
        match self.position_of(number) {
            Some(pos) if self.seats[pos].state() != State::Folding => {
                self.seats[pos].fold();
                log::debug!("[engine] #{} abandoned the hand", number);
                true
            }
            _ => false,
        }
    }

    fn pay(&mut self, pos: Position, amount: Chips) {
        self.seats[pos].bet(amount);
        self.pot += amount;
    }

    /// A bet or raise reopens the action for everyone else still live.
    fn reopen(&mut self, except: Position) {
        for (pos, seat) in self.seats.iter_mut().enumerate() {
            if pos != except && seat.state() == State::Betting {
                seat.untouch();
            }
        }
    }

    fn position_of(&self, number: Position) -> Option<Position> {
        self.seats.iter().position(|s| s.number() == number)
    }

    fn next_to_act_after(&self, start: Position) -> Option<Position> {
        let n = self.seats.len();
        (1..=n)
            .map(|i| (start + i) % n)
            .find(|&pos| self.seats[pos].state() == State::Betting && !self.seats[pos].acted())
    }

    fn next_live_after(&self, start: Position) -> Option<Position> {
        let n = self.seats.len();
        (1..=n)
            .map(|i| (start + i) % n)
            .find(|&pos| self.seats[pos].state() == State::Betting)
    }
}

/// Street transitions.
impl Engine {
    /// Deals the next street: burn then flop/turn/river cards. Street bets
    /// reset, the action reopens, and first to act is the next live seat
    /// after the dealer.
    pub fn advance_round(&mut self) -> Street {
        debug_assert!(self.street() != Street::Rive);
        debug_assert!(self.is_round_complete());
        let street = self.street().next();
        self.deck.burn();
        self.board.add(self.deck.deal(street.n_revealed()));
        for seat in self.seats.iter_mut() {
            seat.reset_stake();
        }
        self.bet = 0;
        self.min_raise = self.stakes.bblind();
        self.actor = self.next_live_after(self.dealer).unwrap_or(self.dealer);
        log::debug!("[engine] {} {}", street, self.board);
        street
    }

    /// Runs the board out to the river with no further betting (everyone
    /// remaining is all-in, or a lone live player faces only all-ins).
    pub fn run_out(&mut self) {
        debug_assert!(self.is_betting_over());
        while self.street() != Street::Rive {
            let street = self.street().next();
            self.deck.burn();
            self.board.add(self.deck.deal(street.n_revealed()));
            log::debug!("[engine] {} {} (run out)", street, self.board);
        }
        for seat in self.seats.iter_mut() {
            seat.reset_stake();
        }
        self.bet = 0;
    }
}

/// Showdown and payout.
impl Engine {
    /// Settles the hand: returns any uncalled excess, takes the rake, and
    /// splits the rest among the best hands. Winnings are applied to seat
    /// stacks; odd chips go to winners in seat order starting left of the
    /// dealer.
    pub fn settle(&mut self) -> Settlement {
        let survivors: Vec<Position> = (0..self.seats.len())
            .filter(|&pos| self.seats[pos].state() != State::Folding)
            .collect();
        debug_assert!(!survivors.is_empty());
        // an uncontested winner keeps their own uncalled bet inside the pot;
        // at showdown the unmatchable excess is returned first
        let refund = match survivors.len() {
            1 => None,
            _ => self.refund_uncalled(),
        };
        let pot = self.pot;
        let rake = self.stakes.rake(pot);
        let showdown: Vec<Showing> = match survivors.len() {
            1 => Vec::new(),
            _ => survivors
                .iter()
                .map(|&pos| {
                    let cards = Hand::add(
                        Hand::from(self.seats[pos].cards()),
                        Hand::from(self.board),
                    );
                    let evaluator = Evaluator::from(cards);
                    Showing {
                        seat: self.seats[pos].number(),
                        strength: Strength::from(cards),
                        besthand: evaluator.find_besthand(),
                    }
                })
                .collect(),
        };
        let winners: Vec<Position> = match survivors.len() {
            1 => survivors,
            _ => {
                let best = showdown
                    .iter()
                    .map(|s| s.strength)
                    .max()
                    .expect("non-empty showdown");
                survivors
                    .into_iter()
                    .zip(showdown.iter())
                    .filter(|(_, showing)| showing.strength == best)
                    .map(|(pos, _)| pos)
                    .collect()
            }
        };
        let awards = self.distribute(pot - rake, winners);
        self.pot = 0;
        let settlement = Settlement {
            pot,
            rake,
            refund,
            awards,
            showdown,
        };
        log::debug!("[engine] {}", settlement);
        settlement
    }

    /// Returns the excess of the largest commitment over the second-largest:
    /// chips nobody could match never play.
    fn refund_uncalled(&mut self) -> Option<Award> {
        let mut spents: Vec<(Position, Chips)> = self
            .seats
            .iter()
            .enumerate()
            .map(|(pos, s)| (pos, s.spent()))
            .collect();
        spents.sort_by_key(|(_, spent)| std::cmp::Reverse(*spent));
        let (top, most) = spents[0];
        let matched = spents.get(1).map(|(_, next)| *next).unwrap_or(0);
        match most - matched {
            0 => None,
            excess => {
                self.seats[top].win(excess);
                self.pot -= excess;
                Some(Award {
                    seat: self.seats[top].number(),
                    amount: excess,
                })
            }
        }
    }

    /// Splits a pot among winners; remainders go one chip at a time in seat
    /// order starting left of the dealer.
    fn distribute(&mut self, pot: Chips, winners: Vec<Position>) -> Vec<Award> {
        let n = self.seats.len();
        let mut winners = winners;
        winners.sort_by_key(|&pos| (pos + n - self.dealer - 1) % n);
        let share = pot / winners.len() as Chips;
        let bonus = pot % winners.len() as Chips;
        winners
            .into_iter()
            .enumerate()
            .map(|(i, pos)| {
                let amount = share + if (i as Chips) < bonus { 1 } else { 0 };
                self.seats[pos].win(amount);
                Award {
                    seat: self.seats[pos].number(),
                    amount,
                }
            })
            .collect()
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for seat in self.seats.iter() {
            writeln!(f, "{}", seat)?;
        }
        writeln!(f, "Pot   {}", self.pot)?;
        writeln!(f, "Board {}", self.board)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chipless(sblind: Chips, bblind: Chips) -> Stakes {
        Stakes::new(sblind, bblind, 0, 0)
    }

    fn total(engine: &Engine) -> Chips {
        engine.pot() + engine.seats().iter().map(|s| s.stack()).sum::<Chips>()
    }

    /// heads-up: dealer posts SB and acts first preflop
    #[test]
    fn heads_up_positions() {
        let engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000)],
            None,
        )
        .unwrap();
        assert_eq!(engine.dealer_number(), 1);
        assert_eq!(engine.sb_number(), 1);
        assert_eq!(engine.bb_number(), 2);
        assert_eq!(engine.actor_number(), 1);
        assert_eq!(engine.pot(), 30);
        assert_eq!(engine.current_bet(), 20);
    }

    /// three-handed: SB left of dealer, BB left of SB, UTG opens
    #[test]
    fn three_handed_positions() {
        let engine = Engine::start(
            chipless(5, 10),
            vec![(1, 500), (2, 500), (3, 500)],
            None,
        )
        .unwrap();
        assert_eq!(engine.dealer_number(), 1);
        assert_eq!(engine.sb_number(), 2);
        assert_eq!(engine.bb_number(), 3);
        assert_eq!(engine.actor_number(), 1);
    }

    #[test]
    fn dealer_rotation() {
        let engine = Engine::start(
            chipless(5, 10),
            vec![(1, 500), (3, 500), (7, 500)],
            Some(3),
        )
        .unwrap();
        assert_eq!(engine.dealer_number(), 7);
        let engine = Engine::start(
            chipless(5, 10),
            vec![(1, 500), (3, 500), (7, 500)],
            Some(7),
        )
        .unwrap();
        assert_eq!(engine.dealer_number(), 1); // wraps around
    }

    #[test]
    fn refuses_lone_player() {
        assert!(Engine::start(chipless(5, 10), vec![(1, 500)], None).is_err());
    }

    #[test]
    fn two_passes_deal_unique_cards() {
        let engine = Engine::start(
            chipless(5, 10),
            vec![(1, 500), (2, 500), (3, 500)],
            None,
        )
        .unwrap();
        let mut all = Hand::empty();
        for seat in engine.seats() {
            all = Hand::add(all, Hand::from(seat.cards())); // add panics on overlap
        }
        assert_eq!(all.size(), 6);
    }

    /// heads-up hand ending in an uncontested win on the turn
    #[test]
    fn heads_up_to_uncontested_win() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000)],
            None,
        )
        .unwrap();
        let before = total(&engine);
        // preflop: dealer limps, BB checks
        engine.act(1, Action::Call).unwrap();
        assert!(!engine.is_round_complete());
        assert_eq!(engine.next_actor(), 2);
        engine.act(2, Action::Check).unwrap();
        assert!(engine.is_round_complete());
        assert_eq!(engine.pot(), 40);
        // flop: BB acts first
        assert_eq!(engine.advance_round(), Street::Flop);
        assert_eq!(engine.actor_number(), 2);
        engine.act(2, Action::Check).unwrap();
        engine.next_actor();
        engine.act(1, Action::Bet(40)).unwrap();
        assert!(!engine.is_round_complete()); // bet reopened the action
        engine.next_actor();
        engine.act(2, Action::Call).unwrap();
        assert!(engine.is_round_complete());
        assert_eq!(engine.pot(), 120);
        // turn: bet and a fold end it
        assert_eq!(engine.advance_round(), Street::Turn);
        engine.act(2, Action::Check).unwrap();
        engine.next_actor();
        engine.act(1, Action::Bet(100)).unwrap();
        engine.next_actor();
        engine.act(2, Action::Fold).unwrap();
        assert_eq!(engine.in_hand(), 1);
        let settlement = engine.settle();
        assert_eq!(settlement.pot, 220);
        assert_eq!(settlement.rake, 0);
        assert!(settlement.refund.is_none()); // uncontested: whole pot moves
        assert!(settlement.showdown.is_empty()); // no reveal
        assert_eq!(settlement.awards, vec![Award { seat: 1, amount: 220 }]);
        let a = engine.seat(1).unwrap().stack();
        let b = engine.seat(2).unwrap().stack();
        assert_eq!(a, 1060);
        assert_eq!(b, 940);
        assert_eq!(total(&engine), before);
    }

    /// fold-around: big blind wins the blinds without a flop
    #[test]
    fn fold_around_preflop() {
        let mut engine = Engine::start(
            chipless(5, 10),
            vec![(1, 1000), (2, 1000), (3, 1000)],
            None,
        )
        .unwrap();
        engine.act(1, Action::Fold).unwrap();
        engine.next_actor();
        engine.act(2, Action::Fold).unwrap();
        assert_eq!(engine.in_hand(), 1);
        assert_eq!(engine.street(), Street::Pref);
        let settlement = engine.settle();
        assert_eq!(settlement.pot, 15);
        assert!(settlement.showdown.is_empty());
        assert_eq!(settlement.awards, vec![Award { seat: 3, amount: 15 }]);
        assert_eq!(engine.seat(3).unwrap().stack(), 1005);
    }

    /// short-stack all-in: board runs out and the excess raise is returned
    #[test]
    fn short_stack_all_in_runout() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 50), (2, 1000)],
            Some(1), // button on seat 2, so seat 1 is the big blind
        )
        .unwrap();
        assert_eq!(engine.bb_number(), 1);
        assert_eq!(engine.actor_number(), 2);
        engine.act(2, Action::Raise(60)).unwrap();
        engine.next_actor();
        engine.act(1, Action::Call).unwrap();
        assert_eq!(engine.seat(1).unwrap().state(), State::Shoving);
        assert!(engine.is_round_complete());
        assert!(engine.is_betting_over());
        engine.run_out();
        assert_eq!(engine.board().size(), 5);
        assert_eq!(engine.street(), Street::Rive);
        let settlement = engine.settle();
        assert_eq!(settlement.refund, Some(Award { seat: 2, amount: 10 }));
        assert_eq!(settlement.pot, 100);
        assert_eq!(settlement.showdown.len(), 2);
        let paid: Chips = settlement.awards.iter().map(|a| a.amount).sum();
        assert_eq!(paid + settlement.rake, 100);
        assert_eq!(total(&engine), 1050);
    }

    /// acting out of turn is rejected without touching the hand
    #[test]
    fn out_of_turn_rejected() {
        let mut engine = Engine::start(
            chipless(5, 10),
            vec![(1, 1000), (2, 1000), (3, 1000)],
            None,
        )
        .unwrap();
        let pot = engine.pot();
        assert_eq!(engine.actor_number(), 1);
        assert_eq!(engine.act(2, Action::Fold), Err(ActionError::OutOfTurn));
        assert_eq!(engine.actor_number(), 1);
        assert_eq!(engine.pot(), pot);
        assert_eq!(engine.in_hand(), 3);
    }

    /// raises must grow by at least the previous raise increment
    #[test]
    fn minimum_raise_rule() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000), (3, 1000)],
            None,
        )
        .unwrap();
        assert_eq!(engine.to_raise(), 40);
        engine.act(1, Action::Raise(50)).unwrap(); // increment 30
        assert_eq!(engine.to_raise(), 80);
        engine.next_actor();
        assert_eq!(
            engine.act(2, Action::Raise(70)),
            Err(ActionError::IllegalRaiseAmount)
        );
        assert_eq!(engine.actor_number(), 2); // rejection keeps the turn
        engine.act(2, Action::Raise(80)).unwrap();
        assert!(!engine.seat(1).unwrap().acted()); // reopened
        assert!(!engine.seat(3).unwrap().acted());
    }

    #[test]
    fn illegal_checks_and_bets() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 30)],
            None,
        )
        .unwrap();
        assert_eq!(engine.act(1, Action::Check), Err(ActionError::IllegalCheck));
        assert_eq!(
            engine.act(1, Action::Bet(40)),
            Err(ActionError::InvalidAction) // a bet is already live preflop
        );
        engine.act(1, Action::Call).unwrap();
        engine.next_actor();
        engine.act(2, Action::Check).unwrap();
        engine.advance_round();
        assert_eq!(engine.actor_number(), 2);
        assert_eq!(
            engine.act(2, Action::Bet(5)),
            Err(ActionError::IllegalBetAmount) // below the big blind
        );
        assert_eq!(
            engine.act(2, Action::Bet(50)),
            Err(ActionError::InsufficientChips)
        );
        engine.act(2, Action::Check).unwrap();
        engine.next_actor();
        assert_eq!(engine.act(1, Action::Call), Err(ActionError::InvalidAction));
    }

    /// a calling all-in below the minimum raise does not reopen the action
    #[test]
    fn short_all_in_does_not_reopen() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000), (3, 30)],
            None,
        )
        .unwrap();
        engine.act(1, Action::Call).unwrap();
        engine.next_actor();
        engine.act(2, Action::Call).unwrap();
        engine.next_actor();
        // BB shoves 10 more on top of the posted 20: below min-raise
        engine.act(3, Action::AllIn).unwrap();
        assert_eq!(engine.seat(3).unwrap().state(), State::Shoving);
        assert_eq!(engine.current_bet(), 20); // action stays closed
        assert!(engine.seat(1).unwrap().acted());
        assert!(engine.seat(2).unwrap().acted());
        assert!(engine.is_round_complete());
    }

    /// a full-size all-in is a raise and reopens the action
    #[test]
    fn full_all_in_reopens() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000), (3, 200)],
            None,
        )
        .unwrap();
        engine.act(1, Action::Call).unwrap();
        engine.next_actor();
        engine.act(2, Action::Call).unwrap();
        engine.next_actor();
        engine.act(3, Action::AllIn).unwrap();
        assert_eq!(engine.current_bet(), 200);
        assert!(!engine.seat(1).unwrap().acted());
        assert!(!engine.seat(2).unwrap().acted());
        assert!(!engine.is_round_complete());
    }

    /// a blind bigger than the stack posts all-in for what is available
    #[test]
    fn short_blind_posts_all_in() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 15)],
            None,
        )
        .unwrap();
        assert_eq!(engine.seat(2).unwrap().state(), State::Shoving);
        assert_eq!(engine.current_bet(), 20);
        engine.act(1, Action::Call).unwrap();
        assert!(engine.is_round_complete());
        assert!(engine.is_betting_over());
        engine.run_out();
        let settlement = engine.settle();
        assert_eq!(settlement.refund, Some(Award { seat: 1, amount: 5 }));
        assert_eq!(settlement.pot, 30);
    }

    /// big blind keeps the option after limps
    #[test]
    fn big_blind_option() {
        let mut engine = Engine::start(
            chipless(5, 10),
            vec![(1, 500), (2, 500), (3, 500)],
            None,
        )
        .unwrap();
        engine.act(1, Action::Call).unwrap();
        engine.next_actor();
        engine.act(2, Action::Call).unwrap();
        assert!(!engine.is_round_complete()); // BB still to act
        engine.next_actor();
        engine.act(3, Action::Check).unwrap();
        assert!(engine.is_round_complete());
    }

    /// folding a live seat out of turn (disconnect path)
    #[test]
    fn retire_folds_live_seats_only() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 1000), (2, 1000), (3, 40)],
            None,
        )
        .unwrap();
        assert!(engine.retire(2));
        assert_eq!(engine.seat(2).unwrap().state(), State::Folding);
        assert!(!engine.retire(2)); // already folded
        engine.act(1, Action::AllIn).unwrap();
        assert!(!engine.retire(1)); // all-in seats stay in the hand
        assert!(!engine.retire(9)); // never dealt in
    }

    /// chips are conserved through betting, streets, and settlement
    #[test]
    fn chip_conservation() {
        let mut engine = Engine::start(
            chipless(10, 20),
            vec![(1, 300), (2, 800), (3, 1500)],
            None,
        )
        .unwrap();
        let before = total(&engine);
        engine.act(1, Action::Raise(60)).unwrap();
        assert_eq!(total(&engine), before);
        engine.next_actor();
        engine.act(2, Action::Call).unwrap();
        engine.next_actor();
        engine.act(3, Action::Call).unwrap();
        assert!(engine.is_round_complete());
        engine.advance_round();
        assert_eq!(total(&engine), before);
        engine.act(2, Action::Check).unwrap();
        engine.next_actor();
        engine.act(3, Action::Bet(100)).unwrap();
        engine.next_actor();
        engine.act(1, Action::AllIn).unwrap(); // 240 on top of 0: full raise
        engine.next_actor();
        engine.act(2, Action::Fold).unwrap();
        engine.next_actor();
        engine.act(3, Action::Call).unwrap();
        assert!(engine.is_round_complete());
        assert!(engine.is_betting_over());
        engine.run_out();
        let settlement = engine.settle();
        assert_eq!(total(&engine), before);
        let paid: Chips = settlement.awards.iter().map(|a| a.amount).sum();
        assert_eq!(paid + settlement.rake, settlement.pot);
    }

    /// raked pot: floor of the fraction, capped, remainder to the winner
    #[test]
    fn rake_comes_off_the_top() {
        let mut engine = Engine::start(
            Stakes::new(10, 20, 500, 15), // 5% capped at 15
            vec![(1, 1000), (2, 1000)],
            None,
        )
        .unwrap();
        engine.act(1, Action::Call).unwrap();
        engine.next_actor();
        engine.act(2, Action::Fold).unwrap();
        let settlement = engine.settle();
        assert_eq!(settlement.pot, 40);
        assert_eq!(settlement.rake, 2);
        assert_eq!(settlement.awards, vec![Award { seat: 1, amount: 38 }]);
    }
}
