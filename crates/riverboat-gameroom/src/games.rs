use super::Courier;
use super::Fault;
use super::Player;
use super::ServerMessage;
use super::Session;
use super::board_cards;
use super::cards;
use super::code;
use super::message::GameView;
use super::message::HoleView;
use super::message::RevealView;
use super::message::SeatView;
use super::message::TableView;
use super::message::WinnerView;
use riverboat_auth::Member;
use riverboat_cards::Hand;
use riverboat_cards::Street;
use riverboat_core::Chips;
use riverboat_core::ID;
use riverboat_core::NEXT_HAND_DELAY;
use riverboat_core::Position;
use riverboat_core::SEATS_MIN;
use riverboat_core::Unique;
use riverboat_engine::Action;
use riverboat_engine::Engine;
use riverboat_engine::Settlement;
use riverboat_engine::Stakes;
use riverboat_engine::State;
use riverboat_pg::PgErr;
use riverboat_records::BetRecord;
use riverboat_records::BetRepository;
use riverboat_records::EntryKind;
use riverboat_records::HandPhase;
use riverboat_records::HandRecord;
use riverboat_records::HandRepository;
use riverboat_records::LedgerEntry;
use riverboat_records::LedgerRepository;
use riverboat_records::PlayerHandRecord;
use riverboat_records::SeatRecord;
use riverboat_records::SeatRepository;
use riverboat_records::SeatStatus;
use riverboat_records::TableRecord;
use riverboat_records::TableRepository;
use riverboat_records::TableStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio_postgres::Client;

/// A detached background task (next-hand delays, action timers).
type Task = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

/// The game manager: binds live engines to persisted hand records.
///
/// One [`Session`] per table, lazily allocated and guarded by its own mutex.
/// Exactly one engine mutation per table is in flight at any time; every
/// broadcast for a table is emitted inside the lock's critical section so
/// clients observe transitions in causal order. No operation ever holds two
/// table locks.
pub struct Games {
    db: Arc<Client>,
    courier: Arc<dyn Courier>,
    sessions: RwLock<HashMap<ID<TableRecord>, Arc<Mutex<Session>>>>,
}

impl Games {
    pub fn new(db: Arc<Client>, courier: Arc<dyn Courier>) -> Self {
        Self {
            db,
            courier,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The per-table lock. Allocated (with its dedicated store connection)
    /// on first request and kept for the life of the process.
    pub async fn session(&self, table: ID<TableRecord>) -> Arc<Mutex<Session>> {
        if let Some(lock) = self.sessions.read().await.get(&table) {
            return lock.clone();
        }
        let mut sessions = self.sessions.write().await;
        if let Some(lock) = sessions.get(&table) {
            return lock.clone();
        }
        let lock = Arc::new(Mutex::new(Session::new(riverboat_pg::conn().await)));
        sessions.insert(table, lock.clone());
        lock
    }
}

/// Hand lifecycle.
impl Games {
    /// Starts a hand if the table has no active hand and at least two seats
    /// are ready to play. Quietly does nothing otherwise.
    pub async fn check_and_start_game(
        self: &Arc<Self>,
        table: ID<TableRecord>,
    ) -> Result<(), Fault> {
        let lock = self.session(table).await;
        let mut guard = lock.lock().await;
        self.deal(&mut guard, table).await
    }

    async fn deal(
        self: &Arc<Self>,
        session: &mut Session,
        table: ID<TableRecord>,
    ) -> Result<(), Fault> {
        if session.engine.is_some() {
            return Ok(());
        }
        let record = self
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        if matches!(record.status, TableStatus::Closed | TableStatus::Paused) {
            return Err(Fault::new(code::GAME_NOT_ACTIVE, "table is not open for play"));
        }
        let seats = self.db.seats_at(table).await?;
        let ready: Vec<&SeatRecord> = seats
            .iter()
            .filter(|s| s.status == SeatStatus::Playing && s.chips > 0)
            .collect();
        if ready.len() < SEATS_MIN {
            if record.status == TableStatus::Playing {
                self.db.set_table_status(table, TableStatus::Waiting).await?;
                let audience: Vec<ID<Member>> = seats.iter().map(|s| s.user).collect();
                let mut record = record;
                record.status = TableStatus::Waiting;
                self.courier.broadcast(
                    table,
                    &audience,
                    ServerMessage::TableUpdate {
                        table: table_view(&record, &seats, None),
                    },
                );
            }
            return Ok(());
        }
        let stakes = Stakes::new(
            record.small_blind,
            record.big_blind,
            record.rake_bps,
            record.max_rake,
        );
        let entrants = ready.iter().map(|s| (s.number, s.chips)).collect();
        let engine = Engine::start(stakes, entrants, session.button).map_err(Fault::internal)?;
        let players: HashMap<Position, Player> = ready
            .iter()
            .map(|s| {
                (
                    s.number,
                    Player {
                        user: s.user,
                        username: s.username.clone(),
                    },
                )
            })
            .collect();
        let number = session.db.next_hand_number(table).await?;
        let hand = HandRecord::new(
            table,
            number,
            engine.dealer_number(),
            engine.sb_number(),
            engine.bb_number(),
        );
        let promote = record.status == TableStatus::Waiting;
        if let Err(e) = persist_deal(&mut session.db, &hand, &engine, &players, promote).await {
            self.quarantine(table).await;
            return Err(Fault::from(e));
        }
        let audience: Vec<ID<Member>> = players.values().map(|p| p.user).collect();
        if promote {
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::GameStarted {
                    table_id: table.to_string(),
                },
            );
        }
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::HandStarted {
                table_id: table.to_string(),
                hand_id: hand.id().to_string(),
                hand_number: number,
                dealer_seat: engine.dealer_number(),
                sb_seat: engine.sb_number(),
                bb_seat: engine.bb_number(),
                actor_seat: engine.actor_number(),
                pot: engine.pot(),
            },
        );
        for seat in engine.seats() {
            let player = &players[&seat.number()];
            self.courier.unicast(
                player.user,
                ServerMessage::HoleCards {
                    table_id: table.to_string(),
                    hand_number: number,
                    cards: cards(Hand::from(seat.cards())),
                },
            );
        }
        log::info!("[games] table {} dealt hand #{}", table, number);
        session.button = Some(engine.dealer_number());
        session.players = players;
        session.seq = 0;
        session.epoch += 1;
        let actor = engine.actor_number();
        session.hand = Some(hand);
        session.engine = Some(engine);
        self.arm_timer(table, actor, session.epoch, record.turn_timeout_secs);
        // blinds can put everyone all-in before anyone acts
        if session.engine.as_ref().is_some_and(|e| e.is_round_complete()) {
            let audience = session.audience();
            self.resolve(session, table, &record, &audience).await?;
        }
        Ok(())
    }

    /// Applies a player's action to the table's live hand.
    pub async fn handle_action(
        self: &Arc<Self>,
        table: ID<TableRecord>,
        user: ID<Member>,
        action: Action,
    ) -> Result<(), Fault> {
        let lock = self.session(table).await;
        let mut guard = lock.lock().await;
        let session = &mut *guard;
        if session.engine.is_none() {
            return Err(Fault::new(code::GAME_NOT_ACTIVE, "no hand in progress"));
        }
        let seat = session
            .seat_of(user)
            .ok_or_else(|| Fault::new(code::NOT_AT_TABLE, "you are not in this hand"))?;
        self.apply(session, table, seat, action).await
    }

    /// The shared action path: voluntary actions, timeout folds, and
    /// disconnect folds all come through here under the table lock.
    ///
    /// The action mutates a CLONE of the engine; the clone is installed only
    /// after the store accepted the bet row, so a persistence failure leaves
    /// the in-memory hand exactly where it was.
    async fn apply(
        self: &Arc<Self>,
        session: &mut Session,
        table: ID<TableRecord>,
        seat: Position,
        action: Action,
    ) -> Result<(), Fault> {
        let record = self
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        let audience = session.audience();
        let player = session.players[&seat].clone();
        let hand_id = session.hand.as_ref().expect("live hand").id();
        let hand_number = session.hand.as_ref().expect("live hand").number;
        let mut next = session.engine.clone().expect("live hand");
        let spent_before = next.seat(seat).expect("dealt-in seat").spent();
        next.act(seat, action)?;
        let acted = next.seat(seat).expect("seat acted");
        let bet = BetRecord {
            hand: hand_id,
            user: player.user,
            round: HandPhase::from(next.street()).label(),
            action: action.label(),
            amount: acted.spent() - spent_before,
            total_bet_this_round: acted.stake(),
            seq: session.seq + 1,
        };
        let status = acted.state().label();
        let spent = acted.spent();
        let pot = next.pot();
        let current_bet = next.current_bet();
        if let Err(e) = persist_action(&mut session.db, &bet, status, spent).await {
            self.quarantine(table).await;
            return Err(Fault::from(e));
        }
        session.engine = Some(next);
        session.seq += 1;
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::PlayerAction {
                table_id: table.to_string(),
                hand_number,
                seat_number: seat,
                user_id: player.user.to_string(),
                action: action.label().to_string(),
                pot,
                current_bet,
            },
        );
        self.resolve(session, table, &record, &audience).await?;
        let seats = self.db.seats_at(table).await?;
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::TableUpdate {
                table: table_view(&record, &seats, session.engine.as_ref()),
            },
        );
        Ok(())
    }

    /// Advances the hand after a successful action: completes it, runs the
    /// board out, deals the next street, or just moves the turn.
    async fn resolve(
        self: &Arc<Self>,
        session: &mut Session,
        table: ID<TableRecord>,
        record: &TableRecord,
        audience: &[ID<Member>],
    ) -> Result<(), Fault> {
        let engine = session.engine.as_mut().expect("live hand");
        if engine.in_hand() <= 1 {
            return self.complete(session, table, audience).await;
        }
        if !engine.is_round_complete() {
            let actor = engine.next_actor();
            session.epoch += 1;
            self.arm_timer(table, actor, session.epoch, record.turn_timeout_secs);
            return Ok(());
        }
        if engine.street() == Street::Rive {
            return self.complete(session, table, audience).await;
        }
        if engine.is_betting_over() {
            // no more betting possible: run the board out and show down
            engine.run_out();
            let board = engine.board();
            let number = session.hand.as_ref().expect("live hand").number;
            self.courier.broadcast(
                table,
                audience,
                ServerMessage::RoundAdvanced {
                    table_id: table.to_string(),
                    hand_number: number,
                    street: Street::Rive.to_string(),
                    board: board_cards(board),
                    actor_seat: None,
                },
            );
            return self.complete(session, table, audience).await;
        }
        // deal the next street on a clone; install it only once the store
        // holds the new board, as with apply()
        let mut next = engine.clone();
        let street = next.advance_round();
        let actor = next.actor_number();
        let board = next.board();
        let phase = HandPhase::from(street);
        let (id, number) = {
            let hand = session.hand.as_ref().expect("live hand");
            (hand.id(), hand.number)
        };
        if let Err(e) = session
            .db
            .set_hand_progress(id, phase, Hand::from(board))
            .await
        {
            self.quarantine(table).await;
            return Err(Fault::from(e));
        }
        let hand = session.hand.as_mut().expect("live hand");
        hand.board = Hand::from(board);
        hand.phase = phase;
        session.engine = Some(next);
        session.epoch += 1;
        self.courier.broadcast(
            table,
            audience,
            ServerMessage::RoundAdvanced {
                table_id: table.to_string(),
                hand_number: number,
                street: street.to_string(),
                board: board_cards(board),
                actor_seat: Some(actor),
            },
        );
        self.arm_timer(table, actor, session.epoch, record.turn_timeout_secs);
        Ok(())
    }

    /// Settles the hand and persists the outcome in one transaction, then
    /// schedules the next hand.
    ///
    /// Boxed with an explicit `Send` future type (rather than `async fn`) to
    /// cut the auto-trait inference cycle: this function is mutually
    /// recursive with `deal`/`resolve` through the spawned `next_hand` task,
    /// and an opaque `impl Future` return here would make rustc's Send check
    /// depend on itself.
    fn complete<'a>(
        self: &'a Arc<Self>,
        session: &'a mut Session,
        table: ID<TableRecord>,
        audience: &'a [ID<Member>],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), Fault>> + Send + 'a>> {
        Box::pin(async move {
        let engine_before = session.engine.clone();
        let hand_before = session.hand.clone();
        let mut engine = session.engine.take().expect("live hand");
        let mut hand = session.hand.take().expect("live hand");
        let settlement = engine.settle();
        hand.board = Hand::from(engine.board());
        hand.pot = settlement.pot;
        hand.rake = settlement.rake;
        hand.phase = HandPhase::Finished;
        hand.winners = settlement
            .awards
            .iter()
            .map(|a| session.players[&a.seat].user)
            .collect();
        let players = session.players.clone();
        if let Err(e) =
            persist_complete(&mut session.db, table, &hand, &engine, &settlement, &players).await
        {
            session.engine = engine_before;
            session.hand = hand_before;
            self.quarantine(table).await;
            return Err(Fault::from(e));
        }
        let winners = settlement
            .awards
            .iter()
            .map(|a| WinnerView {
                user_id: players[&a.seat].user.to_string(),
                seat_number: a.seat,
                amount: a.amount,
            })
            .collect();
        let reveals = settlement
            .showdown
            .iter()
            .map(|showing| RevealView {
                user_id: players[&showing.seat].user.to_string(),
                seat_number: showing.seat,
                cards: cards(Hand::from(
                    engine.seat(showing.seat).expect("showdown seat").cards(),
                )),
                rank: showing.strength.value().label().to_string(),
            })
            .collect();
        self.courier.broadcast(
            table,
            audience,
            ServerMessage::HandComplete {
                table_id: table.to_string(),
                hand_id: hand.id().to_string(),
                hand_number: hand.number,
                board: cards(hand.board),
                pot: hand.pot,
                rake: hand.rake,
                winners,
                reveals,
            },
        );
        log::info!(
            "[games] table {} hand #{} complete: {}",
            table,
            hand.number,
            settlement
        );
        session.players.clear();
        session.seq = 0;
        session.epoch += 1;
        let games = self.clone();
        // boxed to cut the future-type cycle back through deal()
        let wait: Task = Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_secs(NEXT_HAND_DELAY)).await;
            games.next_hand(table).await;
        });
        tokio::spawn(wait);
        Ok(())
        })
    }

    /// Fires after the between-hands delay: deals again, or returns the
    /// table to waiting if the seats thinned out.
    async fn next_hand(self: &Arc<Self>, table: ID<TableRecord>) {
        let lock = self.session(table).await;
        let mut guard = lock.lock().await;
        if let Err(e) = self.deal(&mut guard, table).await {
            log::warn!("[games] table {} could not deal next hand: {}", table, e);
        }
    }
}

/// Disconnects, timeouts, and departures.
impl Games {
    /// Auto-folds a disconnected player's live seat under the table lock.
    /// All-in players stay in the hand; their cards play without them.
    pub async fn auto_fold(self: &Arc<Self>, table: ID<TableRecord>, user: ID<Member>) {
        let lock = self.session(table).await;
        let mut guard = lock.lock().await;
        let session = &mut *guard;
        let Some(seat) = session.seat_of(user) else {
            return;
        };
        self.fold_out(session, table, seat, false).await;
    }

    /// Folds a seat out of the live hand, in or out of turn. With `force`
    /// (the player is leaving), even an all-in seat forfeits.
    pub(crate) async fn fold_out(
        self: &Arc<Self>,
        session: &mut Session,
        table: ID<TableRecord>,
        seat: Position,
        force: bool,
    ) {
        let Some(engine) = session.engine.as_ref() else {
            return;
        };
        let state = engine.seat(seat).map(|s| s.state());
        let foldable =
            state == Some(State::Betting) || (force && state == Some(State::Shoving));
        if !foldable {
            return; // folded already, or all-in with cards still live
        }
        if state == Some(State::Betting) && engine.actor_number() == seat {
            // their turn: fold through the normal action path
            if let Err(e) = self.apply(session, table, seat, Action::Fold).await {
                log::warn!("[games] table {} forced fold failed: {}", table, e);
            }
            return;
        }
        // not their turn: retire the seat in place
        let audience = session.audience();
        let engine = session.engine.as_mut().expect("live hand");
        if force {
            engine.abandon(seat);
        } else {
            engine.retire(seat);
        }
        let retired = engine.seat(seat).expect("dealt-in seat");
        let spent = retired.spent();
        let stake = retired.stake();
        let pot = engine.pot();
        let current_bet = engine.current_bet();
        let round = HandPhase::from(engine.street()).label();
        let player = session.players[&seat].clone();
        let hand_id = session.hand.as_ref().expect("live hand").id();
        let hand_number = session.hand.as_ref().expect("live hand").number;
        session.seq += 1;
        let bet = BetRecord {
            hand: hand_id,
            user: player.user,
            round,
            action: "fold",
            amount: 0,
            total_bet_this_round: stake,
            seq: session.seq,
        };
        if let Err(e) = persist_action(&mut session.db, &bet, "folded", spent).await {
            log::error!("[games] table {} forced fold not persisted: {}", table, e);
        }
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::PlayerAction {
                table_id: table.to_string(),
                hand_number,
                seat_number: seat,
                user_id: player.user.to_string(),
                action: "fold".to_string(),
                pot,
                current_bet,
            },
        );
        if session.engine.as_ref().expect("live hand").in_hand() <= 1 {
            if let Err(e) = self.complete(session, table, &audience).await {
                log::warn!("[games] table {} could not complete hand: {}", table, e);
            }
        }
    }

    fn arm_timer(
        self: &Arc<Self>,
        table: ID<TableRecord>,
        seat: Position,
        epoch: u64,
        timeout: Option<i64>,
    ) {
        let Some(secs) = timeout.filter(|s| *s > 0) else {
            return;
        };
        let games = self.clone();
        // boxed to cut the future-type cycle back through the action path
        let timer: Task = Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_secs(secs as u64)).await;
            games.timeout_fold(table, seat, epoch).await;
        });
        tokio::spawn(timer);
    }

    /// Fires when a player sits on their turn too long. The epoch guard
    /// makes stale timers harmless.
    async fn timeout_fold(self: &Arc<Self>, table: ID<TableRecord>, seat: Position, epoch: u64) {
        let lock = self.session(table).await;
        let mut guard = lock.lock().await;
        let session = &mut *guard;
        if session.epoch != epoch {
            return;
        }
        let Some(engine) = session.engine.as_ref() else {
            return;
        };
        if engine.actor_number() != seat {
            return;
        }
        log::info!("[games] table {} seat {} timed out, auto-folding", table, seat);
        if let Err(e) = self.apply(session, table, seat, Action::Fold).await {
            log::warn!("[games] table {} timeout fold failed: {}", table, e);
        }
    }

    /// Internal-error containment: pause the table for an operator and tell
    /// the room. Best-effort on both counts.
    async fn quarantine(&self, table: ID<TableRecord>) {
        log::error!("[games] table {} paused after internal error", table);
        if let Err(e) = self.db.set_table_status(table, TableStatus::Paused).await {
            log::error!("[games] table {} could not be paused: {}", table, e);
        }
        if let (Ok(Some(record)), Ok(seats)) =
            (self.db.get_table(table).await, self.db.seats_at(table).await)
        {
            let audience: Vec<ID<Member>> = seats.iter().map(|s| s.user).collect();
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::TableUpdate {
                    table: table_view(&record, &seats, None),
                },
            );
        }
    }
}

/// Redacted snapshots.
impl Games {
    /// The game state as one viewer is allowed to see it: only their own
    /// hole cards are present; everyone else's show as hidden.
    pub async fn game_view(
        &self,
        table: ID<TableRecord>,
        viewer: ID<Member>,
    ) -> Result<GameView, Fault> {
        let record = self
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        let lock = self.session(table).await;
        let session = lock.lock().await;
        let seats = self.db.seats_at(table).await?;
        let engine = session.engine.as_ref();
        let views = seats
            .iter()
            .map(|s| seat_view(s, engine, Some(viewer)))
            .collect();
        Ok(GameView {
            table_id: table.to_string(),
            status: record.status.label().to_string(),
            hand_id: session.hand.as_ref().map(|h| h.id().to_string()),
            hand_number: session.hand.as_ref().map(|h| h.number),
            phase: engine.map(|e| HandPhase::from(e.street()).label().to_string()),
            board: engine.map(|e| board_cards(e.board())).unwrap_or_default(),
            pot: engine.map(|e| e.pot()).unwrap_or(0),
            current_bet: engine.map(|e| e.current_bet()).unwrap_or(0),
            dealer_seat: engine.map(|e| e.dealer_number()),
            actor_seat: engine.map(|e| e.actor_number()),
            seats: views,
        })
    }
}

/// Public view of one seat, overlaying live engine state on the stored row.
fn seat_view(seat: &SeatRecord, engine: Option<&Engine>, viewer: Option<ID<Member>>) -> SeatView {
    let dealt = engine.and_then(|e| e.seat(seat.number));
    SeatView {
        seat_number: seat.number,
        user_id: seat.user.to_string(),
        username: seat.username.clone(),
        chips: dealt.map(|s| s.stack()).unwrap_or(seat.chips),
        status: dealt
            .map(|s| s.state().label().to_string())
            .unwrap_or_else(|| seat.status.label().to_string()),
        round_bet: dealt.map(|s| s.stake()),
        total_bet: dealt.map(|s| s.spent()),
        hole: dealt.map(|s| match viewer {
            Some(viewer) if viewer == seat.user => HoleView::shown(Hand::from(s.cards())),
            _ => HoleView::hidden(),
        }),
    }
}

/// Public table state for `table_update` broadcasts: no hole cards at all.
pub(crate) fn table_view(
    record: &TableRecord,
    seats: &[SeatRecord],
    engine: Option<&Engine>,
) -> TableView {
    TableView {
        id: record.id().to_string(),
        name: record.name.clone(),
        status: record.status.label().to_string(),
        pot: engine.map(|e| e.pot()).unwrap_or(0),
        current_bet: engine.map(|e| e.current_bet()).unwrap_or(0),
        actor_seat: engine.map(|e| e.actor_number()),
        seats: seats.iter().map(|s| seat_view(s, engine, None)).collect(),
    }
}

/// One transaction around the hand and player-hand inserts, plus the
/// waiting→playing promotion when this is the table's first hand.
async fn persist_deal(
    db: &mut Client,
    hand: &HandRecord,
    engine: &Engine,
    players: &HashMap<Position, Player>,
    promote: bool,
) -> Result<(), PgErr> {
    let tx = db.transaction().await?;
    tx.create_hand(hand).await?;
    for seat in engine.seats() {
        let player = players
            .get(&seat.number())
            .expect("dealt-in seat has a player");
        tx.create_player_hand(&PlayerHandRecord::new(
            hand.id(),
            player.user,
            seat.number(),
            seat.cards(),
        ))
        .await?;
    }
    if promote {
        tx.set_table_status(hand.table, TableStatus::Playing).await?;
    }
    tx.commit().await
}

/// One transaction around the bet row and the player-hand update.
async fn persist_action(
    db: &mut Client,
    bet: &BetRecord,
    status: &str,
    spent: Chips,
) -> Result<(), PgErr> {
    let tx = db.transaction().await?;
    tx.record_bet(bet).await?;
    tx.update_player_hand(bet.hand, bet.user, status, spent, bet.action)
        .await?;
    tx.commit().await
}

/// One transaction around everything a finished hand touches: the hand row,
/// seat stacks, ledger entries, and best-hand marks.
async fn persist_complete(
    db: &mut Client,
    table: ID<TableRecord>,
    hand: &HandRecord,
    engine: &Engine,
    settlement: &Settlement,
    players: &HashMap<Position, Player>,
) -> Result<(), PgErr> {
    let tx = db.transaction().await?;
    tx.finish_hand(hand).await?;
    for seat in engine.seats() {
        let player = players
            .get(&seat.number())
            .expect("dealt-in seat has a player");
        tx.set_seat_chips(table, player.user, seat.stack()).await?;
    }
    for award in settlement.awards.iter() {
        let player = &players[&award.seat];
        tx.record_entry(&LedgerEntry::new(
            Some(player.user),
            Some(table),
            Some(hand.id()),
            award.amount,
            EntryKind::Win,
        ))
        .await?;
    }
    if let Some(refund) = settlement.refund {
        let player = &players[&refund.seat];
        tx.record_entry(&LedgerEntry::new(
            Some(player.user),
            Some(table),
            Some(hand.id()),
            refund.amount,
            EntryKind::Refund,
        ))
        .await?;
    }
    if settlement.rake > 0 {
        tx.record_entry(&LedgerEntry::new(
            None,
            Some(table),
            Some(hand.id()),
            settlement.rake,
            EntryKind::Rake,
        ))
        .await?;
    }
    for showing in settlement.showdown.iter() {
        let player = &players[&showing.seat];
        tx.mark_best_hand(
            hand.id(),
            player.user,
            showing.strength.value().label(),
            showing.besthand,
        )
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverboat_records::SeatStatus;

    fn engine() -> (Engine, ID<Member>, ID<Member>) {
        let engine = Engine::start(
            Stakes::new(5, 10, 0, 0),
            vec![(1, 500), (2, 500)],
            None,
        )
        .unwrap();
        (engine, ID::default(), ID::default())
    }

    fn seat_record(table: ID<TableRecord>, user: ID<Member>, number: usize) -> SeatRecord {
        let mut seat = SeatRecord::new(table, user, format!("p{}", number), number, 500);
        seat.status = SeatStatus::Playing;
        seat
    }

    /// only the viewer's own hole cards survive redaction
    #[test]
    fn snapshot_redacts_other_holes() {
        let (engine, alice, bob) = engine();
        let table = ID::default();
        let seats = [
            seat_record(table, alice, 1),
            seat_record(table, bob, 2),
        ];
        let mine = seat_view(&seats[0], Some(&engine), Some(alice));
        assert!(matches!(mine.hole, Some(HoleView::Shown(_))));
        let theirs = seat_view(&seats[1], Some(&engine), Some(alice));
        assert!(matches!(theirs.hole, Some(HoleView::Hidden(_))));
    }

    /// broadcast table views never contain hole cards
    #[test]
    fn table_view_hides_every_hole() {
        let (engine, alice, bob) = engine();
        let alice_record = TableRecord::new(
            "main".into(),
            "texas_holdem".into(),
            6,
            100,
            1000,
            5,
            10,
            0,
            0,
            alice,
            None,
            None,
        );
        let table = alice_record.id();
        let seats = vec![
            seat_record(table, alice, 1),
            seat_record(table, bob, 2),
        ];
        let view = table_view(&alice_record, &seats, Some(&engine));
        for seat in view.seats {
            assert!(matches!(seat.hole, Some(HoleView::Hidden(_))));
        }
    }

    /// live engine stacks override the stored chip counts
    #[test]
    fn snapshot_overlays_live_stacks() {
        let (engine, alice, _) = engine();
        let table = ID::default();
        let record = seat_record(table, alice, 1);
        // seat 1 is the heads-up dealer and posted the small blind
        let view = seat_view(&record, Some(&engine), Some(alice));
        assert_eq!(view.chips, 495);
        assert_eq!(view.round_bet, Some(5));
        // with no engine the stored chips stand
        let idle = seat_view(&record, None, Some(alice));
        assert_eq!(idle.chips, 500);
        assert!(idle.hole.is_none());
    }
}
