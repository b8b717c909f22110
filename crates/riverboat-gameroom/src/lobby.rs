use super::CreateTableRequest;
use super::Courier;
use super::Fault;
use super::Games;
use super::JoinTableRequest;
use super::ServerMessage;
use super::code;
use super::games::table_view;
use super::message::TableSummary;
use riverboat_auth::Member;
use riverboat_auth::password;
use riverboat_core::AWAY_TIMEOUT;
use riverboat_core::ID;
use riverboat_core::RAKE_SCALE;
use riverboat_core::SEATS_MAX;
use riverboat_core::SEATS_MIN;
use riverboat_core::SWEEP_INTERVAL;
use riverboat_core::Unique;
use riverboat_records::Ledger;
use riverboat_records::SeatRecord;
use riverboat_records::SeatRepository;
use riverboat_records::SeatStatus;
use riverboat_records::TableRecord;
use riverboat_records::TableRepository;
use riverboat_records::TableStatus;
use std::sync::Arc;
use tokio_postgres::Client;

/// The table manager: lifecycle and seating, never game logic.
///
/// Seat mutations for a table run under the same per-table lock the game
/// manager uses, on the session's dedicated connection, so joins and leaves
/// serialize with hand progress. The lock is always released before
/// `check_and_start_game` is invoked; no operation holds two table locks.
pub struct Lobby {
    db: Arc<Client>,
    games: Arc<Games>,
    courier: Arc<dyn Courier>,
    ledger: Arc<dyn Ledger>,
}

impl Lobby {
    pub fn new(
        db: Arc<Client>,
        games: Arc<Games>,
        courier: Arc<dyn Courier>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            db,
            games,
            courier,
            ledger,
        }
    }
}

/// Table lifecycle.
impl Lobby {
    /// Creates a table and announces it to every connected client.
    pub async fn create(
        &self,
        member: &Member,
        req: CreateTableRequest,
    ) -> Result<ID<TableRecord>, Fault> {
        if req.name.trim().is_empty() {
            return Err(Fault::invalid("table name must not be empty"));
        }
        if req.game_type != "texas_holdem" {
            return Err(Fault::invalid("unsupported game type"));
        }
        if !(SEATS_MIN..=SEATS_MAX).contains(&(req.max_players as usize)) {
            return Err(Fault::invalid("max_players must be between 2 and 9"));
        }
        if req.min_buy_in <= 0 || req.max_buy_in < req.min_buy_in {
            return Err(Fault::invalid("buy-in range is inverted or empty"));
        }
        if req.small_blind <= 0 || req.big_blind <= req.small_blind {
            return Err(Fault::invalid("blinds must satisfy 0 < small < big"));
        }
        if !(0.0..=1.0).contains(&req.rake_percent) || req.max_rake < 0 {
            return Err(Fault::invalid("rake must be a fraction of the pot"));
        }
        if req.is_private && req.password.as_deref().unwrap_or("").is_empty() {
            return Err(Fault::invalid("private tables need a password"));
        }
        let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(plain) => Some(password::hash(plain).map_err(Fault::internal)?),
            None => None,
        };
        let rake_bps = (req.rake_percent * RAKE_SCALE as f64).round() as i64;
        let table = TableRecord::new(
            req.name.trim().to_string(),
            req.game_type,
            req.max_players,
            req.min_buy_in,
            req.max_buy_in,
            req.small_blind,
            req.big_blind,
            rake_bps,
            req.max_rake,
            member.id(),
            password_hash,
            req.turn_timeout_secs,
        );
        self.db.create_table(&table).await?;
        log::info!("[lobby] {} created table {} ({})", member.username(), table.id(), table.name);
        self.courier.broadcast_all(ServerMessage::TableListUpdate {
            table: summarize(&table, 0),
        });
        Ok(table.id())
    }

    /// Public tables plus the requestor's own private tables.
    pub async fn list(&self, member: &Member) -> Result<Vec<TableSummary>, Fault> {
        let mut summaries = Vec::new();
        for table in self.db.list_tables(member.id()).await? {
            let occupied = self.db.seats_at(table.id()).await?.len();
            summaries.push(summarize(&table, occupied));
        }
        Ok(summaries)
    }

    /// Creator-only: closes a table, cashing every seat out. Terminal.
    pub async fn close(&self, member: &Member, table: ID<TableRecord>) -> Result<(), Fault> {
        let lock = self.games.session(table).await;
        let mut guard = lock.lock().await;
        let session = &mut *guard;
        let record = session
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        if record.created_by != member.id() {
            return Err(Fault::new(code::NOT_AUTHORIZED, "only the creator may close a table"));
        }
        if session.engine.is_some() {
            return Err(Fault::new(code::GAME_NOT_ACTIVE, "finish the hand before closing"));
        }
        let seats = session.db.seats_at(table).await?;
        for seat in seats.iter() {
            session.db.release_seat(table, seat.user).await?;
            if let Err(e) = self.ledger.credit(seat.user, seat.chips, table).await {
                log::error!("[lobby] cash-out for {} at {} failed: {}", seat.user, table, e);
            }
        }
        session.db.set_table_status(table, TableStatus::Closed).await?;
        log::info!("[lobby] table {} closed", table);
        let audience: Vec<_> = seats.iter().map(|s| s.user).collect();
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::TableClosed {
                table_id: table.to_string(),
            },
        );
        let mut record = record;
        record.status = TableStatus::Closed;
        self.courier.broadcast_all(ServerMessage::TableListUpdate {
            table: summarize(&record, 0),
        });
        Ok(())
    }
}

/// Seating.
impl Lobby {
    /// Seats a player with a buy-in, then starts the game if it can.
    pub async fn join(&self, member: &Member, req: JoinTableRequest) -> Result<(), Fault> {
        let table: ID<TableRecord> = ID::from(req.table_id);
        let start = {
            let lock = self.games.session(table).await;
            let mut guard = lock.lock().await;
            let session = &mut *guard;
            let record = session
                .db
                .get_table(table)
                .await?
                .ok_or_else(Fault::table_not_found)?;
            if record.status == TableStatus::Closed {
                return Err(Fault::table_not_found());
            }
            if record.is_private {
                let supplied = req.password.as_deref().unwrap_or("");
                let hash = record.password_hash.as_deref().unwrap_or("");
                if !password::verify(supplied, hash) {
                    return Err(Fault::new(code::INVALID_PASSWORD, "wrong table password"));
                }
            }
            let seats = session.db.seats_at(table).await?;
            if seats.iter().any(|s| s.user == member.id()) {
                return Err(Fault::new(
                    code::ALREADY_AT_TABLE,
                    "you already hold a seat here",
                ));
            }
            if !(record.min_buy_in..=record.max_buy_in).contains(&req.buy_in_amount) {
                return Err(Fault::new(
                    code::BUY_IN_OUT_OF_RANGE,
                    "buy-in outside the table's range",
                ));
            }
            // confirm the balance covers the buy-in before claiming a seat;
            // the debit below still guards against a concurrent spender
            self.ledger.reserve(member.id(), req.buy_in_amount).await?;
            if seats.len() >= record.max_players as usize {
                return Err(Fault::new(code::TABLE_FULL, "all seats are taken"));
            }
            let number = pick_seat(&seats, record.max_players as usize, req.preferred_seat)
                .ok_or_else(|| Fault::new(code::TABLE_FULL, "all seats are taken"))?;
            self.ledger.debit(member.id(), req.buy_in_amount, table).await?;
            let seat = SeatRecord::new(
                table,
                member.id(),
                member.username().to_string(),
                number,
                req.buy_in_amount,
            );
            if let Err(e) = session.db.create_seat(&seat).await {
                // the seat never existed: give the buy-in back
                if let Err(undo) = self.ledger.credit(member.id(), req.buy_in_amount, table).await {
                    log::error!("[lobby] buy-in rollback for {} failed: {}", member.id(), undo);
                }
                return Err(Fault::from(e));
            }
            log::info!(
                "[lobby] {} took seat {} at table {} for {}",
                member.username(),
                number,
                table,
                req.buy_in_amount
            );
            let seats = session.db.seats_at(table).await?;
            let audience: Vec<_> = seats.iter().map(|s| s.user).collect();
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::PlayerJoined {
                    table_id: table.to_string(),
                    user_id: member.id().to_string(),
                    username: member.username().to_string(),
                    seat_number: number,
                    chip_count: req.buy_in_amount,
                },
            );
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::TableUpdate {
                    table: table_view(&record, &seats, session.engine.as_ref()),
                },
            );
            self.courier.broadcast_all(ServerMessage::TableListUpdate {
                table: summarize(&record, seats.len()),
            });
            record.status == TableStatus::Waiting && seats.len() >= SEATS_MIN
        };
        // lock released: hand the table to the game manager if it can deal
        if start {
            self.games.check_and_start_game(table).await?;
        }
        Ok(())
    }

    /// Cashes a player out of a table, folding them out of any live hand.
    pub async fn leave(&self, member: &Member, table: ID<TableRecord>) -> Result<(), Fault> {
        self.depart(table, member.id()).await
    }

    /// Marks a seat ready to be dealt in; deals when the whole table is.
    pub async fn set_ready(&self, member: &Member, table: ID<TableRecord>) -> Result<(), Fault> {
        let everyone_ready = {
            let lock = self.games.session(table).await;
            let mut guard = lock.lock().await;
            let session = &mut *guard;
            let record = session
                .db
                .get_table(table)
                .await?
                .ok_or_else(Fault::table_not_found)?;
            session
                .db
                .seat_of(table, member.id())
                .await?
                .ok_or_else(|| Fault::new(code::NOT_AT_TABLE, "take a seat first"))?;
            session
                .db
                .set_seat_status(table, member.id(), SeatStatus::Playing)
                .await?;
            let seats = session.db.seats_at(table).await?;
            let audience: Vec<_> = seats.iter().map(|s| s.user).collect();
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::TableUpdate {
                    table: table_view(&record, &seats, session.engine.as_ref()),
                },
            );
            seats.len() >= SEATS_MIN && seats.iter().all(|s| s.status == SeatStatus::Playing)
        };
        if everyone_ready {
            self.games.check_and_start_game(table).await?;
        }
        Ok(())
    }

    /// Creator-only manual deal trigger.
    pub async fn start_game(&self, member: &Member, table: ID<TableRecord>) -> Result<(), Fault> {
        let record = self
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        if record.created_by != member.id() {
            return Err(Fault::new(
                code::NOT_AUTHORIZED,
                "only the creator may start the game",
            ));
        }
        self.games.check_and_start_game(table).await
    }

    /// The shared departure path for leave, eviction, and close-out:
    /// fold out of the live hand, release the seat, cash the chips out.
    async fn depart(&self, table: ID<TableRecord>, user: ID<Member>) -> Result<(), Fault> {
        let lock = self.games.session(table).await;
        let mut guard = lock.lock().await;
        let session = &mut *guard;
        let record = session
            .db
            .get_table(table)
            .await?
            .ok_or_else(Fault::table_not_found)?;
        let seat = session
            .db
            .seat_of(table, user)
            .await?
            .ok_or_else(|| Fault::new(code::NOT_AT_TABLE, "no seat to leave"))?;
        if let Some(number) = session.seat_of(user) {
            // leaving mid-hand forfeits it, all-in included
            self.games.fold_out(session, table, number, true).await;
        }
        // chips walk away at their live value; the fold may have completed
        // the hand and rewritten the seat row, so the stored count is
        // re-read rather than trusted from before
        let chips = match session.engine.as_ref().and_then(|e| e.seat(seat.number)) {
            Some(live) => live.stack(),
            None => session
                .db
                .seat_of(table, user)
                .await?
                .map(|s| s.chips)
                .unwrap_or(seat.chips),
        };
        session.db.release_seat(table, user).await?;
        if let Err(e) = self.ledger.credit(user, chips, table).await {
            log::error!("[lobby] cash-out for {} at {} failed: {}", user, table, e);
        }
        log::info!("[lobby] {} left table {} with {}", user, table, chips);
        let seats = session.db.seats_at(table).await?;
        let audience: Vec<_> = seats.iter().map(|s| s.user).collect();
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::PlayerLeft {
                table_id: table.to_string(),
                user_id: user.to_string(),
                seat_number: seat.number,
            },
        );
        // a table that can no longer deal goes back to waiting
        let playing = seats
            .iter()
            .filter(|s| s.status == SeatStatus::Playing)
            .count();
        let mut record = record;
        if record.status == TableStatus::Playing && playing < SEATS_MIN && session.engine.is_none()
        {
            session
                .db
                .set_table_status(table, TableStatus::Waiting)
                .await?;
            record.status = TableStatus::Waiting;
        }
        self.courier.broadcast(
            table,
            &audience,
            ServerMessage::TableUpdate {
                table: table_view(&record, &seats, session.engine.as_ref()),
            },
        );
        self.courier.broadcast_all(ServerMessage::TableListUpdate {
            table: summarize(&record, seats.len()),
        });
        Ok(())
    }
}

/// Disconnect handling and the away-seat sweeper.
impl Lobby {
    /// A client's transport closed: fold them out of live hands and mark
    /// their seats away. Seats (and chips) are preserved until the sweeper
    /// reclaims them.
    pub async fn handle_disconnect(&self, user: ID<Member>) {
        let seats = match self.db.seats_of(user).await {
            Ok(seats) => seats,
            Err(e) => {
                log::error!("[lobby] could not look up seats for {}: {}", user, e);
                return;
            }
        };
        for seat in seats {
            let table = seat.table;
            let audience: Vec<_> = self
                .db
                .seats_at(table)
                .await
                .map(|all| all.iter().map(|s| s.user).collect())
                .unwrap_or_default();
            self.courier.broadcast(
                table,
                &audience,
                ServerMessage::PlayerDisconnected {
                    table_id: table.to_string(),
                    user_id: user.to_string(),
                    seat_number: seat.number,
                },
            );
            self.games.auto_fold(table, user).await;
            if let Err(e) = self.db.mark_away(table, user).await {
                log::error!("[lobby] could not mark {} away at {}: {}", user, table, e);
            }
        }
    }

    /// Periodically reclaims seats that have sat away past the timeout.
    pub async fn sweep(self: Arc<Self>) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL));
        loop {
            ticker.tick().await;
            let stale = match self.db.stale_away(AWAY_TIMEOUT as f64).await {
                Ok(stale) => stale,
                Err(e) => {
                    log::error!("[lobby] away sweep failed: {}", e);
                    continue;
                }
            };
            for seat in stale {
                log::info!(
                    "[lobby] reclaiming away seat {} at table {}",
                    seat.number,
                    seat.table
                );
                if let Err(e) = self.depart(seat.table, seat.user).await {
                    log::warn!(
                        "[lobby] could not reclaim seat {} at {}: {}",
                        seat.number,
                        seat.table,
                        e
                    );
                }
            }
        }
    }
}

/// Lowest free seat number, or the preferred one if it is free.
fn pick_seat(
    seats: &[SeatRecord],
    max_players: usize,
    preferred: Option<usize>,
) -> Option<usize> {
    let taken: Vec<usize> = seats.iter().map(|s| s.number).collect();
    if let Some(wanted) = preferred {
        if (1..=max_players).contains(&wanted) && !taken.contains(&wanted) {
            return Some(wanted);
        }
    }
    (1..=max_players).find(|n| !taken.contains(n))
}

fn summarize(record: &TableRecord, occupied: usize) -> TableSummary {
    TableSummary {
        id: record.id().to_string(),
        name: record.name.clone(),
        game_type: record.game_type.clone(),
        status: record.status.label().to_string(),
        small_blind: record.small_blind,
        big_blind: record.big_blind,
        min_buy_in: record.min_buy_in,
        max_buy_in: record.max_buy_in,
        max_players: record.max_players,
        player_count: occupied,
        available_seats: (record.max_players as usize).saturating_sub(occupied),
        is_private: record.is_private,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(number: usize) -> SeatRecord {
        SeatRecord::new(ID::default(), ID::default(), format!("p{}", number), number, 500)
    }

    #[test]
    fn picks_lowest_free_seat() {
        let seats = vec![seat(1), seat(3)];
        assert_eq!(pick_seat(&seats, 6, None), Some(2));
    }

    #[test]
    fn honors_free_preference() {
        let seats = vec![seat(1)];
        assert_eq!(pick_seat(&seats, 6, Some(5)), Some(5));
    }

    #[test]
    fn falls_back_when_preference_taken() {
        let seats = vec![seat(1), seat(5)];
        assert_eq!(pick_seat(&seats, 6, Some(5)), Some(2));
    }

    #[test]
    fn rejects_out_of_range_preference() {
        let seats = vec![seat(1)];
        assert_eq!(pick_seat(&seats, 2, Some(7)), Some(2));
        assert_eq!(pick_seat(&seats, 1, Some(7)), None);
    }

    #[test]
    fn full_table_has_no_seat() {
        let seats = vec![seat(1), seat(2)];
        assert_eq!(pick_seat(&seats, 2, None), None);
    }
}
