use riverboat_cards::Board;
use riverboat_cards::Card;
use riverboat_cards::Hand;
use riverboat_core::Chips;
use riverboat_core::HandNumber;
use riverboat_core::Position;
use serde::Serialize;

/// Server-initiated messages pushed over the duplex connection.
///
/// Serialization is adjacently tagged, so a message becomes exactly the
/// `{"type": ..., "data": {...}}` envelope shape; the transport layer stamps
/// the timestamp on the way out. Broadcasts never carry a `request_id`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Public table state changed: seats, stacks, status, or the action.
    TableUpdate { table: TableView },
    /// The set of joinable tables changed.
    TableListUpdate { table: TableSummary },
    /// A table was closed; it no longer accepts joins.
    TableClosed { table_id: String },
    /// The table left `waiting` and is dealing its first hand.
    GameStarted { table_id: String },
    /// A new hand was dealt.
    HandStarted {
        table_id: String,
        hand_id: String,
        hand_number: HandNumber,
        dealer_seat: Position,
        sb_seat: Position,
        bb_seat: Position,
        actor_seat: Position,
        pot: Chips,
    },
    /// Private: your two hole cards for this hand.
    HoleCards {
        table_id: String,
        hand_number: HandNumber,
        cards: Vec<String>,
    },
    PlayerJoined {
        table_id: String,
        user_id: String,
        username: String,
        seat_number: Position,
        chip_count: Chips,
    },
    PlayerLeft {
        table_id: String,
        user_id: String,
        seat_number: Position,
    },
    /// A player acted; the accompanying table_update names the next actor.
    PlayerAction {
        table_id: String,
        hand_number: HandNumber,
        seat_number: Position,
        user_id: String,
        action: String,
        pot: Chips,
        current_bet: Chips,
    },
    /// Community cards were dealt.
    RoundAdvanced {
        table_id: String,
        hand_number: HandNumber,
        street: String,
        board: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_seat: Option<Position>,
    },
    /// The hand finished: payouts, rake, and any showdown reveals.
    HandComplete {
        table_id: String,
        hand_id: String,
        hand_number: HandNumber,
        board: Vec<String>,
        pot: Chips,
        rake: Chips,
        winners: Vec<WinnerView>,
        reveals: Vec<RevealView>,
    },
    /// A player's transport dropped; their seat is held as away.
    PlayerDisconnected {
        table_id: String,
        user_id: String,
        seat_number: Position,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

/// A winner's payout at hand end.
#[derive(Clone, Debug, Serialize)]
pub struct WinnerView {
    pub user_id: String,
    pub seat_number: Position,
    pub amount: Chips,
}

/// A player's cards revealed at showdown.
#[derive(Clone, Debug, Serialize)]
pub struct RevealView {
    pub user_id: String,
    pub seat_number: Position,
    pub cards: Vec<String>,
    pub rank: String,
}

/// One table in the lobby listing.
#[derive(Clone, Debug, Serialize)]
pub struct TableSummary {
    pub id: String,
    pub name: String,
    pub game_type: String,
    pub status: String,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub max_players: i16,
    pub player_count: usize,
    pub available_seats: usize,
    pub is_private: bool,
}

/// Public table state: everything every observer may see.
#[derive(Clone, Debug, Serialize)]
pub struct TableView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub pot: Chips,
    pub current_bet: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_seat: Option<Position>,
    pub seats: Vec<SeatView>,
}

/// One seat inside a [`TableView`] or [`GameView`].
#[derive(Clone, Debug, Serialize)]
pub struct SeatView {
    pub seat_number: Position,
    pub user_id: String,
    pub username: String,
    pub chips: Chips,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_bet: Option<Chips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bet: Option<Chips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<HoleView>,
}

/// Hole cards as a viewer is allowed to see them: the real cards for the
/// viewer (and showdown survivors), a marker for everyone else.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum HoleView {
    Hidden(&'static str),
    Shown(Vec<String>),
}

impl HoleView {
    pub fn hidden() -> Self {
        Self::Hidden("hidden")
    }
    pub fn shown(hand: Hand) -> Self {
        Self::Shown(cards(hand))
    }
}

/// The per-viewer redacted game snapshot returned by `get_game_state`.
///
/// Field order is fixed and seats are ordered by number, so two calls
/// between the same two actions serialize identically for a given viewer.
#[derive(Clone, Debug, Serialize)]
pub struct GameView {
    pub table_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_number: Option<HandNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub board: Vec<String>,
    pub pot: Chips,
    pub current_bet: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealer_seat: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_seat: Option<Position>,
    pub seats: Vec<SeatView>,
}

/// Renders a card set in deck order for the wire.
pub fn cards(hand: Hand) -> Vec<String> {
    Vec::<Card>::from(hand)
        .into_iter()
        .map(|c| c.to_string())
        .collect()
}

/// Renders the community cards.
pub fn board_cards(board: Board) -> Vec<String> {
    cards(Hand::from(board))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacently_tagged_envelope_shape() {
        let msg = ServerMessage::TableClosed {
            table_id: "t-1".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value["type"], "table_closed");
        assert_eq!(value["data"]["table_id"], "t-1");
    }

    #[test]
    fn hole_views() {
        let hidden = serde_json::to_value(HoleView::hidden()).unwrap();
        assert_eq!(hidden, serde_json::json!("hidden"));
        let shown =
            serde_json::to_value(HoleView::shown(Hand::try_from("As Kd").unwrap())).unwrap();
        assert_eq!(shown, serde_json::json!(["Kd", "As"]));
    }
}
