use super::Envelope;
use super::Registry;
use riverboat_auth::Authenticator;
use riverboat_auth::Member;
use riverboat_core::ID;
use riverboat_core::REQUEST_DEADLINE;
use riverboat_core::Unique;
use riverboat_engine::Action;
use riverboat_gameroom::ActionRequest;
use riverboat_gameroom::AuthRequest;
use riverboat_gameroom::CreateTableRequest;
use riverboat_gameroom::Fault;
use riverboat_gameroom::Games;
use riverboat_gameroom::HistoryRequest;
use riverboat_gameroom::JoinTableRequest;
use riverboat_gameroom::Lobby;
use riverboat_gameroom::TableRequest;
use riverboat_gameroom::cards;
use riverboat_gameroom::code;
use riverboat_records::HandRepository;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio_postgres::Client;

/// Per-connection state held by the bridge task.
///
/// The outbox sender is handed to the registry at `auth`; from then on the
/// registry owns the only copy, so replacing the handle (a newer connection
/// for the same user) closes this connection's outbox and ends its bridge.
pub struct Connection {
    outbox: Option<Sender<String>>,
    member: Option<Member>,
    conn: Option<u64>,
    closing: bool,
}

impl Connection {
    pub fn new(outbox: Sender<String>) -> Self {
        Self {
            outbox: Some(outbox),
            member: None,
            conn: None,
            closing: false,
        }
    }
    pub fn closing(&self) -> bool {
        self.closing
    }
}

/// Transport-agnostic dispatch of typed envelopes.
///
/// Each inbound frame is decoded, authorized, routed to the lobby or game
/// manager under the per-request deadline, and answered with an envelope
/// that echoes the client's `request_id` and carries `success` either way.
pub struct Router {
    auth: Arc<dyn Authenticator>,
    lobby: Arc<Lobby>,
    games: Arc<Games>,
    registry: Arc<Registry>,
    db: Arc<Client>,
}

impl Router {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        lobby: Arc<Lobby>,
        games: Arc<Games>,
        registry: Arc<Registry>,
        db: Arc<Client>,
    ) -> Self {
        Self {
            auth,
            lobby,
            games,
            registry,
            db,
        }
    }

    /// Handles one inbound frame and produces the reply frame.
    pub async fn dispatch(&self, conn: &mut Connection, text: &str) -> String {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Envelope::failure(
                    "error",
                    None,
                    &Fault::invalid(format!("malformed envelope: {}", e)),
                )
                .to_json();
            }
        };
        let kind = envelope.kind.clone();
        let request_id = envelope.request_id.clone();
        log::debug!("[router] <- {}", kind);
        let deadline = std::time::Duration::from_secs(REQUEST_DEADLINE);
        let outcome = match tokio::time::timeout(deadline, self.handle(conn, &envelope)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Fault::new(
                code::REQUEST_TIMEOUT,
                "request deadline exceeded",
            )),
        };
        match outcome {
            Ok((reply, data)) => Envelope::reply(reply, request_id, data).to_json(),
            Err(fault) => {
                log::debug!("[router] {} failed: {}", kind, fault);
                Envelope::failure(&kind, request_id, &fault).to_json()
            }
        }
    }

    async fn handle(
        &self,
        conn: &mut Connection,
        envelope: &Envelope,
    ) -> Result<(&'static str, Value), Fault> {
        if envelope.kind == "auth" {
            return self.authenticate(conn, envelope).await;
        }
        let member = conn
            .member
            .clone()
            .ok_or_else(Fault::unauthenticated)?;
        match envelope.kind.as_str() {
            "ping" => Ok(("pong", Value::Null)),
            "logout" => {
                if let Some(id) = conn.conn.take() {
                    self.registry.remove(member.id(), id);
                }
                conn.member = None;
                conn.closing = true;
                log::info!("[router] {} logged out", member.username());
                Ok(("logout", Value::Null))
            }
            "table_create" => {
                let req: CreateTableRequest = payload(&envelope.data)?;
                let lobby = self.lobby.clone();
                let table =
                    shielded(async move { lobby.create(&member, req).await }).await?;
                Ok((
                    "table_create",
                    serde_json::json!({ "table_id": table.to_string() }),
                ))
            }
            "table_list" => {
                let tables = self.lobby.list(&member).await?;
                Ok(("table_list", serde_json::json!({ "tables": tables })))
            }
            "table_join" => {
                let req: JoinTableRequest = payload(&envelope.data)?;
                let table = req.table_id.to_string();
                let lobby = self.lobby.clone();
                shielded(async move { lobby.join(&member, req).await }).await?;
                Ok(("table_join", serde_json::json!({ "table_id": table })))
            }
            "table_leave" => {
                let req: TableRequest = payload(&envelope.data)?;
                let lobby = self.lobby.clone();
                shielded(async move { lobby.leave(&member, ID::from(req.table_id)).await })
                    .await?;
                Ok(("table_leave", Value::Null))
            }
            "table_set_ready" => {
                let req: TableRequest = payload(&envelope.data)?;
                let lobby = self.lobby.clone();
                shielded(async move { lobby.set_ready(&member, ID::from(req.table_id)).await })
                    .await?;
                Ok(("table_set_ready", Value::Null))
            }
            "table_start_game" => {
                let req: TableRequest = payload(&envelope.data)?;
                let lobby = self.lobby.clone();
                shielded(async move { lobby.start_game(&member, ID::from(req.table_id)).await })
                    .await?;
                Ok(("table_start_game", Value::Null))
            }
            "table_close" => {
                let req: TableRequest = payload(&envelope.data)?;
                let lobby = self.lobby.clone();
                shielded(async move { lobby.close(&member, ID::from(req.table_id)).await })
                    .await?;
                Ok(("table_close", Value::Null))
            }
            "get_game_state" => {
                let req: TableRequest = payload(&envelope.data)?;
                let view = self
                    .games
                    .game_view(ID::from(req.table_id), member.id())
                    .await?;
                Ok((
                    "get_game_state",
                    serde_json::to_value(view).map_err(Fault::internal)?,
                ))
            }
            "poker_action" => {
                let req: ActionRequest = payload(&envelope.data)?;
                let action =
                    Action::parse(&req.action, req.amount).map_err(Fault::invalid)?;
                let games = self.games.clone();
                let user = member.id();
                shielded(async move {
                    games.handle_action(ID::from(req.table_id), user, action).await
                })
                .await?;
                Ok(("poker_action", Value::Null))
            }
            "join_table_room" => {
                let req: TableRequest = payload(&envelope.data)?;
                self.registry.join_room(ID::from(req.table_id), member.id());
                Ok(("join_table_room", Value::Null))
            }
            "hand_history" => {
                let req: HistoryRequest = match envelope.data.is_null() {
                    true => HistoryRequest::default(),
                    false => payload(&envelope.data)?,
                };
                let hands = self
                    .db
                    .hands_of(member.id(), req.limit.clamp(1, 100))
                    .await
                    .map_err(Fault::from)?;
                let hands: Vec<Value> = hands
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "hand_id": h.id().to_string(),
                            "table_id": h.table.to_string(),
                            "hand_number": h.number,
                            "board": cards(h.board),
                            "pot": h.pot,
                            "rake": h.rake,
                            "winners": h.winners.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                Ok(("hand_history", serde_json::json!({ "hands": hands })))
            }
            other => Err(Fault::invalid(format!("unknown message type {}", other))),
        }
    }

    /// `auth` must precede every other request on a connection. On success
    /// the connection's outbox moves into the registry under the resolved
    /// user id, replacing any previous connection for that user.
    async fn authenticate(
        &self,
        conn: &mut Connection,
        envelope: &Envelope,
    ) -> Result<(&'static str, Value), Fault> {
        let req: AuthRequest = payload(&envelope.data)?;
        let member = self
            .auth
            .authenticate(&req.token)
            .await
            .ok_or_else(|| Fault::new(code::UNAUTHENTICATED, "invalid credential"))?;
        let outbox = conn
            .outbox
            .take()
            .ok_or_else(|| Fault::invalid("connection already authenticated"))?;
        let id = self.registry.add(member.id(), outbox);
        conn.conn = Some(id);
        conn.member = Some(member.clone());
        log::info!("[router] {} authenticated (conn {})", member.username(), id);
        Ok((
            "auth",
            serde_json::json!({
                "user_id": member.id().to_string(),
                "username": member.username(),
            }),
        ))
    }

    /// The transport closed: deregister and fold out of live hands. A stale
    /// connection id (the user already reconnected) cleans up nothing.
    pub async fn disconnected(&self, conn: &Connection) {
        if let (Some(member), Some(id)) = (&conn.member, conn.conn) {
            if self.registry.remove(member.id(), id) {
                log::info!("[router] {} disconnected", member.username());
                self.lobby.handle_disconnect(member.id()).await;
            }
        }
    }
}

fn payload<T: DeserializeOwned>(data: &Value) -> Result<T, Fault> {
    serde_json::from_value(data.clone()).map_err(|e| Fault::invalid(e.to_string()))
}

/// Runs a mutating handler on its own task so the request deadline cannot
/// cancel it mid-transaction: the work either commits or it does not, and a
/// timed-out client may safely retry with a new request_id.
async fn shielded<T, F>(work: F) -> Result<T, Fault>
where
    T: Send + 'static,
    F: Future<Output = Result<T, Fault>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .unwrap_or_else(|e| Err(Fault::internal(e)))
}
