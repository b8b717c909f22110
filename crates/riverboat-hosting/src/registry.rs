use riverboat_auth::Member;
use riverboat_core::ID;
use riverboat_core::OUTBOX_DEPTH;
use riverboat_gameroom::Courier;
use riverboat_gameroom::ServerMessage;
use riverboat_records::TableRecord;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::Sender;

/// One connected client's outbound lane.
///
/// The sink is a bounded channel drained by the connection's bridge task.
/// Delivery never blocks: a full outbox drops the frame and faults the
/// handle, and the client reconciles with `get_game_state` on reconnect.
pub struct Handle {
    conn: u64,
    tx: Sender<String>,
    alive: Arc<AtomicBool>,
}

impl Handle {
    fn deliver(&self, frame: String) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        if self.tx.try_send(frame).is_err() {
            log::warn!("[registry] conn {} faulted, dropping frame", self.conn);
            self.alive.store(false, Ordering::SeqCst);
        }
    }
}

/// Client registry: user id → live connection handle, plus observer rooms.
///
/// A user connecting twice REPLACES their prior handle; dropping the old
/// sender ends the old bridge's outbox and closes that socket.
pub struct Registry {
    counter: AtomicU64,
    clients: RwLock<HashMap<ID<Member>, Handle>>,
    rooms: RwLock<HashMap<ID<TableRecord>, HashSet<ID<Member>>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
            clients: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection for a user, taking ownership of the outbox
    /// sender, and returns the connection id. Any prior handle is replaced;
    /// dropping its sender ends the old bridge's outbox and closes that
    /// socket.
    pub fn add(&self, user: ID<Member>, tx: Sender<String>) -> u64 {
        let conn = self.counter.fetch_add(1, Ordering::SeqCst);
        let handle = Handle {
            conn,
            tx,
            alive: Arc::new(AtomicBool::new(true)),
        };
        if self
            .clients
            .write()
            .expect("registry lock")
            .insert(user, handle)
            .is_some()
        {
            log::info!("[registry] user {} reconnected, prior handle replaced", user);
        }
        conn
    }

    /// Deregisters a connection. A stale id (already replaced by a newer
    /// connection) is ignored; returns whether anything was removed.
    pub fn remove(&self, user: ID<Member>, conn: u64) -> bool {
        let mut clients = self.clients.write().expect("registry lock");
        match clients.get(&user) {
            Some(handle) if handle.conn == conn => {
                clients.remove(&user);
                drop(clients);
                for room in self.rooms.write().expect("registry lock").values_mut() {
                    room.remove(&user);
                }
                true
            }
            _ => false,
        }
    }

    /// Whether the user currently has a live handle.
    pub fn is_connected(&self, user: ID<Member>) -> bool {
        self.clients
            .read()
            .expect("registry lock")
            .get(&user)
            .is_some_and(|h| h.alive.load(Ordering::SeqCst))
    }

    /// Adds an observer to a table's broadcast audience.
    pub fn join_room(&self, table: ID<TableRecord>, user: ID<Member>) {
        self.rooms
            .write()
            .expect("registry lock")
            .entry(table)
            .or_default()
            .insert(user);
    }

    fn observers(&self, table: ID<TableRecord>) -> Vec<ID<Member>> {
        self.rooms
            .read()
            .expect("registry lock")
            .get(&table)
            .map(|room| room.iter().copied().collect())
            .unwrap_or_default()
    }

    fn deliver(&self, user: ID<Member>, frame: &str) {
        if let Some(handle) = self.clients.read().expect("registry lock").get(&user) {
            handle.deliver(frame.to_string());
        }
    }
}

/// Stamp a server message into its wire frame.
fn frame(message: &ServerMessage) -> String {
    let mut value = serde_json::to_value(message).expect("serialize server message");
    value["timestamp"] = serde_json::json!(now_ms());
    value.to_string()
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_millis() as i64
}

impl Courier for Registry {
    fn unicast(&self, user: ID<Member>, message: ServerMessage) {
        self.deliver(user, &frame(&message));
    }

    fn broadcast(&self, table: ID<TableRecord>, seated: &[ID<Member>], message: ServerMessage) {
        let frame = frame(&message);
        let mut audience: HashSet<ID<Member>> = seated.iter().copied().collect();
        audience.extend(self.observers(table));
        for user in audience {
            self.deliver(user, &frame);
        }
    }

    fn broadcast_all(&self, message: ServerMessage) {
        let frame = frame(&message);
        let clients = self.clients.read().expect("registry lock");
        for handle in clients.values() {
            handle.deliver(frame.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::Receiver;
    use tokio::sync::mpsc::channel;

    fn connect(registry: &Registry, user: ID<Member>) -> (u64, Receiver<String>) {
        let (tx, rx) = channel(OUTBOX_DEPTH);
        (registry.add(user, tx), rx)
    }

    #[tokio::test]
    async fn unicast_reaches_outbox() {
        let registry = Registry::new();
        let user = ID::default();
        let (_, mut rx) = connect(&registry, user);
        registry.unicast(
            user,
            ServerMessage::TableClosed {
                table_id: "t".into(),
            },
        );
        let frame = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "table_closed");
        assert!(value["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn newer_connection_replaces_older() {
        let registry = Registry::new();
        let user = ID::default();
        let (old_conn, mut old_rx) = connect(&registry, user);
        let (new_conn, mut new_rx) = connect(&registry, user);
        // the replaced outbox is closed
        assert!(old_rx.recv().await.is_none());
        registry.unicast(
            user,
            ServerMessage::TableClosed {
                table_id: "t".into(),
            },
        );
        assert!(new_rx.recv().await.is_some());
        // a stale disconnect must not evict the new connection
        assert!(!registry.remove(user, old_conn));
        assert!(registry.is_connected(user));
        assert!(registry.remove(user, new_conn));
        assert!(!registry.is_connected(user));
    }

    #[tokio::test]
    async fn full_outbox_faults_the_handle() {
        let registry = Registry::new();
        let user = ID::default();
        let (_, mut rx) = connect(&registry, user);
        for _ in 0..(OUTBOX_DEPTH + 8) {
            registry.unicast(
                user,
                ServerMessage::TableClosed {
                    table_id: "t".into(),
                },
            );
        }
        assert!(!registry.is_connected(user));
        // the frames that fit are still there; the overflow was dropped
        let mut delivered = 0;
        while rx.try_recv().is_ok() {
            delivered += 1;
        }
        assert_eq!(delivered, OUTBOX_DEPTH);
    }

    #[tokio::test]
    async fn observers_receive_table_broadcasts() {
        let registry = Registry::new();
        let table = ID::default();
        let observer = ID::default();
        let (_, mut rx) = connect(&registry, observer);
        registry.join_room(table, observer);
        registry.broadcast(
            table,
            &[],
            ServerMessage::TableClosed {
                table_id: "t".into(),
            },
        );
        assert!(rx.recv().await.is_some());
    }
}
