use actix_web::App;
use actix_web::HttpServer;
use actix_web::web;
use riverboat_auth::Crypto;
use riverboat_auth::Member;
use riverboat_gameroom::Courier;
use riverboat_gameroom::Games;
use riverboat_gameroom::Lobby;
use riverboat_hosting::Registry;
use riverboat_hosting::Router;
use riverboat_hosting::health;
use riverboat_hosting::ws;
use riverboat_pg::Schema;
use riverboat_records::BetRecord;
use riverboat_records::HandRecord;
use riverboat_records::LedgerEntry;
use riverboat_records::PgLedger;
use riverboat_records::PlayerHandRecord;
use riverboat_records::SeatRecord;
use riverboat_records::TableRecord;
use std::sync::Arc;
use tokio_postgres::Client;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    riverboat_core::log();
    riverboat_core::kys();
    let db = riverboat_pg::db().await;
    migrate(&db).await;
    let registry = Arc::new(Registry::new());
    let courier: Arc<dyn Courier> = registry.clone();
    let games = Arc::new(Games::new(db.clone(), courier.clone()));
    let ledger = Arc::new(PgLedger::new(db.clone()));
    let lobby = Arc::new(Lobby::new(
        db.clone(),
        games.clone(),
        courier.clone(),
        ledger,
    ));
    tokio::spawn(lobby.clone().sweep());
    let auth = Arc::new(Crypto::from_env());
    let router = Arc::new(Router::new(auth, lobby, games, registry, db));
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("riverboat listening on {}", addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(router.clone()))
            .route("/ws", web::get().to(ws))
            .route("/health", web::get().to(health))
    })
    .bind(addr)?
    .run()
    .await
}

/// Executes every record's DDL. Idempotent: all statements are
/// `IF NOT EXISTS`, and creation order respects the foreign keys.
async fn migrate(db: &Client) {
    for (table, creates, indices) in [
        (Member::name(), Member::creates(), Member::indices()),
        (
            TableRecord::name(),
            TableRecord::creates(),
            TableRecord::indices(),
        ),
        (
            SeatRecord::name(),
            SeatRecord::creates(),
            SeatRecord::indices(),
        ),
        (
            HandRecord::name(),
            HandRecord::creates(),
            HandRecord::indices(),
        ),
        (
            PlayerHandRecord::name(),
            PlayerHandRecord::creates(),
            PlayerHandRecord::indices(),
        ),
        (BetRecord::name(), BetRecord::creates(), BetRecord::indices()),
        (
            LedgerEntry::name(),
            LedgerEntry::creates(),
            LedgerEntry::indices(),
        ),
    ] {
        db.batch_execute(creates).await.expect("create table");
        if !indices.is_empty() {
            db.batch_execute(indices).await.expect("create indices");
        }
        log::info!("schema ready: {}", table);
    }
}
