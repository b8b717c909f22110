use super::Connection;
use super::Router;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use futures::StreamExt;
use riverboat_core::OUTBOX_DEPTH;
use std::sync::Arc;
use tokio::sync::mpsc::channel;

/// `GET /ws`: upgrades to a duplex connection and spawns its bridge.
pub async fn ws(
    req: HttpRequest,
    body: web::Payload,
    router: web::Data<Router>,
) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    actix_web::rt::spawn(bridge(router.into_inner(), session, stream));
    Ok(response)
}

/// Liveness probe.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Pumps one connection: outbox frames to the socket, inbound frames
/// through the router, one at a time in arrival order. Ends when either
/// side closes or the registry replaces this connection's handle.
async fn bridge(
    router: Arc<Router>,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    let (tx, mut rx) = channel::<String>(OUTBOX_DEPTH);
    let mut conn = Connection::new(tx);
    log::debug!("[bridge] connected");
    'sesh: loop {
        tokio::select! {
            biased;
            out = rx.recv() => match out {
                Some(json) => if session.text(json).await.is_err() { break 'sesh },
                None => break 'sesh, // handle replaced by a newer connection
            },
            msg = stream.next() => match msg {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    let reply = router.dispatch(&mut conn, &text).await;
                    if session.text(reply).await.is_err() { break 'sesh }
                    if conn.closing() { break 'sesh }
                }
                Some(Ok(actix_ws::Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() { break 'sesh }
                }
                Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                Some(Err(_)) => break 'sesh,
                None => break 'sesh,
                _ => continue 'sesh,
            },
        }
    }
    router.disconnected(&conn).await;
    let _ = session.close(None).await;
    log::debug!("[bridge] disconnected");
}
