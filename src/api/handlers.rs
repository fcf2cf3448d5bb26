use actix::Addr;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use actix_web_actors::ws;
use serde::Serialize;
use tracing::{error, info};

use crate::websocket::{Admit, ChatServer, GetConnectionCount, GetQueueDepth, Rejection, WsSession};

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
    websocket_connections: usize,
    waiting_sessions: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub chat_server: Addr<ChatServer>,
}

// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let connections = state
        .chat_server
        .send(GetConnectionCount)
        .await
        .unwrap_or(0);
    let waiting = state.chat_server.send(GetQueueDepth).await.unwrap_or(0);

    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "pairchat".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        websocket_connections: connections,
        waiting_sessions: waiting,
    };

    Ok(HttpResponse::Ok().json(response))
}

fn peer_address(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

// WebSocket connection handler. Admission runs here, before any session
// exists: a banned peer gets a short-lived socket carrying the `banned`
// notice, a throttled one is refused at the HTTP layer.
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let peer = peer_address(&req);

    let verdict = state
        .chat_server
        .send(Admit { addr: peer.clone() })
        .await
        .map_err(|e| {
            error!("Failed to reach chat server for admission: {}", e);
            actix_web::error::ErrorInternalServerError("Service unavailable")
        })?;

    match verdict {
        Ok(()) => {
            let session = WsSession::new(state.chat_server.clone(), peer);
            ws::start(session, &req, stream)
        }
        Err(Rejection::Banned { seconds }) => {
            let session = WsSession::banned(state.chat_server.clone(), peer, seconds);
            ws::start(session, &req, stream)
        }
        Err(Rejection::TooMany) => {
            info!("Refusing connection flood from {}", peer);
            Ok(HttpResponse::TooManyRequests().finish())
        }
    }
}
