use actix::prelude::*;
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::messages::*;
use super::registry::SessionId;
use super::server::ChatServer;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport adapter for one client connection. Parses inbound frames into
/// typed commands for the ChatServer and writes outbound events back as
/// JSON text; it holds no matchmaking state of its own.
pub struct WsSession {
    pub id: SessionId,
    hb: Instant,
    server_addr: Addr<ChatServer>,
    peer: String,
    /// Remaining ban seconds for a connection admitted only to be told it
    /// is banned; the session closes right after delivering the notice.
    ban_notice: Option<u64>,
}

impl WsSession {
    pub fn new(server_addr: Addr<ChatServer>, peer: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            hb: Instant::now(),
            server_addr,
            peer,
            ban_notice: None,
        }
    }

    /// Session that only delivers the `banned` notice and hangs up.
    pub fn banned(server_addr: Addr<ChatServer>, peer: String, seconds: u64) -> Self {
        Self {
            ban_notice: Some(seconds),
            ..Self::new(server_addr, peer)
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!("Client heartbeat failed for session {}, disconnecting", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Join { username, school } => {
                self.server_addr.do_send(Join {
                    id: self.id.clone(),
                    username,
                    school,
                });
            }
            ClientEvent::Message { text } => {
                self.server_addr.do_send(ChatText {
                    id: self.id.clone(),
                    text,
                });
            }
            ClientEvent::Typing => {
                self.server_addr.do_send(Typing {
                    id: self.id.clone(),
                });
            }
            ClientEvent::PingReq { ts } => {
                self.server_addr.do_send(PingReq {
                    id: self.id.clone(),
                    ts,
                });
            }
            ClientEvent::PingRes { to_id, ts } => {
                self.server_addr.do_send(PingRes {
                    id: self.id.clone(),
                    to_id,
                    ts,
                });
            }
            ClientEvent::Stop => {
                self.server_addr.do_send(Stop {
                    id: self.id.clone(),
                });
            }
        }
    }

    fn send_event(&self, ctx: &mut ws::WebsocketContext<Self>, event: &ServerEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            ctx.text(json);
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(seconds) = self.ban_notice {
            info!("Refusing banned peer {} ({}s remaining)", self.peer, seconds);
            self.send_event(ctx, &ServerEvent::Banned { seconds });
            ctx.close(Some(ws::CloseCode::Policy.into()));
            ctx.stop();
            return;
        }

        self.hb(ctx);

        let addr = ctx.address();
        self.server_addr.do_send(Connect {
            id: self.id.clone(),
            addr: addr.recipient(),
        });
        info!("Session {} started for peer {}", self.id, self.peer);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self.ban_notice.is_none() {
            self.server_addr.do_send(Disconnect {
                id: self.id.clone(),
            });
            info!("Session {} stopped", self.id);
        }
        Running::Stop
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => self.handle_event(event),
                    Err(_) => {
                        self.send_event(
                            ctx,
                            &ServerEvent::ErrorMsg {
                                message: "Invalid message format".to_string(),
                            },
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl Handler<OutboundEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundEvent, ctx: &mut Self::Context) {
        self.send_event(ctx, &msg.0);
    }
}
