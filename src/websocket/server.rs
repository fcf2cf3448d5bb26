use std::time::Instant;

use actix::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{sanitize_message, Identity};

use super::abuse_gate::{AbuseGate, Rejection, SWEEP_INTERVAL};
use super::matchmaker::{MatchQueue, Submission};
use super::messages::*;
use super::registry::{Registry, Session, SessionId, SessionState};

/// Single-owner engine for matchmaking, chat relay and connection policy.
/// All shared state (registry, queue, abuse gate) is mutated only inside
/// this actor's mailbox, so every operation runs as one non-preemptible
/// step and no further locking is needed.
pub struct ChatServer {
    registry: Registry,
    queue: MatchQueue,
    gate: AbuseGate,
}

impl ChatServer {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            queue: MatchQueue::new(),
            gate: AbuseGate::new(),
        }
    }

    fn send_to(&self, id: &SessionId, event: ServerEvent) {
        if let Some(session) = self.registry.get(id) {
            session.addr.do_send(OutboundEvent(event));
        }
    }

    /// Greedy FIFO matcher: pair with the longest-waiting live session, or
    /// join the back of the queue. No-op when already partnered, so a
    /// double submission cannot produce a second link.
    fn auto_search(&mut self, id: &SessionId) {
        if self.registry.partner_of(id).is_some() {
            return;
        }
        let registry = &self.registry;
        match self.queue.submit(id, |candidate| registry.is_pairable(candidate)) {
            Submission::Matched(partner) => {
                self.registry.link(id, &partner);
                self.notify_paired(id, &partner);
            }
            Submission::Enqueued => {
                self.registry.set_state(id, SessionState::Waiting);
                self.send_to(id, ServerEvent::Waiting);
            }
        }
    }

    fn notify_paired(&self, a: &SessionId, b: &SessionId) {
        let (Some(session_a), Some(session_b)) = (self.registry.get(a), self.registry.get(b))
        else {
            return;
        };
        let identity_a = session_a.identity.clone().unwrap_or_default();
        let identity_b = session_b.identity.clone().unwrap_or_default();
        session_a.addr.do_send(OutboundEvent(ServerEvent::Paired {
            username: identity_b.username,
            school: identity_b.school,
            id: b.clone(),
        }));
        session_b.addr.do_send(OutboundEvent(ServerEvent::Paired {
            username: identity_a.username,
            school: identity_a.school,
            id: a.clone(),
        }));
        info!("Paired sessions {} and {}", a, b);
    }

    /// Severs the partner link, tells the survivor, and puts it straight
    /// back into the matchmaker.
    fn release_partner(&mut self, id: &SessionId) {
        if let Some(partner) = self.registry.unlink(id) {
            self.send_to(&partner, ServerEvent::PartnerLeft);
            self.auto_search(&partner);
        }
    }

    fn sender_name(&self, id: &SessionId) -> String {
        self.registry
            .get(id)
            .and_then(|session| session.identity.as_ref())
            .map(|identity| identity.username.clone())
            .unwrap_or_default()
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ChatServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("ChatServer started");
        ctx.run_interval(SWEEP_INTERVAL, |act, _| {
            act.gate.sweep(Instant::now());
        });
    }
}

impl Handler<Admit> for ChatServer {
    type Result = Result<(), Rejection>;

    fn handle(&mut self, msg: Admit, _: &mut Context<Self>) -> Self::Result {
        self.gate.admit(&msg.addr, Instant::now())
    }
}

impl Handler<Connect> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        info!("Session {} connected", msg.id);
        self.registry.insert(Session::new(msg.id, msg.addr));
    }
}

impl Handler<Disconnect> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        self.queue.remove(&msg.id);
        let partner = self.registry.unlink(&msg.id);
        if self.registry.remove(&msg.id).is_some() {
            info!("Session {} disconnected", msg.id);
        }
        // The survivor is told and resubmitted only after the leaver is
        // fully gone, so it can never be offered as a match again.
        if let Some(partner) = partner {
            self.send_to(&partner, ServerEvent::PartnerLeft);
            self.auto_search(&partner);
        }
    }
}

impl Handler<Join> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Join, _: &mut Context<Self>) {
        let state = match self.registry.get(&msg.id) {
            Some(session) => session.state,
            None => return,
        };
        if state != SessionState::New {
            self.send_to(
                &msg.id,
                ServerEvent::ErrorMsg {
                    message: "Already joined".to_string(),
                },
            );
            return;
        }
        match Identity::parse(&msg.username, &msg.school) {
            Ok(identity) => {
                info!("Session {} joined as {}", msg.id, identity.username);
                if let Some(session) = self.registry.get_mut(&msg.id) {
                    session.identity = Some(identity);
                }
                self.auto_search(&msg.id);
            }
            Err(err) => {
                self.send_to(
                    &msg.id,
                    ServerEvent::ErrorMsg {
                        message: err.to_string(),
                    },
                );
            }
        }
    }
}

impl Handler<ChatText> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: ChatText, _: &mut Context<Self>) {
        // The token is spent before validation, so oversized spam still
        // drains the bucket.
        let allowed = match self.registry.get_mut(&msg.id) {
            Some(session) => session.bucket.consume(1),
            None => return,
        };
        if !allowed {
            warn!("Session {} is rate limited", msg.id);
            self.send_to(
                &msg.id,
                ServerEvent::Warning {
                    message: "You are sending messages too quickly".to_string(),
                },
            );
            return;
        }
        let Some(clean) = sanitize_message(&msg.text) else {
            return;
        };
        match self.registry.partner_of(&msg.id).cloned() {
            Some(partner) => {
                let from = self.sender_name(&msg.id);
                self.send_to(&partner, ServerEvent::Message { from, text: clean });
            }
            None => {
                self.send_to(
                    &msg.id,
                    ServerEvent::ErrorMsg {
                        message: "No partner connected".to_string(),
                    },
                );
            }
        }
    }
}

impl Handler<Typing> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Typing, _: &mut Context<Self>) {
        if let Some(partner) = self.registry.partner_of(&msg.id).cloned() {
            let from = self.sender_name(&msg.id);
            self.send_to(&partner, ServerEvent::Typing { from });
        }
    }
}

impl Handler<PingReq> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: PingReq, _: &mut Context<Self>) {
        if let Some(partner) = self.registry.partner_of(&msg.id).cloned() {
            self.send_to(
                &partner,
                ServerEvent::PingReq {
                    from_id: msg.id,
                    ts: msg.ts,
                },
            );
        }
    }
}

impl Handler<PingRes> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: PingRes, _: &mut Context<Self>) {
        // Best effort: a reply addressed to a session that vanished
        // mid-flight is dropped without a word.
        if self.registry.get(&msg.to_id).is_some() {
            self.send_to(
                &msg.to_id,
                ServerEvent::PingRes {
                    ts: msg.ts,
                    from_id: msg.id,
                },
            );
        } else {
            debug!("Dropping ping reply to unknown session {}", msg.to_id);
        }
    }
}

impl Handler<Stop> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Stop, _: &mut Context<Self>) {
        if self.registry.get(&msg.id).is_none() {
            return;
        }
        info!("Session {} stopped searching", msg.id);
        self.queue.remove(&msg.id);
        self.registry.set_state(&msg.id, SessionState::Terminated);
        self.release_partner(&msg.id);
        self.send_to(&msg.id, ServerEvent::Stopped);
    }
}

impl Handler<GetConnectionCount> for ChatServer {
    type Result = usize;

    fn handle(&mut self, _: GetConnectionCount, _: &mut Context<Self>) -> Self::Result {
        self.registry.len()
    }
}

impl Handler<GetQueueDepth> for ChatServer {
    type Result = usize;

    fn handle(&mut self, _: GetQueueDepth, _: &mut Context<Self>) -> Self::Result {
        self.queue.len()
    }
}
