use std::collections::HashMap;

use actix::Recipient;

use crate::domain::Identity;
use crate::websocket::messages::OutboundEvent;
use crate::websocket::rate_limiter::TokenBucket;

pub type SessionId = String;

/// Lifecycle of a connected session.
///
/// `New → Waiting → Paired → Waiting (partner loss) → Terminated`,
/// with `New → Terminated` reachable on early disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Waiting,
    Paired,
    Terminated,
}

/// Server-side state for one connected client.
pub struct Session {
    pub id: SessionId,
    pub addr: Recipient<OutboundEvent>,
    pub identity: Option<Identity>,
    pub state: SessionState,
    pub bucket: TokenBucket,
}

impl Session {
    pub fn new(id: SessionId, addr: Recipient<OutboundEvent>) -> Self {
        Self {
            id,
            addr,
            identity: None,
            state: SessionState::New,
            bucket: TokenBucket::default(),
        }
    }
}

/// Owns every live session and the partner relation. The relation is an
/// id-to-id index rather than mutual object references, so teardown is a
/// pair of map deletions. Only `link` and `unlink` touch the index, which
/// keeps it symmetric at every observable instant.
#[derive(Default)]
pub struct Registry {
    sessions: HashMap<SessionId, Session>,
    partners: HashMap<SessionId, SessionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Removes the session record. The caller severs the partner link first.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn partner_of(&self, id: &SessionId) -> Option<&SessionId> {
        self.partners.get(id)
    }

    /// A session can be offered as a match while it is connected and
    /// unpartnered.
    pub fn is_pairable(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id) && !self.partners.contains_key(id)
    }

    /// Links two sessions as mutual partners and marks both `Paired`.
    pub fn link(&mut self, a: &SessionId, b: &SessionId) {
        self.partners.insert(a.clone(), b.clone());
        self.partners.insert(b.clone(), a.clone());
        if let Some(session) = self.sessions.get_mut(a) {
            session.state = SessionState::Paired;
        }
        if let Some(session) = self.sessions.get_mut(b) {
            session.state = SessionState::Paired;
        }
    }

    /// Severs the partner link from both sides, returning the former
    /// partner's id. No-op for unpartnered sessions.
    pub fn unlink(&mut self, id: &SessionId) -> Option<SessionId> {
        let partner = self.partners.remove(id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    pub fn set_state(&mut self, id: &SessionId, state: SessionState) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.state = state;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
