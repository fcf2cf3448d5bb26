use actix::prelude::*;
use serde::{Deserialize, Serialize};

use crate::websocket::abuse_gate::Rejection;
use crate::websocket::registry::SessionId;

// Events a client may send over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join")]
    Join { username: String, school: String },
    #[serde(rename = "message")]
    Message { text: String },
    #[serde(rename = "typing")]
    Typing,
    #[serde(rename = "ping_req")]
    PingReq { ts: u64 },
    #[serde(rename = "ping_res")]
    PingRes {
        #[serde(rename = "toId")]
        to_id: String,
        ts: u64,
    },
    #[serde(rename = "stop")]
    Stop,
}

// Events the server pushes to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "paired")]
    Paired {
        username: String,
        school: String,
        id: String,
    },
    #[serde(rename = "message")]
    Message { from: String, text: String },
    #[serde(rename = "typing")]
    Typing { from: String },
    #[serde(rename = "partner_left")]
    PartnerLeft,
    #[serde(rename = "ping_req")]
    PingReq {
        #[serde(rename = "fromId")]
        from_id: String,
        ts: u64,
    },
    #[serde(rename = "ping_res")]
    PingRes {
        ts: u64,
        #[serde(rename = "fromId")]
        from_id: String,
    },
    #[serde(rename = "warning")]
    Warning { message: String },
    #[serde(rename = "errorMsg")]
    ErrorMsg { message: String },
    #[serde(rename = "banned")]
    Banned { seconds: u64 },
    #[serde(rename = "stopped")]
    Stopped,
}

// Commands consumed by the ChatServer actor.

/// Admission check for a new transport connection, before any session exists.
#[derive(Message)]
#[rtype(result = "Result<(), Rejection>")]
pub struct Admit {
    pub addr: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: SessionId,
    pub addr: Recipient<OutboundEvent>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: SessionId,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Join {
    pub id: SessionId,
    pub username: String,
    pub school: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ChatText {
    pub id: SessionId,
    pub text: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Typing {
    pub id: SessionId,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct PingReq {
    pub id: SessionId,
    pub ts: u64,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct PingRes {
    pub id: SessionId,
    pub to_id: SessionId,
    pub ts: u64,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Stop {
    pub id: SessionId,
}

/// Server event wrapped for delivery to a session actor.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct OutboundEvent(pub ServerEvent);

// Connection count for the health check.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct GetConnectionCount;

// Number of sessions currently waiting for a partner.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct GetQueueDepth;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_events() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"join","username":"alice","school":"north"}"#)
                .unwrap();
        assert!(matches!(event, ClientEvent::Join { .. }));

        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"ping_res","toId":"abc","ts":123}"#).unwrap();
        match event {
            ClientEvent::PingRes { to_id, ts } => {
                assert_eq!(to_id, "abc");
                assert_eq!(ts, 123);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn serializes_server_events_with_wire_names() {
        let json = serde_json::to_string(&ServerEvent::PingReq {
            from_id: "abc".into(),
            ts: 42,
        })
        .unwrap();
        assert!(json.contains(r#""type":"ping_req""#));
        assert!(json.contains(r#""fromId":"abc""#));

        let json = serde_json::to_string(&ServerEvent::ErrorMsg {
            message: "Invalid username".into(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"errorMsg""#));
    }

    #[test]
    fn rejects_unknown_event_types() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"hijack"}"#).is_err());
    }
}
