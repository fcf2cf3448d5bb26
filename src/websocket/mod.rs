pub mod abuse_gate;
pub mod matchmaker;
pub mod messages;
pub mod rate_limiter;
pub mod registry;
pub mod server;
pub mod session;

pub use abuse_gate::Rejection;
pub use messages::*;
pub use server::ChatServer;
pub use session::WsSession;
