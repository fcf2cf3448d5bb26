pub mod chat;
pub mod identity;

pub use chat::*;
pub use identity::*;
