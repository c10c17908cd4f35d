//! Session channels and the table of open sessions.

pub mod channel;
pub mod table;

pub use channel::{
    ChannelKind, Outbound, OutboundEvent, OutboundReceiver, PipeChannel, SessionChannel,
    SessionId, StreamChannel,
};
pub use table::{Inbound, Session, SessionTable};
