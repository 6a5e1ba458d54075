//! ICS 04: Channel implementation, restricted to the channel upgrade handshake and the
//! packet bookkeeping it depends on.

pub mod channel;
pub mod commitment;
pub mod context;
pub mod error;
pub mod events;
pub mod handler;
pub mod msgs;
pub mod packet;
pub mod params;
pub mod query;
pub mod timeout;
pub mod upgrade;
pub mod upgrade_fields;
pub mod version;
