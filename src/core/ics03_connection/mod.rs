//! ICS 03: Connection. The connection ends a channel is routed over, as seen by the channel
//! upgrade handshake: their state, their counterparty and the features they negotiated.

pub mod connection;
pub mod error;
pub mod version;
