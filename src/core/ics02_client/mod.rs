//! ICS 02: Client. Only the parts the channel upgrade handshake consumes: heights, client
//! types, consensus states and the light client verification capability.

pub mod client_def;
pub mod client_type;
pub mod consensus_state;
pub mod error;
pub mod height;
