//! ICS 24: Host Requirements. Identifiers and the store paths under which the channel
//! upgrade handshake keeps (and proves) its records.

pub mod error;
pub mod identifier;
pub mod path;
pub(crate) mod validate;

pub use path::Path;
