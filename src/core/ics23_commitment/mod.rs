//! ICS 23: Commitment. Roots, prefixes and opaque proof bytes exchanged with light clients.

pub mod commitment;
pub mod error;
