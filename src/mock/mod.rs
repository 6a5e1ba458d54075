//! Implementation of mocks for host chains and light clients, for use in tests.

pub mod client_def;
pub mod context;
