#![no_std]
#![allow(clippy::large_enum_variant)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

//! This library implements the channel upgrade handshake of the InterBlockchain Communication
//! (IBC) protocol. An upgrade lets the two ends of an already open channel renegotiate their
//! ordering, version and underlying connection in place, without closing the channel and
//! without losing any packet that was in flight when the negotiation started.
//!
//! The layout of this crate mirrors the classification of the [Interchain
//! Standards][ics-standards]. Only the [Core][core] pieces the handshake depends on are present:
//! identifiers and store paths (ICS 24), heights and the light client verification capability
//! (ICS 02), connection ends (ICS 03), commitments (ICS 23) and the channel itself (ICS 04).
//!
//! Each handshake step is processed in two phases. A read-only `process` function validates
//! the message against the host state and the counterparty proofs, and a `write_*` function
//! commits the result. [`upgrade_dispatch`] drives both phases and turns an upgrade error into
//! an abort, which restores the channel and writes an error receipt for the counterparty.
//!
//! [core]: crate::core
//! [ics-standards]: https://github.com/cosmos/ibc#interchain-standards
//! [`upgrade_dispatch`]: crate::core::ics04_channel::handler::upgrade_dispatch

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod prelude;

pub mod core;
pub mod events;
pub mod handler;
pub mod signer;
pub mod timestamp;
pub mod utils;

/// Re-export of ICS 002 Height domain type
pub type Height = crate::core::ics02_client::height::Height;

#[cfg(any(test, feature = "mocks"))]
pub mod test_utils;

#[cfg(any(test, feature = "mocks"))]
pub mod mock; // Context mock and mock light client: for testing all handlers.
