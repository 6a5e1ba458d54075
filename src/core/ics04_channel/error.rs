use core::fmt::{Display, Error as FmtError, Formatter};

use flex_error::define_error;

use crate::core::ics02_client::error as client_error;
use crate::core::ics03_connection::error as connection_error;
use crate::core::ics04_channel::channel::State;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
use crate::prelude::*;
use crate::timestamp::{Timestamp, TimestampOverflowError};
use crate::Height;

/// Message written into every error receipt. The code is the only part of the
/// underlying error that is persisted.
pub const RESTORE_ERROR_MESSAGE: &str = "restored channel to pre-upgrade state";

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    Error {
        Ics03Connection
            [ connection_error::Error ]
            | _ | { "ics03 connection error" },

        Ics02Client
            [ client_error::Error ]
            | _ | { "ics02 client error" },

        UnknownState
            { state: i32 }
            | e | { format_args!("channel state unknown: {}", e.state) },

        UnknownOrderType
            { type_id: String }
            | e | { format_args!("channel order type unknown: {}", e.type_id) },

        InvalidOrdering
            | _ | { "the channel ordering must be either ORDERED or UNORDERED" },

        InvalidConnectionHopsLength
            { expected: usize, actual: usize }
            | e | {
                format_args!(
                    "invalid connection hops length: expected {0}; actual {1}",
                    e.expected, e.actual)
            },

        EmptyVersion
            | _ | { "the channel version cannot be empty" },

        InvalidPacketCounterparty
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "packet destination port {} and channel {} doesn't match the counterparty's port/channel",
                    e.port_id, e.channel_id)
            },

        ZeroPacketSequence
            | _ | { "packet sequence cannot be 0" },

        ZeroPacketData
            | _ | { "packet data bytes cannot be empty" },

        MissingPacketTimeout
            | _ | { "packet timeout height and packet timeout timestamp cannot both be 0" },

        InvalidPacketSequence
            {
                given_sequence: Sequence,
                next_sequence: Sequence
            }
            | e | {
                format_args!(
                    "invalid packet sequence {0} ≠ next send sequence {1}",
                    e.given_sequence, e.next_sequence)
            },

        MissingCounterparty
            | _ | { "missing counterparty" },

        InvalidVersionLengthConnection
            | _ | { "single version must be negociated on connection before opening channel" },

        ChannelFeatureNotSupportedByConnection
            | _ | { "the channel ordering is not supported by connection" },

        ChannelNotFound
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "the channel end ({0}, {1}) does not exist",
                    e.port_id, e.channel_id)
            },

        ConnectionNotOpen
            { connection_id: ConnectionId }
            | e | {
                format_args!(
                    "the associated connection {0} is not OPEN",
                    e.connection_id)
            },

        UndefinedConnectionCounterparty
            { connection_id: ConnectionId }
            | e | {
                format_args!(
                    "Channel opening error: the connection {0} has no counterparty connection id",
                    e.connection_id)
            },

        MissingNextSendSeq
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "Missing sequence number for sending packets on port {0} and channel {1}",
                    e.port_id, e.channel_id)
            },

        InvalidChannelState
            { channel_id: ChannelId, state: State }
            | e | {
                format_args!(
                    "channel {0} is in state {1}, which does not allow this step of the upgrade handshake",
                    e.channel_id, e.state)
            },

        InvalidCounterpartyChannelState
            { state: State }
            | e | {
                format_args!(
                    "the counterparty channel is in state {0}, which does not allow this step of the upgrade handshake",
                    e.state)
            },

        VerifyChannelFailed
            [ client_error::Error ]
            | _ | { "failed to verify the counterparty channel end" },

        VerifyUpgradeFailed
            [ client_error::Error ]
            | _ | { "failed to verify the counterparty upgrade" },

        VerifyErrorReceiptFailed
            [ client_error::Error ]
            | _ | { "failed to verify the counterparty upgrade error receipt" },

        VerifyErrorReceiptAbsenceFailed
            [ client_error::Error ]
            | _ | { "failed to verify the absence of an upgrade error receipt on the counterparty" },

        UpgradeFieldsUnchanged
            | _ | { "the proposed upgrade fields are identical to the current channel fields" },

        IncompatibleCounterpartyUpgrade
            { reason: String }
            | e | {
                format_args!(
                    "incompatible counterparty upgrade: {0}",
                    e.reason)
            },

        InvalidUpgradeSequence
            {
                sequence: Sequence,
                counterparty_sequence: Sequence,
            }
            | e | {
                format_args!(
                    "upgrade sequence mismatch: local sequence {0}, counterparty sequence {1}",
                    e.sequence, e.counterparty_sequence)
            },

        UpgradeNotFound
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "no upgrade exists for channel ({0}, {1})",
                    e.port_id, e.channel_id)
            },

        CounterpartyUpgradeNotFound
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "no counterparty upgrade is cached for channel ({0}, {1})",
                    e.port_id, e.channel_id)
            },

        UpgradeErrorReceiptNotFound
            { port_id: PortId, channel_id: ChannelId }
            | e | {
                format_args!(
                    "no upgrade error receipt exists for channel ({0}, {1})",
                    e.port_id, e.channel_id)
            },

        InvalidUpgradeTimeout
            | _ | { "an upgrade timeout must specify a height or a timestamp" },

        UpgradeTimeoutElapsed
            { timeout: UpgradeTimeout }
            | e | {
                format_args!(
                    "the counterparty upgrade timeout has already elapsed: {0}",
                    e.timeout)
            },

        UpgradeTimeoutNotReached
            {
                proof_height: Height,
                proof_timestamp: Timestamp,
            }
            | e | {
                format_args!(
                    "the upgrade timeout has not been reached at proof height {0} ({1})",
                    e.proof_height, e.proof_timestamp)
            },

        MissingUpgradeErrorReceiptProof
            | _ | { "a proof of the counterparty error receipt is required to cancel this upgrade" },

        TimestampOverflow
            [ TimestampOverflowError ]
            | _ | { "timestamp overflow" },

        InvalidParams
            { reason: String }
            | e | { format_args!("invalid channel params: {0}", e.reason) },

        AppModule
            { description: String }
            | e | {
                format_args!(
                    "application module error: {0}",
                    e.description)
            },
    }
}

impl Error {
    /// A stable code for the error kind. It ends up in the error receipt, which
    /// must not depend on the error message or its trace.
    pub fn code(&self) -> u32 {
        match self.detail() {
            ErrorDetail::InvalidUpgradeSequence(_) => 2,
            ErrorDetail::IncompatibleCounterpartyUpgrade(_) => 3,
            ErrorDetail::UpgradeTimeoutElapsed(_) => 4,
            ErrorDetail::AppModule(_) => 5,
            _ => 1,
        }
    }
}

/// An error that ends the current upgrade attempt. It carries the upgrade sequence
/// the error receipt must be written for.
#[derive(Debug)]
pub struct UpgradeError {
    sequence: Sequence,
    cause: Error,
}

impl UpgradeError {
    pub fn new(sequence: Sequence, cause: Error) -> Self {
        Self { sequence, cause }
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }

    /// The receipt written when the attempt is aborted.
    pub fn error_receipt(&self) -> ErrorReceipt {
        ErrorReceipt::new(
            self.sequence,
            format!(
                "upgrade error code: {}: {}",
                self.cause.code(),
                RESTORE_ERROR_MESSAGE
            ),
        )
    }
}

impl Display for UpgradeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "upgrade attempt {} aborted: {}",
            self.sequence, self.cause
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UpgradeError {}

/// Failure of a handshake step: either the message is rejected and nothing changes, or
/// the attempt itself cannot proceed and must be aborted.
#[derive(Debug)]
pub enum UpgradeHandlerError {
    Channel(Error),
    Upgrade(UpgradeError),
}

impl From<Error> for UpgradeHandlerError {
    fn from(e: Error) -> Self {
        Self::Channel(e)
    }
}

impl From<UpgradeError> for UpgradeHandlerError {
    fn from(e: UpgradeError) -> Self {
        Self::Upgrade(e)
    }
}

impl Display for UpgradeHandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Channel(e) => write!(f, "{e}"),
            Self::Upgrade(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UpgradeHandlerError {}

// The store no longer holds what an earlier step established. Processing of the
// message must stop; the host state is inconsistent.
define_error! {
    #[derive(Debug, PartialEq, Eq)]
    FatalError {
        InvariantViolated
            { port_id: PortId, channel_id: ChannelId }
            [ Error ]
            | e | {
                format_args!(
                    "state required by channel ({0}, {1}) is missing",
                    e.port_id, e.channel_id)
            },

        Store
            [ Error ]
            | _ | { "failed to persist the channel upgrade state" },
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::{Error, UpgradeError};
    use crate::core::ics04_channel::packet::Sequence;
    use crate::prelude::*;

    #[test]
    fn error_receipt_only_keeps_the_code() {
        let err = UpgradeError::new(
            Sequence::from(3),
            Error::incompatible_counterparty_upgrade("version mismatch".to_string()),
        );
        let receipt = err.error_receipt();

        assert_eq!(receipt.sequence, Sequence::from(3));
        assert_eq!(
            receipt.message,
            "upgrade error code: 3: restored channel to pre-upgrade state"
        );
        assert!(!receipt.message.contains("version mismatch"));
    }
}
