use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::prelude::*;
use crate::timestamp::Timestamp;
use crate::Height;

/// An upgrade proposal held by one channel end for the duration of a handshake attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    pub fields: UpgradeFields,
    // timeout can be empty until flushing starts
    pub timeout: Option<UpgradeTimeout>,
    pub latest_sequence_send: Sequence,
}

impl Upgrade {
    pub fn new(
        fields: UpgradeFields,
        timeout: Option<UpgradeTimeout>,
        latest_sequence_send: Sequence,
    ) -> Self {
        Self {
            fields,
            timeout,
            latest_sequence_send,
        }
    }

    /// Whether the proposal's deadline is behind the given height and time.
    /// A proposal without a deadline counts as expired.
    pub fn timeout_passed(&self, height: Height, timestamp: Timestamp) -> bool {
        match &self.timeout {
            Some(timeout) => timeout.has_elapsed(height, timestamp),
            None => true,
        }
    }
}

impl Display for Upgrade {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match &self.timeout {
            Some(timeout) => write!(
                f,
                "Upgrade {{ fields: {}, timeout: {}, latest_sequence_send: {} }}",
                self.fields, timeout, self.latest_sequence_send
            ),
            None => write!(
                f,
                "Upgrade {{ fields: {}, timeout: none, latest_sequence_send: {} }}",
                self.fields, self.latest_sequence_send
            ),
        }
    }
}

/// A persisted record that the upgrade attempt with the given sequence was aborted.
/// The message is deterministic so that every implementation writes the same receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReceipt {
    pub sequence: Sequence,
    pub message: String,
}

impl ErrorReceipt {
    pub fn new(sequence: Sequence, message: String) -> Self {
        Self { sequence, message }
    }
}

impl Display for ErrorReceipt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "ErrorReceipt {{ sequence: {}, message: {} }}",
            self.sequence, self.message
        )
    }
}
