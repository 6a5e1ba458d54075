use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::ics04_channel::error::Error;
use crate::prelude::*;
use crate::timestamp::Timestamp;
use crate::Height;

/// Indicates a consensus height on the destination chain after which a packet (or an upgrade
/// proposal) will no longer be processed. The protocol encodes the absence of a timeout height
/// as the zero height, which we make explicit with `Never`.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum TimeoutHeight {
    #[default]
    Never,
    At(Height),
}

impl TimeoutHeight {
    pub fn no_timeout() -> Self {
        Self::Never
    }

    /// Revision number to be used in packet commitment computation
    pub fn commitment_revision_number(&self) -> u64 {
        match self {
            Self::At(height) => height.revision_number(),
            Self::Never => 0,
        }
    }

    /// Revision height to be used in packet commitment computation
    pub fn commitment_revision_height(&self) -> u64 {
        match self {
            Self::At(height) => height.revision_height(),
            Self::Never => 0,
        }
    }

    /// Check if a height is *stricly past* the timeout height, and thus is
    /// deemed expired.
    pub fn has_expired(&self, height: Height) -> bool {
        match self {
            Self::At(timeout_height) => height > *timeout_height,
            // When there's no timeout, heights are never expired
            Self::Never => false,
        }
    }

    /// Check if a height is *at or past* the timeout height.
    pub fn has_been_reached(&self, height: Height) -> bool {
        match self {
            Self::At(timeout_height) => height >= *timeout_height,
            Self::Never => false,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl From<Height> for TimeoutHeight {
    fn from(height: Height) -> Self {
        Self::At(height)
    }
}

impl Display for TimeoutHeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            TimeoutHeight::At(timeout_height) => write!(f, "{timeout_height}"),
            TimeoutHeight::Never => write!(f, "no timeout"),
        }
    }
}

impl Serialize for TimeoutHeight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Flatten to Height { revision_number: 0, revision_height: 0 } when timeout height is not set.
        #[derive(Serialize)]
        struct Height {
            revision_number: u64,
            revision_height: u64,
        }

        match self {
            TimeoutHeight::Never => {
                let zero = Height {
                    revision_number: 0,
                    revision_height: 0,
                };

                zero.serialize(serializer)
            }
            TimeoutHeight::At(height) => height.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TimeoutHeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use crate::core::ics02_client::height::Height as Ics02Height;

        // Here we use a bespoke struct to avoid Height's validation of non-zero revision height.
        #[derive(Deserialize)]
        struct Height {
            revision_number: u64,
            revision_height: u64,
        }

        Height::deserialize(deserializer).map(|height| {
            Ics02Height::new(height.revision_number, height.revision_height)
                .map(TimeoutHeight::At)
                .unwrap_or(TimeoutHeight::Never)
        })
    }
}

/// The deadline of an upgrade proposal, by counterparty height, counterparty time, or both.
/// At least one of the two must be set.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTimeout {
    pub height: TimeoutHeight,
    pub timestamp: Timestamp,
}

impl UpgradeTimeout {
    pub fn new(height: TimeoutHeight, timestamp: Timestamp) -> Result<Self, Error> {
        let timeout = Self { height, timestamp };
        timeout.validate_basic()?;
        Ok(timeout)
    }

    pub fn at_height(height: Height) -> Self {
        Self {
            height: TimeoutHeight::At(height),
            timestamp: Timestamp::none(),
        }
    }

    pub fn at_timestamp(timestamp: Timestamp) -> Self {
        Self {
            height: TimeoutHeight::Never,
            timestamp,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.height.is_set() || self.timestamp.is_set()
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::invalid_upgrade_timeout())
        }
    }

    /// Whether the deadline is reached at the given height or time of the chain the
    /// timeout refers to. Either component being reached is enough.
    pub fn has_elapsed(&self, height: Height, timestamp: Timestamp) -> bool {
        self.height.has_been_reached(height) || timestamp.reached(&self.timestamp)
    }
}

impl Display for UpgradeTimeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "UpgradeTimeout {{ height: {}, timestamp: {} }}",
            self.height, self.timestamp
        )
    }
}
