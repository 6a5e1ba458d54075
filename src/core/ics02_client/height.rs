use core::cmp::Ordering;
use core::num::ParseIntError;
use core::str::FromStr;

use flex_error::{define_error, TraceError};
use serde_derive::{Deserialize, Serialize};

use crate::core::ics02_client::error::Error;
use crate::prelude::*;

/// A block height on a chain that may undergo revision upgrades. Heights compare
/// lexicographically: first by revision number, then by height within the revision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Height {
    /// Previously known as "epoch"
    revision_number: u64,

    /// The height of a block
    revision_height: u64,
}

impl Height {
    pub fn new(revision_number: u64, revision_height: u64) -> Result<Self, Error> {
        if revision_height == 0 {
            return Err(Error::invalid_height());
        }

        Ok(Self {
            revision_number,
            revision_height,
        })
    }

    pub fn revision_number(&self) -> u64 {
        self.revision_number
    }

    pub fn revision_height(&self) -> u64 {
        self.revision_height
    }

    pub fn add(&self, delta: u64) -> Height {
        Height {
            revision_number: self.revision_number,
            revision_height: self.revision_height.saturating_add(delta),
        }
    }

    pub fn increment(&self) -> Height {
        self.add(1)
    }
}

impl PartialOrd for Height {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Height {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.revision_number < other.revision_number {
            Ordering::Less
        } else if self.revision_number > other.revision_number {
            Ordering::Greater
        } else if self.revision_height < other.revision_height {
            Ordering::Less
        } else if self.revision_height > other.revision_height {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl core::fmt::Display for Height {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    HeightError {
        HeightConversion
            { height: String }
            [ TraceError<ParseIntError> ]
            | e | {
                format_args!("cannot convert into a `Height` type from string {0}",
                    e.height)
            },

        ZeroHeight
            |_| { "attempted to parse an invalid zero height" },

        InvalidFormat
            { raw_height: String }
            | e | {
                format_args!("height {0} is not of the form `revision_number-revision_height`",
                    e.raw_height)
            },
    }
}

impl TryFrom<&str> for Height {
    type Error = HeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (rev_number_str, rev_height_str) = value
            .split_once('-')
            .ok_or_else(|| HeightError::invalid_format(value.to_owned()))?;

        let revision_number = rev_number_str
            .parse::<u64>()
            .map_err(|e| HeightError::height_conversion(value.to_owned(), e))?;
        let revision_height = rev_height_str
            .parse::<u64>()
            .map_err(|e| HeightError::height_conversion(value.to_owned(), e))?;

        Height::new(revision_number, revision_height).map_err(|_| HeightError::zero_height())
    }
}

impl FromStr for Height {
    type Err = HeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Height::try_from(s)
    }
}
