use core::str::FromStr;

use derive_more::{AsRef, Display};
use flex_error::define_error;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    SignerError {
        EmptySigner
            | _ | { "signer cannot be empty" },
    }
}

/// The account submitting a message. Its meaning is up to the host; the channel upgrade
/// handshake only compares it against the configured upgrade authority.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRef,
)]
pub struct Signer(String);

impl Signer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signer {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_string();
        if s.trim().is_empty() {
            Err(SignerError::empty_signer())
        } else {
            Ok(Self(s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn blank_signer_is_rejected() {
        assert!(Signer::from_str("").is_err());
        assert!(Signer::from_str("   ").is_err());

        let signer = Signer::from_str("cosmos1upgradeauthority").unwrap();
        assert_eq!(signer.as_str(), "cosmos1upgradeauthority");
    }
}
