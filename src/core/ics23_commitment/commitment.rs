use core::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ics23_commitment::error::CommitmentError;
use crate::prelude::*;
use crate::utils::pretty::PrettySlice;

/// The root of the counterparty's committed store at some height.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentRoot {
    bytes: Vec<u8>,
}

impl fmt::Debug for CommitmentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentRoot({})", PrettySlice(&self.bytes))
    }
}

impl CommitmentRoot {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Vec::from(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for CommitmentRoot {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Opaque proof bytes, interpreted only by the light client that verifies them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentProofBytes {
    bytes: Vec<u8>,
}

impl fmt::Debug for CommitmentProofBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentProof({})", PrettySlice(&self.bytes))
    }
}

impl CommitmentProofBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<Vec<u8>> for CommitmentProofBytes {
    type Error = CommitmentError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            Err(Self::Error::empty_commitment_proof())
        } else {
            Ok(Self { bytes })
        }
    }
}

impl From<CommitmentProofBytes> for Vec<u8> {
    fn from(p: CommitmentProofBytes) -> Vec<u8> {
        p.bytes
    }
}

/// The store prefix under which the counterparty commits its IBC paths.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentPrefix {
    bytes: Vec<u8>,
}

impl CommitmentPrefix {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Joins the prefix and an ICS24 path into the key the counterparty store uses.
    pub fn apply(&self, path: &str) -> String {
        let prefix = String::from_utf8_lossy(&self.bytes);
        format!("{prefix}/{path}")
    }
}

impl TryFrom<Vec<u8>> for CommitmentPrefix {
    type Error = CommitmentError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            Err(Self::Error::empty_commitment_prefix())
        } else {
            Ok(Self { bytes })
        }
    }
}

impl fmt::Debug for CommitmentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let converted = core::str::from_utf8(self.as_bytes());
        match converted {
            Ok(s) => write!(f, "{s}"),
            Err(_e) => write!(f, "{:?}", self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_proofs_and_prefixes_are_rejected() {
        assert!(CommitmentProofBytes::try_from(Vec::new()).is_err());
        assert!(CommitmentPrefix::try_from(Vec::new()).is_err());

        let prefix = CommitmentPrefix::try_from(b"ibc".to_vec()).unwrap();
        assert_eq!(prefix.apply("channelEnds/ports/transfer/channels/channel-0"),
            "ibc/channelEnds/ports/transfer/channels/channel-0");
        assert_eq!(format!("{prefix:?}"), "ibc");
    }
}
