use serde_derive::{Deserialize, Serialize};

use crate::core::ics02_client::error::Error;
use crate::core::ics23_commitment::commitment::CommitmentRoot;
use crate::timestamp::Timestamp;

/// The counterparty state a light client has accepted at some height: the commitment root
/// that membership proofs are checked against and the block time of that height.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConsensusState {
    pub root: CommitmentRoot,
    pub timestamp: Timestamp,
}

impl ConsensusState {
    pub fn new(root: CommitmentRoot, timestamp: Timestamp) -> Self {
        Self { root, timestamp }
    }

    pub fn root(&self) -> &CommitmentRoot {
        &self.root
    }

    /// The block time of the height this state was recorded for.
    pub fn timestamp(&self) -> Result<Timestamp, Error> {
        if self.timestamp.is_set() {
            Ok(self.timestamp)
        } else {
            Err(Error::missing_consensus_timestamp())
        }
    }
}
