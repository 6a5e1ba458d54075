use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt::{Debug, Formatter};

use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics02_client::consensus_state::ConsensusState;
use crate::core::ics02_client::error::Error;
use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::commitment::CommittedValue;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics23_commitment::commitment::{
    CommitmentPrefix, CommitmentProofBytes, CommitmentRoot,
};
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::core::ics24_host::path::{ChannelEndPath, ChannelUpgradeErrorPath, ChannelUpgradePath};
use crate::core::ics24_host::Path;
use crate::prelude::*;
use crate::timestamp::Timestamp;

/// The proof verification capability of a light client. A client checks that a value is
/// (or is not) committed under a path of the counterparty store, against the commitment
/// root of a consensus state it has already accepted.
///
/// Implementations are selected through the [`ClientType`] encoded in a client identifier.
/// Any resource a client needs (a VM to run contract-based clients, for instance) is given
/// to it at construction and held by the instance.
pub trait ClientDef {
    fn client_type(&self) -> ClientType;

    /// Verify a `proof` that `value` is committed under `path`.
    fn verify_membership(
        &self,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        root: &CommitmentRoot,
        path: Path,
        value: Vec<u8>,
    ) -> Result<(), Error>;

    /// Verify a `proof` that nothing is committed under `path`.
    fn verify_non_membership(
        &self,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        root: &CommitmentRoot,
        path: Path,
    ) -> Result<(), Error>;

    /// The block time of the counterparty at the height `consensus_state` was recorded for.
    fn timestamp_at_height(&self, consensus_state: &ConsensusState) -> Result<Timestamp, Error> {
        consensus_state.timestamp()
    }

    /// Verify a `proof` that a channel state matches that of the input `channel_end`.
    fn verify_channel_state(
        &self,
        consensus_state: &ConsensusState,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        port_id: &PortId,
        channel_id: &ChannelId,
        expected_channel_end: &ChannelEnd,
    ) -> Result<(), Error> {
        let path = ChannelEndPath(port_id.clone(), channel_id.clone());
        let value = encode_committed_value(expected_channel_end)?;
        self.verify_membership(prefix, proof, consensus_state.root(), path.into(), value)
    }

    /// Verify a `proof` that the counterparty stores `expected_upgrade` as its upgrade.
    fn verify_channel_upgrade(
        &self,
        consensus_state: &ConsensusState,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        port_id: &PortId,
        channel_id: &ChannelId,
        expected_upgrade: &Upgrade,
    ) -> Result<(), Error> {
        let path = ChannelUpgradePath(port_id.clone(), channel_id.clone());
        let value = encode_committed_value(expected_upgrade)?;
        self.verify_membership(prefix, proof, consensus_state.root(), path.into(), value)
    }

    /// Verify a `proof` that the counterparty wrote `expected_error_receipt`.
    fn verify_channel_upgrade_error(
        &self,
        consensus_state: &ConsensusState,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        port_id: &PortId,
        channel_id: &ChannelId,
        expected_error_receipt: &ErrorReceipt,
    ) -> Result<(), Error> {
        let path = ChannelUpgradeErrorPath(port_id.clone(), channel_id.clone());
        let value = encode_committed_value(expected_error_receipt)?;
        self.verify_membership(prefix, proof, consensus_state.root(), path.into(), value)
    }

    /// Verify a `proof` that the counterparty holds no error receipt.
    fn verify_channel_upgrade_error_absence(
        &self,
        consensus_state: &ConsensusState,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<(), Error> {
        let path = ChannelUpgradeErrorPath(port_id.clone(), channel_id.clone());
        self.verify_non_membership(prefix, proof, consensus_state.root(), path.into())
    }
}

fn encode_committed_value(value: &impl CommittedValue) -> Result<Vec<u8>, Error> {
    value
        .encode_vec()
        .map_err(|e| Error::encode_committed_value(e.to_string()))
}

/// The light client implementations a host supports, built once when the host starts.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientType, Arc<dyn ClientDef + Send + Sync>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: impl ClientDef + Send + Sync + 'static) -> Self {
        self.register(client);
        self
    }

    /// Registers `client` under its own client type, replacing any previous implementation.
    pub fn register(&mut self, client: impl ClientDef + Send + Sync + 'static) {
        self.clients.insert(client.client_type(), Arc::new(client));
    }

    pub fn get(&self, client_type: ClientType) -> Result<&dyn ClientDef, Error> {
        match self.clients.get(&client_type) {
            Some(client) => {
                let client: &dyn ClientDef = client.as_ref();
                Ok(client)
            }
            None => Err(Error::client_implementation_not_found(client_type)),
        }
    }
}

impl Debug for ClientRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.clients.keys()).finish()
    }
}
