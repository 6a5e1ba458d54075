//! Implementation of a host chain mock. Used in testing the handlers of the channel upgrade
//! handshake, and in driving a handshake between two mock chains.

use std::collections::BTreeMap;

use core::time::Duration;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::ics02_client::client_def::{ClientDef, ClientRegistry};
use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics02_client::consensus_state::ConsensusState;
use crate::core::ics02_client::error::Error as ClientError;
use crate::core::ics03_connection::connection::ConnectionEnd;
use crate::core::ics03_connection::error::Error as ConnectionError;
use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::commitment::{
    compute_packet_commitment, CommittedValue, PacketCommitment,
};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::handler::{upgrade_dispatch, DispatchError, UpgradeOutcome};
use crate::core::ics04_channel::msgs::ChannelUpgradeMsg;
use crate::core::ics04_channel::packet::{Packet, Sequence};
use crate::core::ics04_channel::params::Params;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics23_commitment::commitment::{
    CommitmentPrefix, CommitmentProofBytes, CommitmentRoot,
};
use crate::core::ics24_host::identifier::{ChannelId, ClientId, ConnectionId, PortId};
use crate::core::ics24_host::path::{
    ChannelEndPath, ChannelUpgradeErrorPath, ChannelUpgradePath, CommitmentPath,
};
use crate::core::ics24_host::Path;
use crate::handler::HandlerOutput;
use crate::mock::client_def::{MockClient, MockStore};
use crate::prelude::*;
use crate::timestamp::Timestamp;
use crate::Height;

/// Block time of the mock host chain.
const BLOCK_INTERVAL: Duration = Duration::from_secs(5);

/// A context implementing the dependencies necessary for testing the channel upgrade
/// handshake handlers.
#[derive(Clone, Debug)]
pub struct MockContext {
    /// Height of the latest block of the host chain.
    host_height: Height,

    /// Block time of the latest block of the host chain.
    host_timestamp: Timestamp,

    /// Prefix under which this chain commits its store.
    prefix: CommitmentPrefix,

    params: Params,

    /// The light client implementations the host supports.
    clients: ClientRegistry,

    /// The counterparty states accepted by the clients of this chain.
    consensus_states: BTreeMap<(ClientId, Height), ConsensusState>,

    connections: BTreeMap<ConnectionId, ConnectionEnd>,

    channels: BTreeMap<(PortId, ChannelId), ChannelEnd>,

    upgrades: BTreeMap<(PortId, ChannelId), Upgrade>,

    counterparty_upgrades: BTreeMap<(PortId, ChannelId), Upgrade>,

    error_receipts: BTreeMap<(PortId, ChannelId), ErrorReceipt>,

    /// Tracks the sequence number for the next packet to be sent.
    next_sequence_send: BTreeMap<(PortId, ChannelId), Sequence>,

    packet_commitments: BTreeMap<(PortId, ChannelId, Sequence), PacketCommitment>,
}

/// Returns a MockContext with bare minimum initialization: no connections and no channels are
/// present, the chain has Height(0, 5) and only the mock light client is supported.
impl Default for MockContext {
    fn default() -> Self {
        Self::new(
            Height::new(0, 5).expect("non-zero height"),
            Timestamp::from_nanoseconds(1_700_000_000_000_000_000).expect("valid timestamp"),
        )
    }
}

/// Implementation of internal interface for use in testing. The methods in this interface should
/// _not_ be accessible to any handler.
impl MockContext {
    pub fn new(host_height: Height, host_timestamp: Timestamp) -> Self {
        Self {
            host_height,
            host_timestamp,
            prefix: CommitmentPrefix::try_from(b"ibc".to_vec()).expect("non-empty prefix"),
            params: Params::default(),
            clients: ClientRegistry::new().with_client(MockClient),
            consensus_states: BTreeMap::new(),
            connections: BTreeMap::new(),
            channels: BTreeMap::new(),
            upgrades: BTreeMap::new(),
            counterparty_upgrades: BTreeMap::new(),
            error_receipts: BTreeMap::new(),
            next_sequence_send: BTreeMap::new(),
            packet_commitments: BTreeMap::new(),
        }
    }

    /// Associates a connection to this context.
    pub fn with_connection(
        mut self,
        connection_id: ConnectionId,
        connection_end: ConnectionEnd,
    ) -> Self {
        self.connections.insert(connection_id, connection_end);
        self
    }

    /// Associates a channel, in an arbitrary state, to this context.
    pub fn with_channel(
        mut self,
        port_id: PortId,
        channel_id: ChannelId,
        channel_end: ChannelEnd,
    ) -> Self {
        self.channels.insert((port_id, channel_id), channel_end);
        self
    }

    pub fn with_upgrade(mut self, port_id: PortId, channel_id: ChannelId, upgrade: Upgrade) -> Self {
        self.upgrades.insert((port_id, channel_id), upgrade);
        self
    }

    pub fn with_counterparty_upgrade(
        mut self,
        port_id: PortId,
        channel_id: ChannelId,
        upgrade: Upgrade,
    ) -> Self {
        self.counterparty_upgrades
            .insert((port_id, channel_id), upgrade);
        self
    }

    pub fn with_error_receipt(
        mut self,
        port_id: PortId,
        channel_id: ChannelId,
        receipt: ErrorReceipt,
    ) -> Self {
        self.error_receipts.insert((port_id, channel_id), receipt);
        self
    }

    /// Records an in-flight packet with the given sequence on the channel.
    pub fn with_packet_commitment(
        mut self,
        port_id: PortId,
        channel_id: ChannelId,
        sequence: Sequence,
    ) -> Self {
        let packet = Packet {
            sequence,
            source_port: port_id.clone(),
            source_channel: channel_id.clone(),
            data: sequence.to_string().into_bytes(),
            ..Default::default()
        };
        self.packet_commitments.insert(
            (port_id, channel_id, sequence),
            compute_packet_commitment(&packet),
        );
        self
    }

    pub fn with_next_sequence_send(
        mut self,
        port_id: PortId,
        channel_id: ChannelId,
        sequence: Sequence,
    ) -> Self {
        self.next_sequence_send
            .insert((port_id, channel_id), sequence);
        self
    }

    pub fn with_consensus_state(
        mut self,
        client_id: ClientId,
        height: Height,
        consensus_state: ConsensusState,
    ) -> Self {
        self.consensus_states
            .insert((client_id, height), consensus_state);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Triggers the advancing of the host chain by one block.
    pub fn advance_host_chain_height(&mut self) {
        self.host_height = self.host_height.increment();
        self.host_timestamp = (self.host_timestamp + BLOCK_INTERVAL)
            .expect("mock host timestamp overflow");
    }

    /// The committed part of the store: channel ends, upgrades, error receipts and packet
    /// commitments, each keyed by its prefixed path.
    pub fn committed_store(&self) -> MockStore {
        fn digest(bytes: &[u8]) -> Vec<u8> {
            Sha256::digest(bytes).to_vec()
        }

        fn encode(value: &impl CommittedValue) -> Vec<u8> {
            value.encode_vec().expect("committed values encode to JSON")
        }

        let mut store = MockStore::new();
        let mut commit = |path: Path, bytes: Vec<u8>| {
            store.insert(self.prefix.apply(&path.to_string()), digest(&bytes));
        };

        for ((port_id, channel_id), channel_end) in &self.channels {
            commit(
                ChannelEndPath(port_id.clone(), channel_id.clone()).into(),
                encode(channel_end),
            );
        }
        for ((port_id, channel_id), upgrade) in &self.upgrades {
            commit(
                ChannelUpgradePath(port_id.clone(), channel_id.clone()).into(),
                encode(upgrade),
            );
        }
        for ((port_id, channel_id), receipt) in &self.error_receipts {
            commit(
                ChannelUpgradeErrorPath(port_id.clone(), channel_id.clone()).into(),
                encode(receipt),
            );
        }
        for ((port_id, channel_id, sequence), commitment) in &self.packet_commitments {
            let path = CommitmentPath {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
                sequence: *sequence,
            };
            commit(path.into(), commitment.as_bytes().to_vec());
        }

        store
    }

    fn encoded_store(&self) -> Vec<u8> {
        serde_json::to_vec(&self.committed_store()).expect("mock store encodes to JSON")
    }

    /// The root a light client of this chain checks proofs against.
    pub fn commitment_root(&self) -> CommitmentRoot {
        CommitmentRoot::from_bytes(&Sha256::digest(self.encoded_store()))
    }

    /// A proof of the current committed store, valid against `commitment_root`.
    pub fn commitment_proof(&self) -> CommitmentProofBytes {
        CommitmentProofBytes::try_from(self.encoded_store()).expect("a JSON object is never empty")
    }

    /// Has the client `client_id` accept the latest state of `counterparty`, as a relayer
    /// would by submitting a header. Returns the height proofs from `counterparty` should
    /// now be built for.
    pub fn update_client_from(&mut self, client_id: &ClientId, counterparty: &MockContext) -> Height {
        let height = counterparty.host_height();
        let consensus_state =
            ConsensusState::new(counterparty.commitment_root(), counterparty.host_timestamp());

        debug!("client {} accepted counterparty state at {}", client_id, height);
        self.consensus_states
            .insert((client_id.clone(), height), consensus_state);
        height
    }

    /// A datagram passes from the relayer to the upgrade handshake handlers (on host chain).
    /// A new block is created whether or not the message was accepted.
    pub fn deliver(
        &mut self,
        msg: &ChannelUpgradeMsg,
    ) -> Result<HandlerOutput<UpgradeOutcome>, DispatchError> {
        let res = upgrade_dispatch(self, msg);
        self.advance_host_chain_height();
        res
    }
}

impl ChannelReader for MockContext {
    fn channel_end(&self, port_channel_id: &(PortId, ChannelId)) -> Result<ChannelEnd, Error> {
        self.channels
            .get(port_channel_id)
            .cloned()
            .ok_or_else(|| {
                Error::channel_not_found(port_channel_id.0.clone(), port_channel_id.1.clone())
            })
    }

    fn connection_end(&self, connection_id: &ConnectionId) -> Result<ConnectionEnd, Error> {
        self.connections
            .get(connection_id)
            .cloned()
            .ok_or_else(|| {
                Error::ics03_connection(ConnectionError::connection_not_found(
                    connection_id.clone(),
                ))
            })
    }

    fn upgrade(&self, port_channel_id: &(PortId, ChannelId)) -> Option<Upgrade> {
        self.upgrades.get(port_channel_id).cloned()
    }

    fn counterparty_upgrade(&self, port_channel_id: &(PortId, ChannelId)) -> Option<Upgrade> {
        self.counterparty_upgrades.get(port_channel_id).cloned()
    }

    fn upgrade_error_receipt(&self, port_channel_id: &(PortId, ChannelId)) -> Option<ErrorReceipt> {
        self.error_receipts.get(port_channel_id).cloned()
    }

    fn get_next_sequence_send(
        &self,
        port_channel_id: &(PortId, ChannelId),
    ) -> Result<Sequence, Error> {
        self.next_sequence_send
            .get(port_channel_id)
            .copied()
            .ok_or_else(|| {
                Error::missing_next_send_seq(port_channel_id.0.clone(), port_channel_id.1.clone())
            })
    }

    fn packet_commitment_sequences(&self, port_channel_id: &(PortId, ChannelId)) -> Vec<Sequence> {
        self.packet_commitments
            .keys()
            .filter(|(port_id, channel_id, _)| {
                *port_id == port_channel_id.0 && *channel_id == port_channel_id.1
            })
            .map(|(_, _, sequence)| *sequence)
            .collect()
    }

    fn client_consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<ConsensusState, Error> {
        self.consensus_states
            .get(&(client_id.clone(), height))
            .cloned()
            .ok_or_else(|| {
                Error::ics02_client(ClientError::consensus_state_not_found(
                    client_id.clone(),
                    height,
                ))
            })
    }

    fn client_def(&self, client_type: ClientType) -> Result<&dyn ClientDef, Error> {
        self.clients.get(client_type).map_err(Error::ics02_client)
    }

    fn host_height(&self) -> Height {
        self.host_height
    }

    fn host_timestamp(&self) -> Timestamp {
        self.host_timestamp
    }

    fn channel_params(&self) -> Params {
        self.params.clone()
    }
}

impl ChannelKeeper for MockContext {
    fn store_channel(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        channel_end: &ChannelEnd,
    ) -> Result<(), Error> {
        self.channels.insert(port_channel_id, channel_end.clone());
        Ok(())
    }

    fn store_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        upgrade: &Upgrade,
    ) -> Result<(), Error> {
        self.upgrades.insert(port_channel_id, upgrade.clone());
        Ok(())
    }

    fn delete_upgrade(&mut self, port_channel_id: (PortId, ChannelId)) -> Result<(), Error> {
        self.upgrades.remove(&port_channel_id);
        Ok(())
    }

    fn store_counterparty_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        upgrade: &Upgrade,
    ) -> Result<(), Error> {
        self.counterparty_upgrades
            .insert(port_channel_id, upgrade.clone());
        Ok(())
    }

    fn delete_counterparty_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
    ) -> Result<(), Error> {
        self.counterparty_upgrades.remove(&port_channel_id);
        Ok(())
    }

    fn store_upgrade_error_receipt(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        receipt: &ErrorReceipt,
    ) -> Result<(), Error> {
        self.error_receipts.insert(port_channel_id, receipt.clone());
        Ok(())
    }

    fn delete_upgrade_error_receipt(
        &mut self,
        port_channel_id: (PortId, ChannelId),
    ) -> Result<(), Error> {
        self.error_receipts.remove(&port_channel_id);
        Ok(())
    }

    fn store_packet_commitment(
        &mut self,
        key: (PortId, ChannelId, Sequence),
        commitment: PacketCommitment,
    ) -> Result<(), Error> {
        self.packet_commitments.insert(key, commitment);
        Ok(())
    }

    fn delete_packet_commitment(
        &mut self,
        key: (PortId, ChannelId, Sequence),
    ) -> Result<(), Error> {
        self.packet_commitments.remove(&key);
        Ok(())
    }

    fn store_next_sequence_send(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        seq: Sequence,
    ) -> Result<(), Error> {
        self.next_sequence_send.insert(port_channel_id, seq);
        Ok(())
    }
}
