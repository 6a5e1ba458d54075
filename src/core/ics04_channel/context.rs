//! ICS4 (channel) context. The two traits `ChannelReader` and `ChannelKeeper` define
//! the interface that any host chain must implement to be able to process the channel
//! upgrade handshake.

use crate::core::ics02_client::client_def::ClientDef;
use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics02_client::consensus_state::ConsensusState;
use crate::core::ics03_connection::connection::ConnectionEnd;
use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::commitment::PacketCommitment;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::params::Params;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics24_host::identifier::{ChannelId, ClientId, ConnectionId, PortId};
use crate::prelude::*;
use crate::signer::Signer;
use crate::timestamp::Timestamp;
use crate::Height;

/// A context supplying all the necessary read-only dependencies for processing any
/// channel upgrade message.
pub trait ChannelReader {
    /// Returns the ChannelEnd for the given `port_id` and `chan_id`.
    fn channel_end(&self, port_channel_id: &(PortId, ChannelId)) -> Result<ChannelEnd, Error>;

    /// Returns the ConnectionState for the given identifier `connection_id`.
    fn connection_end(&self, connection_id: &ConnectionId) -> Result<ConnectionEnd, Error>;

    /// Returns the upgrade this end proposed or accepted, if a handshake is in progress.
    fn upgrade(&self, port_channel_id: &(PortId, ChannelId)) -> Option<Upgrade>;

    /// Returns the counterparty upgrade cached while this end finishes flushing.
    fn counterparty_upgrade(&self, port_channel_id: &(PortId, ChannelId)) -> Option<Upgrade>;

    /// Returns the receipt of the last aborted upgrade attempt, if any.
    fn upgrade_error_receipt(&self, port_channel_id: &(PortId, ChannelId)) -> Option<ErrorReceipt>;

    fn get_next_sequence_send(
        &self,
        port_channel_id: &(PortId, ChannelId),
    ) -> Result<Sequence, Error>;

    /// Sequences of the packets sent on this channel that are neither acknowledged
    /// nor timed out.
    fn packet_commitment_sequences(&self, port_channel_id: &(PortId, ChannelId)) -> Vec<Sequence>;

    /// Returns the ConsensusState the given client recorded at `height`. Necessary
    /// dependency towards proof verification.
    fn client_consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<ConsensusState, Error>;

    /// Returns the light client implementation for the given client type.
    fn client_def(&self, client_type: ClientType) -> Result<&dyn ClientDef, Error>;

    /// Returns the current height of the local chain.
    fn host_height(&self) -> Height;

    /// Returns the current timestamp of the local chain.
    fn host_timestamp(&self) -> Timestamp;

    fn channel_params(&self) -> Params;

    /// Whether `signer` may cancel an upgrade without proving a counterparty error receipt.
    fn is_authorized_upgrader(&self, signer: &Signer) -> bool {
        self.channel_params().is_authority(signer)
    }
}

/// A context supplying all the necessary write-only dependencies (i.e., storage writing facility)
/// for processing any channel upgrade message.
pub trait ChannelKeeper {
    /// Stores the given channel_end at a path associated with the port_id and channel_id.
    fn store_channel(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        channel_end: &ChannelEnd,
    ) -> Result<(), Error>;

    fn store_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        upgrade: &Upgrade,
    ) -> Result<(), Error>;

    fn delete_upgrade(&mut self, port_channel_id: (PortId, ChannelId)) -> Result<(), Error>;

    fn store_counterparty_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        upgrade: &Upgrade,
    ) -> Result<(), Error>;

    fn delete_counterparty_upgrade(
        &mut self,
        port_channel_id: (PortId, ChannelId),
    ) -> Result<(), Error>;

    fn store_upgrade_error_receipt(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        receipt: &ErrorReceipt,
    ) -> Result<(), Error>;

    fn delete_upgrade_error_receipt(
        &mut self,
        port_channel_id: (PortId, ChannelId),
    ) -> Result<(), Error>;

    fn store_packet_commitment(
        &mut self,
        key: (PortId, ChannelId, Sequence),
        commitment: PacketCommitment,
    ) -> Result<(), Error>;

    fn delete_packet_commitment(&mut self, key: (PortId, ChannelId, Sequence))
        -> Result<(), Error>;

    fn store_next_sequence_send(
        &mut self,
        port_channel_id: (PortId, ChannelId),
        seq: Sequence,
    ) -> Result<(), Error>;

    /// Removes both upgrade proposals of a handshake attempt.
    fn delete_upgrade_info(&mut self, port_channel_id: (PortId, ChannelId)) -> Result<(), Error> {
        self.delete_upgrade(port_channel_id.clone())?;
        self.delete_counterparty_upgrade(port_channel_id)
    }
}
