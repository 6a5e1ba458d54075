use core::str::FromStr;
use core::time::Duration;

use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics03_connection::connection::{
    ConnectionEnd, Counterparty as ConnectionCounterparty, State as ConnectionState,
};
use crate::core::ics03_connection::version::Version as ConnectionVersion;
use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, Ordering, State};
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics04_channel::version::Version;
use crate::core::ics23_commitment::commitment::{CommitmentPrefix, CommitmentProofBytes};
use crate::core::ics24_host::identifier::{ChannelId, ClientId, ConnectionId, PortId};
use crate::mock::context::MockContext;
use crate::prelude::*;
use crate::signer::Signer;
use crate::Height;

pub fn get_dummy_bech32_account() -> String {
    "cosmos1wxeyh7zgn4tctjzs0vtqpc6p5cxq5t2muzl7ng".to_string()
}

pub fn dummy_signer() -> Signer {
    Signer::from_str(&get_dummy_bech32_account()).unwrap()
}

/// Returns a dummy proof, for use in tests only.
pub fn get_dummy_proof() -> CommitmentProofBytes {
    CommitmentProofBytes::try_from(b"Y29uc2Vuc3VzU3RhdGUvaWJjb25lY2xpZW50LzIy".to_vec()).unwrap()
}

pub fn dummy_proof_height() -> Height {
    Height::new(0, 10).unwrap()
}

fn dummy_prefix() -> CommitmentPrefix {
    CommitmentPrefix::try_from(b"ibc".to_vec()).unwrap()
}

fn mock_client_id(index: u64) -> ClientId {
    ClientId::new(ClientType::Mock, index).unwrap()
}

/// A connection end verified by the mock client `client_index`, whose counterparty end is
/// verified by the mock client `client_index ^ 1`. Supports both channel orderings.
pub fn dummy_connection_end(
    state: ConnectionState,
    client_index: u64,
    counterparty_connection: Option<ConnectionId>,
) -> ConnectionEnd {
    dummy_connection_end_with_versions(
        state,
        client_index,
        counterparty_connection,
        vec![ConnectionVersion::default()],
    )
}

pub fn dummy_connection_end_with_versions(
    state: ConnectionState,
    client_index: u64,
    counterparty_connection: Option<ConnectionId>,
    versions: Vec<ConnectionVersion>,
) -> ConnectionEnd {
    ConnectionEnd::new(
        state,
        mock_client_id(client_index),
        ConnectionCounterparty::new(
            mock_client_id(client_index ^ 1),
            counterparty_connection,
            dummy_prefix(),
        ),
        versions,
        Duration::ZERO,
    )
}

/// An unordered `transfer` channel over `connection-0`, facing `channel-1`.
pub fn dummy_channel_end(state: State, upgrade_sequence: Sequence) -> ChannelEnd {
    ChannelEnd::new(
        state,
        Ordering::Unordered,
        Counterparty::new(PortId::transfer(), Some(ChannelId::new(1))),
        vec![ConnectionId::new(0)],
        Version::new("ics20-1".to_string()),
        upgrade_sequence,
    )
}

pub fn get_dummy_upgrade_fields(connection_id: ConnectionId) -> UpgradeFields {
    UpgradeFields::new(
        Ordering::Ordered,
        vec![connection_id],
        Version::new("ics20-2".to_string()),
    )
}

pub fn dummy_upgrade() -> Upgrade {
    Upgrade::new(
        get_dummy_upgrade_fields(ConnectionId::new(2)),
        None,
        Sequence::from(0),
    )
}

/// Two mock chains, A and B, sharing an unordered ICS20 channel over the connection pair
/// `connection-0`/`connection-1`. A second connection pair, `connection-2`/`connection-3`, is
/// open for upgrades to move the channel onto.
///
/// The client on A tracking B is `9999-mock-0`, the client on B tracking A is `9999-mock-1`.
#[derive(Clone, Debug, Default)]
pub struct Fixture;

impl Fixture {
    pub fn new() -> Self {
        Self
    }

    pub fn port_id(&self) -> PortId {
        PortId::transfer()
    }

    pub fn channel_a(&self) -> ChannelId {
        ChannelId::new(0)
    }

    pub fn channel_b(&self) -> ChannelId {
        ChannelId::new(1)
    }

    pub fn connection_a(&self) -> ConnectionId {
        ConnectionId::new(0)
    }

    pub fn connection_b(&self) -> ConnectionId {
        ConnectionId::new(1)
    }

    pub fn upgrade_connection_a(&self) -> ConnectionId {
        ConnectionId::new(2)
    }

    pub fn upgrade_connection_b(&self) -> ConnectionId {
        ConnectionId::new(3)
    }

    pub fn client_on_a(&self) -> ClientId {
        mock_client_id(0)
    }

    pub fn client_on_b(&self) -> ClientId {
        mock_client_id(1)
    }

    /// Chain A with both of its connections open and no channel yet.
    pub fn chain_a(&self) -> MockContext {
        MockContext::default()
            .with_connection(
                self.connection_a(),
                dummy_connection_end(ConnectionState::Open, 0, Some(self.connection_b())),
            )
            .with_connection(
                self.upgrade_connection_a(),
                dummy_connection_end(ConnectionState::Open, 0, Some(self.upgrade_connection_b())),
            )
            .with_next_sequence_send(self.port_id(), self.channel_a(), Sequence::from(1))
    }

    /// Chain B with both of its connections open and no channel yet.
    pub fn chain_b(&self) -> MockContext {
        MockContext::default()
            .with_connection(
                self.connection_b(),
                dummy_connection_end(ConnectionState::Open, 1, Some(self.connection_a())),
            )
            .with_connection(
                self.upgrade_connection_b(),
                dummy_connection_end(ConnectionState::Open, 1, Some(self.upgrade_connection_a())),
            )
            .with_next_sequence_send(self.port_id(), self.channel_b(), Sequence::from(1))
    }

    pub fn channel_end_a(&self, state: State, upgrade_sequence: Sequence) -> ChannelEnd {
        ChannelEnd::new(
            state,
            Ordering::Unordered,
            Counterparty::new(self.port_id(), Some(self.channel_b())),
            vec![self.connection_a()],
            Version::new("ics20-1".to_string()),
            upgrade_sequence,
        )
    }

    pub fn channel_end_b(&self, state: State, upgrade_sequence: Sequence) -> ChannelEnd {
        ChannelEnd::new(
            state,
            Ordering::Unordered,
            Counterparty::new(self.port_id(), Some(self.channel_a())),
            vec![self.connection_b()],
            Version::new("ics20-1".to_string()),
            upgrade_sequence,
        )
    }

    /// Moves A's end of the channel onto `connection-2` as an ordered ICS20 v2 channel.
    pub fn upgrade_fields_a(&self) -> UpgradeFields {
        get_dummy_upgrade_fields(self.upgrade_connection_a())
    }

    /// The same upgrade, seen from B.
    pub fn upgrade_fields_b(&self) -> UpgradeFields {
        get_dummy_upgrade_fields(self.upgrade_connection_b())
    }
}
