use crate::core::ics04_channel::channel::State;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeOpen";

/// Message definition for the last step of the channel upgrade
/// handshake (the `ChanUpgradeOpen` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeOpen {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// Either `Open`, if the counterparty already completed the upgrade, or `Flushcomplete`.
    pub counterparty_channel_state: State,
    pub counterparty_upgrade_sequence: Sequence,
    pub proof_channel: CommitmentProofBytes,
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeOpen {
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        counterparty_channel_state: State,
        counterparty_upgrade_sequence: Sequence,
        proof_channel: CommitmentProofBytes,
        proof_height: Height,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            counterparty_channel_state,
            counterparty_upgrade_sequence,
            proof_channel,
            proof_height,
            signer,
        }
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        match self.counterparty_channel_state {
            State::Open | State::Flushcomplete => Ok(()),
            state => Err(Error::invalid_counterparty_channel_state(state)),
        }
    }
}
