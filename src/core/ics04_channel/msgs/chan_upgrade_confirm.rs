use crate::core::ics04_channel::channel::State;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeConfirm";

/// Message definition for the fourth step of the channel upgrade
/// handshake (the `ChanUpgradeConfirm` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeConfirm {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// Either `Flushing` or `Flushcomplete`.
    pub counterparty_channel_state: State,
    pub counterparty_upgrade: Upgrade,
    pub counterparty_upgrade_sequence: Sequence,
    pub proof_channel: CommitmentProofBytes,
    pub proof_upgrade: CommitmentProofBytes,
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeConfirm {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        counterparty_channel_state: State,
        counterparty_upgrade: Upgrade,
        counterparty_upgrade_sequence: Sequence,
        proof_channel: CommitmentProofBytes,
        proof_upgrade: CommitmentProofBytes,
        proof_height: Height,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            counterparty_channel_state,
            counterparty_upgrade,
            counterparty_upgrade_sequence,
            proof_channel,
            proof_upgrade,
            proof_height,
            signer,
        }
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        if !self.counterparty_channel_state.is_upgrading() {
            return Err(Error::invalid_counterparty_channel_state(
                self.counterparty_channel_state,
            ));
        }
        self.counterparty_upgrade.fields.validate_basic()?;
        self.counterparty_upgrade
            .timeout
            .as_ref()
            .ok_or_else(Error::invalid_upgrade_timeout)?
            .validate_basic()
    }
}
