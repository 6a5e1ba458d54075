use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeCancel";

/// Message definition for aborting an upgrade handshake that the
/// counterparty already gave up on (the `ChanUpgradeCancel` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeCancel {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The receipt the counterparty wrote when it aborted.
    pub error_receipt: ErrorReceipt,
    /// May be omitted only by the upgrade authority, and only before the channel is flushed.
    pub proof_error_receipt: Option<CommitmentProofBytes>,
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeCancel {
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        error_receipt: ErrorReceipt,
        proof_error_receipt: Option<CommitmentProofBytes>,
        proof_height: Height,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            error_receipt,
            proof_error_receipt,
            proof_height,
            signer,
        }
    }

    /// Nothing to validate: proofs are non-empty by construction and whether one is
    /// required depends on the channel state.
    pub fn validate_basic(&self) -> Result<(), Error> {
        Ok(())
    }
}
