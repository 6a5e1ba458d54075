use crate::core::ics04_channel::channel::{ChannelEnd, State};
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeTimeout";

/// Message definition for aborting an upgrade the counterparty never
/// answered before its deadline (the `ChanUpgradeTimeout` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeTimeout {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The counterparty channel end as committed at `proof_height`.
    pub counterparty_channel: ChannelEnd,
    /// The error receipt the counterparty holds from an earlier attempt, if any.
    pub prev_error_receipt: Option<ErrorReceipt>,
    pub proof_channel: CommitmentProofBytes,
    /// Proves the previous error receipt, or the absence of any receipt.
    pub proof_error_receipt: CommitmentProofBytes,
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeTimeout {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        counterparty_channel: ChannelEnd,
        prev_error_receipt: Option<ErrorReceipt>,
        proof_channel: CommitmentProofBytes,
        proof_error_receipt: CommitmentProofBytes,
        proof_height: Height,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            counterparty_channel,
            prev_error_receipt,
            proof_channel,
            proof_error_receipt,
            proof_height,
            signer,
        }
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        if !self.counterparty_channel.state_matches(&State::Open) {
            return Err(Error::invalid_counterparty_channel_state(
                *self.counterparty_channel.state(),
            ));
        }
        self.counterparty_channel.validate_basic()
    }
}

#[cfg(test)]
pub mod test_util {
    use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, Ordering, State};
    use crate::core::ics04_channel::msgs::chan_upgrade_timeout::MsgChannelUpgradeTimeout;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
    use crate::prelude::*;
    use crate::test_utils::{dummy_proof_height, dummy_signer, get_dummy_proof};

    /// Returns a dummy `MsgChannelUpgradeTimeout`, for testing only!
    pub fn get_dummy_msg_chan_upgrade_timeout() -> MsgChannelUpgradeTimeout {
        let counterparty_channel = ChannelEnd::new(
            State::Open,
            Ordering::Unordered,
            Counterparty::new(PortId::transfer(), Some(ChannelId::default())),
            vec![ConnectionId::new(1)],
            Version::ics20(),
            Sequence::from(0),
        );

        MsgChannelUpgradeTimeout::new(
            PortId::transfer(),
            ChannelId::default(),
            counterparty_channel,
            None,
            get_dummy_proof(),
            get_dummy_proof(),
            dummy_proof_height(),
            dummy_signer(),
        )
    }
}
