use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeAck";

/// Message definition for the third step of the channel upgrade
/// handshake (the `ChanUpgradeAck` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeAck {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The upgrade the counterparty stored when it started flushing.
    pub counterparty_upgrade: Upgrade,
    pub counterparty_upgrade_sequence: Sequence,
    /// The proof of the counterparty channel end
    pub proof_channel: CommitmentProofBytes,
    /// The proof of the counterparty upgrade
    pub proof_upgrade: CommitmentProofBytes,
    /// The height at which the proofs were queried.
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeAck {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
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
            counterparty_upgrade,
            counterparty_upgrade_sequence,
            proof_channel,
            proof_upgrade,
            proof_height,
            signer,
        }
    }

    /// The counterparty is flushing, so its upgrade must carry a deadline.
    pub fn validate_basic(&self) -> Result<(), Error> {
        self.counterparty_upgrade.fields.validate_basic()?;
        self.counterparty_upgrade
            .timeout
            .as_ref()
            .ok_or_else(Error::invalid_upgrade_timeout)?
            .validate_basic()
    }
}

#[cfg(test)]
pub mod test_util {
    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::msgs::chan_upgrade_ack::MsgChannelUpgradeAck;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::timeout::UpgradeTimeout;
    use crate::core::ics04_channel::upgrade::Upgrade;
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
    use crate::prelude::*;
    use crate::test_utils::{dummy_proof_height, dummy_signer, get_dummy_proof};
    use crate::Height;

    /// Returns a dummy `MsgChannelUpgradeAck`, for testing only!
    pub fn get_dummy_msg_chan_upgrade_ack() -> MsgChannelUpgradeAck {
        let counterparty_upgrade = Upgrade::new(
            UpgradeFields::new(
                Ordering::Ordered,
                vec![ConnectionId::new(1)],
                Version::ics20(),
            ),
            Some(UpgradeTimeout::at_height(Height::new(0, 100).unwrap())),
            Sequence::from(0),
        );

        MsgChannelUpgradeAck::new(
            PortId::transfer(),
            ChannelId::default(),
            counterparty_upgrade,
            Sequence::from(1),
            get_dummy_proof(),
            get_dummy_proof(),
            dummy_proof_height(),
            dummy_signer(),
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::core::ics04_channel::msgs::chan_upgrade_ack::test_util::get_dummy_msg_chan_upgrade_ack;
    use crate::core::ics04_channel::msgs::chan_upgrade_ack::MsgChannelUpgradeAck;
    use crate::core::ics04_channel::upgrade::Upgrade;
    use crate::core::ics04_channel::version::Version;
    use crate::prelude::*;

    #[test]
    fn validate_channel_upgrade_ack_msg() {
        struct Test {
            name: String,
            msg: MsgChannelUpgradeAck,
            want_pass: bool,
        }

        let default_msg = get_dummy_msg_chan_upgrade_ack();
        let mut blank_version = default_msg.counterparty_upgrade.clone();
        blank_version.fields.version = Version::empty();

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                msg: default_msg.clone(),
                want_pass: true,
            },
            Test {
                name: "Counterparty upgrade without timeout".to_string(),
                msg: MsgChannelUpgradeAck {
                    counterparty_upgrade: Upgrade {
                        timeout: None,
                        ..default_msg.counterparty_upgrade.clone()
                    },
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Counterparty upgrade with a blank version".to_string(),
                msg: MsgChannelUpgradeAck {
                    counterparty_upgrade: blank_version,
                    ..default_msg
                },
                want_pass: false,
            },
        ];

        for test in tests {
            let res = test.msg.validate_basic();

            assert_eq!(
                test.want_pass,
                res.is_ok(),
                "MsgChannelUpgradeAck::validate_basic failed for test {}, \nmsg {:?} with error {:?}",
                test.name,
                test.msg,
                res.err(),
            );
        }
    }
}
