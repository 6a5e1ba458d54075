use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
use crate::prelude::*;
use crate::signer::Signer;
use crate::Height;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeTry";

/// Message definition for the second step of the channel upgrade
/// handshake (the `ChanUpgradeTry` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeTry {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The connection this end proposes to route the upgraded channel over.
    pub proposed_upgrade_connection_hops: Vec<ConnectionId>,
    pub counterparty_upgrade_fields: UpgradeFields,
    pub counterparty_upgrade_timeout: Option<UpgradeTimeout>,
    pub counterparty_upgrade_sequence: Sequence,
    /// The proof of the counterparty channel end
    pub proof_channel: CommitmentProofBytes,
    /// The proof of the counterparty upgrade
    pub proof_upgrade: CommitmentProofBytes,
    /// The height at which the proofs were queried.
    pub proof_height: Height,
    pub signer: Signer,
}

impl MsgChannelUpgradeTry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        proposed_upgrade_connection_hops: Vec<ConnectionId>,
        counterparty_upgrade_fields: UpgradeFields,
        counterparty_upgrade_timeout: Option<UpgradeTimeout>,
        counterparty_upgrade_sequence: Sequence,
        proof_channel: CommitmentProofBytes,
        proof_upgrade: CommitmentProofBytes,
        proof_height: Height,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            proposed_upgrade_connection_hops,
            counterparty_upgrade_fields,
            counterparty_upgrade_timeout,
            counterparty_upgrade_sequence,
            proof_channel,
            proof_upgrade,
            proof_height,
            signer,
        }
    }

    /// The upgrade this end proposes in response: the counterparty's ordering and
    /// version routed over the locally chosen connection.
    pub fn proposed_upgrade_fields(&self) -> UpgradeFields {
        UpgradeFields::new(
            self.counterparty_upgrade_fields.ordering,
            self.proposed_upgrade_connection_hops.clone(),
            self.counterparty_upgrade_fields.version.clone(),
        )
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        if self.proposed_upgrade_connection_hops.len() != 1 {
            return Err(Error::invalid_connection_hops_length(
                1,
                self.proposed_upgrade_connection_hops.len(),
            ));
        }
        self.counterparty_upgrade_fields.validate_basic()?;
        if let Some(timeout) = &self.counterparty_upgrade_timeout {
            timeout.validate_basic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test_util {
    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::msgs::chan_upgrade_try::MsgChannelUpgradeTry;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
    use crate::prelude::*;
    use crate::test_utils::{dummy_proof_height, dummy_signer, get_dummy_proof};

    /// Returns a dummy `MsgChannelUpgradeTry`, for testing only!
    pub fn get_dummy_msg_chan_upgrade_try() -> MsgChannelUpgradeTry {
        MsgChannelUpgradeTry::new(
            PortId::transfer(),
            ChannelId::default(),
            vec![ConnectionId::new(1)],
            UpgradeFields::new(
                Ordering::Ordered,
                vec![ConnectionId::new(0)],
                Version::ics20(),
            ),
            None,
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

    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::msgs::chan_upgrade_try::test_util::get_dummy_msg_chan_upgrade_try;
    use crate::core::ics04_channel::msgs::chan_upgrade_try::MsgChannelUpgradeTry;
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::ConnectionId;
    use crate::prelude::*;

    #[test]
    fn validate_channel_upgrade_try_msg() {
        struct Test {
            name: String,
            msg: MsgChannelUpgradeTry,
            want_pass: bool,
        }

        let default_msg = get_dummy_msg_chan_upgrade_try();

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                msg: default_msg.clone(),
                want_pass: true,
            },
            Test {
                name: "No proposed connection hop".to_string(),
                msg: MsgChannelUpgradeTry {
                    proposed_upgrade_connection_hops: vec![],
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Counterparty proposes an empty version".to_string(),
                msg: MsgChannelUpgradeTry {
                    counterparty_upgrade_fields: UpgradeFields::new(
                        Ordering::Ordered,
                        vec![ConnectionId::new(0)],
                        Version::empty(),
                    ),
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
                "MsgChannelUpgradeTry::validate_basic failed for test {}, \nmsg {:?} with error {:?}",
                test.name,
                test.msg,
                res.err(),
            );
        }
    }

    #[test]
    fn proposed_fields_use_the_local_connection() {
        let msg = get_dummy_msg_chan_upgrade_try();
        let fields = msg.proposed_upgrade_fields();

        assert_eq!(fields.ordering, msg.counterparty_upgrade_fields.ordering);
        assert_eq!(fields.version, msg.counterparty_upgrade_fields.version);
        assert_eq!(fields.connection_hops, vec![ConnectionId::new(1)]);
    }
}
