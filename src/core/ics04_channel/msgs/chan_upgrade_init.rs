use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;

pub const TYPE_URL: &str = "/ibc.core.channel.v1.MsgChannelUpgradeInit";

/// Message definition for the first step in the channel
/// upgrade handshake (`ChanUpgradeInit` datagram).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChannelUpgradeInit {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub fields: UpgradeFields,
    pub timeout: Option<UpgradeTimeout>,
    pub signer: Signer,
}

impl MsgChannelUpgradeInit {
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        fields: UpgradeFields,
        timeout: Option<UpgradeTimeout>,
        signer: Signer,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            fields,
            timeout,
            signer,
        }
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        self.fields.validate_basic()?;
        if let Some(timeout) = &self.timeout {
            timeout.validate_basic()?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::msgs::chan_upgrade_init::test_util::get_dummy_msg_chan_upgrade_init;
    use crate::core::ics04_channel::msgs::chan_upgrade_init::MsgChannelUpgradeInit;
    use crate::core::ics04_channel::timeout::{TimeoutHeight, UpgradeTimeout};
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::ConnectionId;
    use crate::prelude::*;
    use crate::timestamp::Timestamp;
    use crate::Height;

    #[test]
    fn validate_channel_upgrade_init_msg() {
        struct Test {
            name: String,
            msg: MsgChannelUpgradeInit,
            want_pass: bool,
        }

        let default_msg = get_dummy_msg_chan_upgrade_init();

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                msg: default_msg.clone(),
                want_pass: true,
            },
            Test {
                name: "With a height timeout".to_string(),
                msg: MsgChannelUpgradeInit {
                    timeout: Some(UpgradeTimeout::at_height(Height::new(0, 100).unwrap())),
                    ..default_msg.clone()
                },
                want_pass: true,
            },
            Test {
                name: "Timeout without height nor timestamp".to_string(),
                msg: MsgChannelUpgradeInit {
                    timeout: Some(UpgradeTimeout {
                        height: TimeoutHeight::Never,
                        timestamp: Timestamp::none(),
                    }),
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "No connection hops".to_string(),
                msg: MsgChannelUpgradeInit {
                    fields: UpgradeFields::new(Ordering::Ordered, vec![], Version::ics20()),
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Two connection hops".to_string(),
                msg: MsgChannelUpgradeInit {
                    fields: UpgradeFields::new(
                        Ordering::Ordered,
                        vec![ConnectionId::new(0), ConnectionId::new(1)],
                        Version::ics20(),
                    ),
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Uninitialized ordering".to_string(),
                msg: MsgChannelUpgradeInit {
                    fields: UpgradeFields::new(
                        Ordering::Uninitialized,
                        vec![ConnectionId::new(0)],
                        Version::ics20(),
                    ),
                    ..default_msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Blank version".to_string(),
                msg: MsgChannelUpgradeInit {
                    fields: UpgradeFields::new(
                        Ordering::Ordered,
                        vec![ConnectionId::new(0)],
                        Version::new("  ".to_string()),
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
                "MsgChannelUpgradeInit::validate_basic failed for test {}, \nmsg {:?} with error {:?}",
                test.name,
                test.msg,
                res.err(),
            );
        }
    }
}
