//! Path-space as listed in ICS-024, restricted to the records a channel end and its upgrade
//! handshake commit to.
//! https://github.com/cosmos/ibc/tree/main/spec/core/ics-024-host-requirements#path-space

use derive_more::{Display, From};

use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "channelEnds/ports/{}/channels/{}", _0, _1)]
pub struct ChannelEndPath(pub PortId, pub ChannelId);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "channelUpgrades/upgrades/ports/{}/channels/{}", _0, _1)]
pub struct ChannelUpgradePath(pub PortId, pub ChannelId);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "channelUpgrades/upgradeError/ports/{}/channels/{}", _0, _1)]
pub struct ChannelUpgradeErrorPath(pub PortId, pub ChannelId);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(
    fmt = "commitments/ports/{}/channels/{}/sequences/{}",
    port_id,
    channel_id,
    sequence
)]
pub struct CommitmentPath {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub sequence: Sequence,
}

/// The Path enum abstracts out the different sub-paths.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
pub enum Path {
    ChannelEnd(ChannelEndPath),
    ChannelUpgrade(ChannelUpgradePath),
    ChannelUpgradeError(ChannelUpgradeErrorPath),
    Commitment(CommitmentPath),
}

impl Path {
    /// into_bytes implementation
    pub fn into_bytes(self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn upgrade_paths_are_keyed_by_port_and_channel() {
        let port_id = PortId::transfer();
        let channel_id = ChannelId::new(4);

        let path: Path = ChannelUpgradePath(port_id.clone(), channel_id.clone()).into();
        assert_eq!(
            path.to_string(),
            "channelUpgrades/upgrades/ports/transfer/channels/channel-4"
        );

        let path: Path = ChannelUpgradeErrorPath(port_id.clone(), channel_id.clone()).into();
        assert_eq!(
            path.to_string(),
            "channelUpgrades/upgradeError/ports/transfer/channels/channel-4"
        );

        let path = CommitmentPath {
            port_id,
            channel_id,
            sequence: Sequence::from(7),
        };
        assert_eq!(
            path.to_string(),
            "commitments/ports/transfer/channels/channel-4/sequences/7"
        );
    }
}
