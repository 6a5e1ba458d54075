//! Message definitions for the ICS4 channel upgrade handshake datagrams.

use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::msgs::{
    chan_upgrade_ack::MsgChannelUpgradeAck, chan_upgrade_cancel::MsgChannelUpgradeCancel,
    chan_upgrade_confirm::MsgChannelUpgradeConfirm, chan_upgrade_init::MsgChannelUpgradeInit,
    chan_upgrade_open::MsgChannelUpgradeOpen, chan_upgrade_timeout::MsgChannelUpgradeTimeout,
    chan_upgrade_try::MsgChannelUpgradeTry,
};
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::signer::Signer;

// Upgrade handshake messages.
pub mod chan_upgrade_ack;
pub mod chan_upgrade_confirm;
pub mod chan_upgrade_init;
pub mod chan_upgrade_open;
pub mod chan_upgrade_try;

// Upgrade abort messages.
pub mod chan_upgrade_cancel;
pub mod chan_upgrade_timeout;

/// Enumeration of all messages of the channel upgrade handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelUpgradeMsg {
    Init(MsgChannelUpgradeInit),
    Try(MsgChannelUpgradeTry),
    Ack(MsgChannelUpgradeAck),
    Confirm(MsgChannelUpgradeConfirm),
    Open(MsgChannelUpgradeOpen),
    Cancel(MsgChannelUpgradeCancel),
    Timeout(MsgChannelUpgradeTimeout),
}

impl ChannelUpgradeMsg {
    pub fn port_id(&self) -> &PortId {
        match self {
            Self::Init(msg) => &msg.port_id,
            Self::Try(msg) => &msg.port_id,
            Self::Ack(msg) => &msg.port_id,
            Self::Confirm(msg) => &msg.port_id,
            Self::Open(msg) => &msg.port_id,
            Self::Cancel(msg) => &msg.port_id,
            Self::Timeout(msg) => &msg.port_id,
        }
    }

    pub fn channel_id(&self) -> &ChannelId {
        match self {
            Self::Init(msg) => &msg.channel_id,
            Self::Try(msg) => &msg.channel_id,
            Self::Ack(msg) => &msg.channel_id,
            Self::Confirm(msg) => &msg.channel_id,
            Self::Open(msg) => &msg.channel_id,
            Self::Cancel(msg) => &msg.channel_id,
            Self::Timeout(msg) => &msg.channel_id,
        }
    }

    pub fn signer(&self) -> &Signer {
        match self {
            Self::Init(msg) => &msg.signer,
            Self::Try(msg) => &msg.signer,
            Self::Ack(msg) => &msg.signer,
            Self::Confirm(msg) => &msg.signer,
            Self::Open(msg) => &msg.signer,
            Self::Cancel(msg) => &msg.signer,
            Self::Timeout(msg) => &msg.signer,
        }
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Init(_) => chan_upgrade_init::TYPE_URL,
            Self::Try(_) => chan_upgrade_try::TYPE_URL,
            Self::Ack(_) => chan_upgrade_ack::TYPE_URL,
            Self::Confirm(_) => chan_upgrade_confirm::TYPE_URL,
            Self::Open(_) => chan_upgrade_open::TYPE_URL,
            Self::Cancel(_) => chan_upgrade_cancel::TYPE_URL,
            Self::Timeout(_) => chan_upgrade_timeout::TYPE_URL,
        }
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        match self {
            Self::Init(msg) => msg.validate_basic(),
            Self::Try(msg) => msg.validate_basic(),
            Self::Ack(msg) => msg.validate_basic(),
            Self::Confirm(msg) => msg.validate_basic(),
            Self::Open(msg) => msg.validate_basic(),
            Self::Cancel(msg) => msg.validate_basic(),
            Self::Timeout(msg) => msg.validate_basic(),
        }
    }
}

impl From<MsgChannelUpgradeInit> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeInit) -> Self {
        Self::Init(msg)
    }
}

impl From<MsgChannelUpgradeTry> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeTry) -> Self {
        Self::Try(msg)
    }
}

impl From<MsgChannelUpgradeAck> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeAck) -> Self {
        Self::Ack(msg)
    }
}

impl From<MsgChannelUpgradeConfirm> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeConfirm) -> Self {
        Self::Confirm(msg)
    }
}

impl From<MsgChannelUpgradeOpen> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeOpen) -> Self {
        Self::Open(msg)
    }
}

impl From<MsgChannelUpgradeCancel> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeCancel) -> Self {
        Self::Cancel(msg)
    }
}

impl From<MsgChannelUpgradeTimeout> for ChannelUpgradeMsg {
    fn from(msg: MsgChannelUpgradeTimeout) -> Self {
        Self::Timeout(msg)
    }
}
