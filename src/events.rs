//! Events emitted when a channel upgrade step, or a packet send, is committed.

use core::fmt::{Display, Error as FmtError, Formatter};

use serde_derive::Serialize;

use crate::core::ics04_channel::events as ChannelEvents;
use crate::prelude::*;

/// Channel upgrade event types
const CHANNEL_UPGRADE_INIT_EVENT: &str = "channel_upgrade_init";
const CHANNEL_UPGRADE_TRY_EVENT: &str = "channel_upgrade_try";
const CHANNEL_UPGRADE_ACK_EVENT: &str = "channel_upgrade_ack";
const CHANNEL_UPGRADE_CONFIRM_EVENT: &str = "channel_upgrade_confirm";
const CHANNEL_UPGRADE_OPEN_EVENT: &str = "channel_upgrade_open";
const CHANNEL_UPGRADE_CANCEL_EVENT: &str = "channel_upgrade_cancelled";
const CHANNEL_UPGRADE_TIMEOUT_EVENT: &str = "channel_upgrade_timeout";
const CHANNEL_UPGRADE_ERROR_EVENT: &str = "channel_upgrade_error";
/// Packet event types
const SEND_PACKET_EVENT: &str = "send_packet";

/// Events types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IbcEventType {
    UpgradeInitChannel,
    UpgradeTryChannel,
    UpgradeAckChannel,
    UpgradeConfirmChannel,
    UpgradeOpenChannel,
    UpgradeCancelChannel,
    UpgradeTimeoutChannel,
    UpgradeErrorChannel,
    SendPacket,
}

impl IbcEventType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            IbcEventType::UpgradeInitChannel => CHANNEL_UPGRADE_INIT_EVENT,
            IbcEventType::UpgradeTryChannel => CHANNEL_UPGRADE_TRY_EVENT,
            IbcEventType::UpgradeAckChannel => CHANNEL_UPGRADE_ACK_EVENT,
            IbcEventType::UpgradeConfirmChannel => CHANNEL_UPGRADE_CONFIRM_EVENT,
            IbcEventType::UpgradeOpenChannel => CHANNEL_UPGRADE_OPEN_EVENT,
            IbcEventType::UpgradeCancelChannel => CHANNEL_UPGRADE_CANCEL_EVENT,
            IbcEventType::UpgradeTimeoutChannel => CHANNEL_UPGRADE_TIMEOUT_EVENT,
            IbcEventType::UpgradeErrorChannel => CHANNEL_UPGRADE_ERROR_EVENT,
            IbcEventType::SendPacket => SEND_PACKET_EVENT,
        }
    }
}

/// Events created by the IBC component of a chain, destined for a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IbcEvent {
    UpgradeInitChannel(ChannelEvents::UpgradeInit),
    UpgradeTryChannel(ChannelEvents::UpgradeTry),
    UpgradeAckChannel(ChannelEvents::UpgradeAck),
    UpgradeConfirmChannel(ChannelEvents::UpgradeConfirm),
    UpgradeOpenChannel(ChannelEvents::UpgradeOpen),
    UpgradeCancelChannel(ChannelEvents::UpgradeCancel),
    UpgradeTimeoutChannel(ChannelEvents::UpgradeTimeout),
    UpgradeErrorChannel(ChannelEvents::UpgradeError),

    SendPacket(ChannelEvents::SendPacket),
}

impl Display for IbcEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            IbcEvent::UpgradeInitChannel(ev) => write!(f, "UpgradeInitChannel({})", ev),
            IbcEvent::UpgradeTryChannel(ev) => write!(f, "UpgradeTryChannel({})", ev),
            IbcEvent::UpgradeAckChannel(ev) => write!(f, "UpgradeAckChannel({})", ev),
            IbcEvent::UpgradeConfirmChannel(ev) => write!(f, "UpgradeConfirmChannel({})", ev),
            IbcEvent::UpgradeOpenChannel(ev) => write!(f, "UpgradeOpenChannel({})", ev),
            IbcEvent::UpgradeCancelChannel(ev) => write!(f, "UpgradeCancelChannel({})", ev),
            IbcEvent::UpgradeTimeoutChannel(ev) => write!(f, "UpgradeTimeoutChannel({})", ev),
            IbcEvent::UpgradeErrorChannel(ev) => write!(f, "UpgradeErrorChannel({})", ev),

            IbcEvent::SendPacket(ev) => write!(f, "SendPacket({})", ev),
        }
    }
}

impl IbcEvent {
    pub fn event_type(&self) -> IbcEventType {
        match self {
            IbcEvent::UpgradeInitChannel(_) => IbcEventType::UpgradeInitChannel,
            IbcEvent::UpgradeTryChannel(_) => IbcEventType::UpgradeTryChannel,
            IbcEvent::UpgradeAckChannel(_) => IbcEventType::UpgradeAckChannel,
            IbcEvent::UpgradeConfirmChannel(_) => IbcEventType::UpgradeConfirmChannel,
            IbcEvent::UpgradeOpenChannel(_) => IbcEventType::UpgradeOpenChannel,
            IbcEvent::UpgradeCancelChannel(_) => IbcEventType::UpgradeCancelChannel,
            IbcEvent::UpgradeTimeoutChannel(_) => IbcEventType::UpgradeTimeoutChannel,
            IbcEvent::UpgradeErrorChannel(_) => IbcEventType::UpgradeErrorChannel,
            IbcEvent::SendPacket(_) => IbcEventType::SendPacket,
        }
    }

    /// The key/value form of the event, as a host would index it.
    pub fn to_module_event(&self) -> ModuleEvent {
        let attributes = match self {
            IbcEvent::UpgradeInitChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeTryChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeAckChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeConfirmChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeOpenChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeCancelChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeTimeoutChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::UpgradeErrorChannel(ev) => ev.attributes().clone().into(),
            IbcEvent::SendPacket(ev) => ev.packet.clone().into(),
        };

        ModuleEvent {
            kind: self.event_type().as_str().to_string(),
            attributes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

impl<K: ToString, V: ToString> From<(K, V)> for EventAttribute {
    fn from((key, value): (K, V)) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleEvent {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}
