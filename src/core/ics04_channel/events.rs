//! Types for the IBC events emitted by the channel upgrade handshake.

use core::fmt::{Display, Error as FmtError, Formatter};

use serde_derive::Serialize;

use crate::core::ics04_channel::channel::{ChannelEnd, Ordering, State};
use crate::core::ics04_channel::packet::{Packet, Sequence};
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics04_channel::version::Version;
use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
use crate::events::{EventAttribute, IbcEvent};
use crate::prelude::*;
use crate::utils::pretty::PrettySlice;

/// Channel event attribute keys
pub const CHANNEL_ID_ATTRIBUTE_KEY: &str = "channel_id";
pub const PORT_ID_ATTRIBUTE_KEY: &str = "port_id";
pub const COUNTERPARTY_CHANNEL_ID_ATTRIBUTE_KEY: &str = "counterparty_channel_id";
pub const COUNTERPARTY_PORT_ID_ATTRIBUTE_KEY: &str = "counterparty_port_id";

/// Channel upgrade event attribute keys
pub const UPGRADE_SEQUENCE_ATTRIBUTE_KEY: &str = "upgrade_sequence";
pub const UPGRADE_CONNECTION_HOPS_ATTRIBUTE_KEY: &str = "upgrade_connection_hops";
pub const UPGRADE_VERSION_ATTRIBUTE_KEY: &str = "upgrade_version";
pub const UPGRADE_ORDERING_ATTRIBUTE_KEY: &str = "upgrade_ordering";
pub const CHANNEL_STATE_ATTRIBUTE_KEY: &str = "channel_state";
pub const ERROR_RECEIPT_ATTRIBUTE_KEY: &str = "error_receipt";

/// Packet event attribute keys
pub const PKT_SEQ_ATTRIBUTE_KEY: &str = "packet_sequence";
pub const PKT_SRC_PORT_ATTRIBUTE_KEY: &str = "packet_src_port";
pub const PKT_SRC_CHANNEL_ATTRIBUTE_KEY: &str = "packet_src_channel";
pub const PKT_DST_PORT_ATTRIBUTE_KEY: &str = "packet_dst_port";
pub const PKT_DST_CHANNEL_ATTRIBUTE_KEY: &str = "packet_dst_channel";
pub const PKT_TIMEOUT_HEIGHT_ATTRIBUTE_KEY: &str = "packet_timeout_height";
pub const PKT_TIMEOUT_TIMESTAMP_ATTRIBUTE_KEY: &str = "packet_timeout_timestamp";

/// What a channel upgrade step reports: the channel it applies to, the state the step
/// left it in, and the upgrade fields in effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpgradeAttributes {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_port_id: PortId,
    pub counterparty_channel_id: Option<ChannelId>,
    pub upgrade_sequence: Sequence,
    pub channel_state: State,
    pub upgrade_connection_hops: Vec<ConnectionId>,
    pub upgrade_version: Version,
    pub upgrade_ordering: Ordering,
}

impl UpgradeAttributes {
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        channel_end: &ChannelEnd,
        fields: &UpgradeFields,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            counterparty_port_id: channel_end.counterparty().port_id().clone(),
            counterparty_channel_id: channel_end.counterparty().channel_id().cloned(),
            upgrade_sequence: channel_end.upgrade_sequence(),
            channel_state: *channel_end.state(),
            upgrade_connection_hops: fields.connection_hops.clone(),
            upgrade_version: fields.version.clone(),
            upgrade_ordering: fields.ordering,
        }
    }
}

impl Display for UpgradeAttributes {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "UpgradeAttributes {{ port_id: {}, channel_id: {}, counterparty_port_id: {}, ",
            self.port_id, self.channel_id, self.counterparty_port_id
        )?;
        match &self.counterparty_channel_id {
            Some(counterparty_channel_id) => {
                write!(f, "counterparty_channel_id: {counterparty_channel_id}, ")?
            }
            None => write!(f, "counterparty_channel_id: None, ")?,
        }
        write!(
            f,
            "upgrade_sequence: {}, channel_state: {}, upgrade_connection_hops: {}, upgrade_version: {}, upgrade_ordering: {} }}",
            self.upgrade_sequence,
            self.channel_state,
            PrettySlice(&self.upgrade_connection_hops),
            self.upgrade_version,
            self.upgrade_ordering
        )
    }
}

/// Convert attributes to key/value event attributes
impl From<UpgradeAttributes> for Vec<EventAttribute> {
    fn from(a: UpgradeAttributes) -> Self {
        let mut attributes: Vec<EventAttribute> = vec![
            (PORT_ID_ATTRIBUTE_KEY, a.port_id).into(),
            (CHANNEL_ID_ATTRIBUTE_KEY, a.channel_id).into(),
            (COUNTERPARTY_PORT_ID_ATTRIBUTE_KEY, a.counterparty_port_id).into(),
        ];
        if let Some(channel_id) = a.counterparty_channel_id {
            attributes.push((COUNTERPARTY_CHANNEL_ID_ATTRIBUTE_KEY, channel_id).into());
        }
        attributes.push((UPGRADE_SEQUENCE_ATTRIBUTE_KEY, a.upgrade_sequence).into());
        attributes.push((CHANNEL_STATE_ATTRIBUTE_KEY, a.channel_state).into());

        let hops = a
            .upgrade_connection_hops
            .iter()
            .map(|hop| hop.as_str())
            .collect::<Vec<_>>()
            .join(",");
        attributes.push((UPGRADE_CONNECTION_HOPS_ATTRIBUTE_KEY, hops).into());
        attributes.push((UPGRADE_VERSION_ATTRIBUTE_KEY, a.upgrade_version).into());
        attributes.push((UPGRADE_ORDERING_ATTRIBUTE_KEY, a.upgrade_ordering).into());
        attributes
    }
}

/// What an aborted upgrade attempt reports: the channel and the receipt written for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpgradeErrorAttributes {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_port_id: PortId,
    pub counterparty_channel_id: Option<ChannelId>,
    pub upgrade_sequence: Sequence,
    pub error_receipt: ErrorReceipt,
}

impl UpgradeErrorAttributes {
    pub fn new(
        port_id: PortId,
        channel_id: ChannelId,
        channel_end: &ChannelEnd,
        error_receipt: ErrorReceipt,
    ) -> Self {
        Self {
            port_id,
            channel_id,
            counterparty_port_id: channel_end.counterparty().port_id().clone(),
            counterparty_channel_id: channel_end.counterparty().channel_id().cloned(),
            upgrade_sequence: channel_end.upgrade_sequence(),
            error_receipt,
        }
    }
}

impl Display for UpgradeErrorAttributes {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "UpgradeErrorAttributes {{ port_id: {}, channel_id: {}, upgrade_sequence: {}, error_receipt: {} }}",
            self.port_id, self.channel_id, self.upgrade_sequence, self.error_receipt
        )
    }
}

impl From<UpgradeErrorAttributes> for Vec<EventAttribute> {
    fn from(a: UpgradeErrorAttributes) -> Self {
        let mut attributes: Vec<EventAttribute> = vec![
            (PORT_ID_ATTRIBUTE_KEY, a.port_id).into(),
            (CHANNEL_ID_ATTRIBUTE_KEY, a.channel_id).into(),
            (COUNTERPARTY_PORT_ID_ATTRIBUTE_KEY, a.counterparty_port_id).into(),
        ];
        if let Some(channel_id) = a.counterparty_channel_id {
            attributes.push((COUNTERPARTY_CHANNEL_ID_ATTRIBUTE_KEY, channel_id).into());
        }
        attributes.push((UPGRADE_SEQUENCE_ATTRIBUTE_KEY, a.upgrade_sequence).into());
        attributes.push((ERROR_RECEIPT_ATTRIBUTE_KEY, a.error_receipt.message).into());
        attributes
    }
}

macro_rules! impl_upgrade_event {
    ($(#[$doc:meta])* $name:ident, $attributes:ty, $variant:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
        pub struct $name(pub $attributes);

        impl $name {
            pub fn attributes(&self) -> &$attributes {
                &self.0
            }

            pub fn port_id(&self) -> &PortId {
                &self.0.port_id
            }

            pub fn channel_id(&self) -> &ChannelId {
                &self.0.channel_id
            }

            pub fn upgrade_sequence(&self) -> Sequence {
                self.0.upgrade_sequence
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for IbcEvent {
            fn from(v: $name) -> Self {
                IbcEvent::$variant(v)
            }
        }
    };
}

impl_upgrade_event!(
    /// A new upgrade was proposed on a channel.
    UpgradeInit,
    UpgradeAttributes,
    UpgradeInitChannel
);
impl_upgrade_event!(
    /// The counterparty proposal was accepted and the channel started flushing.
    UpgradeTry,
    UpgradeAttributes,
    UpgradeTryChannel
);
impl_upgrade_event!(UpgradeAck, UpgradeAttributes, UpgradeAckChannel);
impl_upgrade_event!(UpgradeConfirm, UpgradeAttributes, UpgradeConfirmChannel);
impl_upgrade_event!(
    /// The channel now runs with the upgraded fields.
    UpgradeOpen,
    UpgradeAttributes,
    UpgradeOpenChannel
);
impl_upgrade_event!(UpgradeCancel, UpgradeErrorAttributes, UpgradeCancelChannel);
impl_upgrade_event!(UpgradeTimeout, UpgradeAttributes, UpgradeTimeoutChannel);
impl_upgrade_event!(
    /// An upgrade attempt was aborted and an error receipt written.
    UpgradeError,
    UpgradeErrorAttributes,
    UpgradeErrorChannel
);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendPacket {
    pub packet: Packet,
}

impl SendPacket {
    pub fn src_port_id(&self) -> &PortId {
        &self.packet.source_port
    }
    pub fn src_channel_id(&self) -> &ChannelId {
        &self.packet.source_channel
    }
}

impl Display for SendPacket {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "SendPacket {{ packet: {}}}", self.packet)
    }
}

impl From<SendPacket> for IbcEvent {
    fn from(v: SendPacket) -> Self {
        IbcEvent::SendPacket(v)
    }
}

/// Convert a packet to key/value event attributes
impl From<Packet> for Vec<EventAttribute> {
    fn from(p: Packet) -> Self {
        vec![
            (PKT_SRC_PORT_ATTRIBUTE_KEY, p.source_port).into(),
            (PKT_SRC_CHANNEL_ATTRIBUTE_KEY, p.source_channel).into(),
            (PKT_DST_PORT_ATTRIBUTE_KEY, p.destination_port).into(),
            (PKT_DST_CHANNEL_ATTRIBUTE_KEY, p.destination_channel).into(),
            (PKT_SEQ_ATTRIBUTE_KEY, p.sequence).into(),
            (PKT_TIMEOUT_HEIGHT_ATTRIBUTE_KEY, p.timeout_height).into(),
            (
                PKT_TIMEOUT_TIMESTAMP_ATTRIBUTE_KEY,
                p.timeout_timestamp.as_nanoseconds(),
            )
                .into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::core::ics04_channel::channel::Counterparty;

    #[test]
    fn upgrade_attributes_carry_the_new_fields() {
        let channel_end = ChannelEnd::new(
            State::Flushing,
            Ordering::Unordered,
            Counterparty::new(PortId::transfer(), Some(ChannelId::new(1))),
            vec![ConnectionId::new(0)],
            Version::ics20(),
            Sequence::from(2),
        );
        let fields = UpgradeFields::new(
            Ordering::Ordered,
            vec![ConnectionId::new(2)],
            Version::new("ics20-2".to_string()),
        );

        let event: IbcEvent = UpgradeTry(UpgradeAttributes::new(
            PortId::transfer(),
            ChannelId::new(0),
            &channel_end,
            &fields,
        ))
        .into();

        let module_event = event.to_module_event();
        assert_eq!(module_event.kind, "channel_upgrade_try");

        let value_of = |key: &str| {
            module_event
                .attributes
                .iter()
                .find(|attr| attr.key == key)
                .map(|attr| attr.value.clone())
        };
        assert_eq!(value_of(UPGRADE_SEQUENCE_ATTRIBUTE_KEY).as_deref(), Some("2"));
        assert_eq!(value_of(CHANNEL_STATE_ATTRIBUTE_KEY).as_deref(), Some("FLUSHING"));
        assert_eq!(
            value_of(UPGRADE_CONNECTION_HOPS_ATTRIBUTE_KEY).as_deref(),
            Some("connection-2")
        );
        assert_eq!(
            value_of(UPGRADE_ORDERING_ATTRIBUTE_KEY).as_deref(),
            Some("ORDER_ORDERED")
        );
        assert_eq!(
            value_of(COUNTERPARTY_CHANNEL_ID_ATTRIBUTE_KEY).as_deref(),
            Some("channel-1")
        );
    }
}
