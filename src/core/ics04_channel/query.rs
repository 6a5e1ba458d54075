//! Read-only queries over the upgrade state a host keeps for a channel.

use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::context::ChannelReader;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics24_host::identifier::{ChannelId, PortId};

pub use crate::core::ics04_channel::handler::flush::has_in_flight_packets;

pub fn get_channel(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<ChannelEnd, Error> {
    ctx.channel_end(&(port_id.clone(), channel_id.clone()))
}

/// The upgrade proposed or accepted by this end, failing if no handshake is in progress.
pub fn get_upgrade(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<Upgrade, Error> {
    ctx.upgrade(&(port_id.clone(), channel_id.clone()))
        .ok_or_else(|| Error::upgrade_not_found(port_id.clone(), channel_id.clone()))
}

pub fn get_counterparty_upgrade(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<Upgrade, Error> {
    ctx.counterparty_upgrade(&(port_id.clone(), channel_id.clone()))
        .ok_or_else(|| Error::counterparty_upgrade_not_found(port_id.clone(), channel_id.clone()))
}

pub fn get_upgrade_error_receipt(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<ErrorReceipt, Error> {
    ctx.upgrade_error_receipt(&(port_id.clone(), channel_id.clone()))
        .ok_or_else(|| Error::upgrade_error_receipt_not_found(port_id.clone(), channel_id.clone()))
}
