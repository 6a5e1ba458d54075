//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeAck`.

use tracing::info;

use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError, UpgradeHandlerError};
use crate::core::ics04_channel::events::{UpgradeAck, UpgradeAttributes};
use crate::core::ics04_channel::handler::abort::sync_upgrade_sequence;
use crate::core::ics04_channel::handler::compatibility::check_upgrade_compatibility;
use crate::core::ics04_channel::handler::flush::{
    check_counterparty_timeout, has_in_flight_packets, start_flushing,
};
use crate::core::ics04_channel::handler::verify::{verify_channel_state, verify_upgrade_proposal};
use crate::core::ics04_channel::msgs::chan_upgrade_ack::MsgChannelUpgradeAck;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeAckResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub channel_end: ChannelEnd,
    pub upgrade: Upgrade,
    pub counterparty_upgrade: Upgrade,
}

pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeAck,
) -> HandlerResult<UpgradeAckResult, UpgradeHandlerError> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    let mut channel_end = ctx.channel_end(&port_channel_id)?;

    // Flushing when both ends sent a Try (crossing hellos).
    let was_open = channel_end.state_matches(&State::Open);
    if !was_open && !channel_end.state_matches(&State::Flushing) {
        return Err(Error::invalid_channel_state(msg.channel_id.clone(), *channel_end.state()).into());
    }

    let connection_id = channel_end
        .connection_hops()
        .first()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;
    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()).into());
    }

    let counterparty_connection_id = connection_end
        .counterparty()
        .connection_id()
        .ok_or_else(|| Error::undefined_connection_counterparty(connection_id.clone()))?;

    // The counterparty accepted the upgrade and is flushing its packets.
    let expected_channel = ChannelEnd::new(
        State::Flushing,
        *channel_end.ordering(),
        Counterparty::new(msg.port_id.clone(), Some(msg.channel_id.clone())),
        vec![counterparty_connection_id.clone()],
        channel_end.version().clone(),
        msg.counterparty_upgrade_sequence,
    );
    verify_channel_state(
        ctx,
        &channel_end,
        &connection_end,
        &expected_channel,
        &msg.proof_channel,
        msg.proof_height,
    )?;
    verify_upgrade_proposal(
        ctx,
        &channel_end,
        &connection_end,
        &msg.counterparty_upgrade,
        &msg.proof_upgrade,
        msg.proof_height,
    )?;

    let mut upgrade = ctx
        .upgrade(&port_channel_id)
        .ok_or_else(|| Error::upgrade_not_found(msg.port_id.clone(), msg.channel_id.clone()))?;

    sync_upgrade_sequence(&channel_end, msg.counterparty_upgrade_sequence)?;

    let upgrade_sequence = channel_end.upgrade_sequence();

    // The version is the one the counterparty application settled on in its Try. With
    // crossing hellos, both Try steps picked a version and they must agree.
    if was_open {
        upgrade.fields.version = msg.counterparty_upgrade.fields.version.clone();
    }

    check_upgrade_compatibility(ctx, &upgrade.fields, &msg.counterparty_upgrade.fields)
        .map_err(|e| UpgradeError::new(upgrade_sequence, e))?;

    if was_open {
        start_flushing(
            ctx,
            &msg.port_id,
            &msg.channel_id,
            &mut channel_end,
            &mut upgrade,
        )?;
    }

    check_counterparty_timeout(ctx, upgrade_sequence, &msg.counterparty_upgrade)?;

    output.log(format!(
        "channel ({}, {}) acknowledged upgrade {}",
        msg.port_id, msg.channel_id, upgrade_sequence
    ));

    Ok(output.with_result(UpgradeAckResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
        channel_end,
        upgrade,
        counterparty_upgrade: msg.counterparty_upgrade.clone(),
    }))
}

/// Persists the acknowledged upgrade. The channel skips straight to `Flushcomplete`
/// when no packet is in flight, otherwise the counterparty upgrade is kept until the
/// last one is resolved.
pub fn write_upgrade_ack_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeAckResult,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (result.port_id.clone(), result.channel_id.clone());

    ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(result.port_id.clone(), result.channel_id.clone(), e)
    })?;

    let mut channel_end = result.channel_end.clone();
    if has_in_flight_packets(&*ctx, &result.port_id, &result.channel_id) {
        ctx.store_counterparty_upgrade(port_channel_id.clone(), &result.counterparty_upgrade)
            .map_err(FatalError::store)?;
    } else {
        channel_end.set_state(State::Flushcomplete);
    }

    ctx.store_channel(port_channel_id.clone(), &channel_end)
        .map_err(FatalError::store)?;
    ctx.store_upgrade(port_channel_id, &result.upgrade)
        .map_err(FatalError::store)?;

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        state = %channel_end.state(),
        upgrade_sequence = %channel_end.upgrade_sequence(),
        "channel upgrade ack"
    );

    Ok(UpgradeAck(UpgradeAttributes::new(
        result.port_id.clone(),
        result.channel_id.clone(),
        &channel_end,
        &result.upgrade.fields,
    ))
    .into())
}
