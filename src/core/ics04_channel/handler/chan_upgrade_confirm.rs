//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeConfirm`.

use tracing::info;

use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeHandlerError};
use crate::core::ics04_channel::events::{UpgradeAttributes, UpgradeConfirm};
use crate::core::ics04_channel::handler::abort::sync_upgrade_sequence;
use crate::core::ics04_channel::handler::flush::{check_counterparty_timeout, has_in_flight_packets};
use crate::core::ics04_channel::handler::verify::{verify_channel_state, verify_upgrade_proposal};
use crate::core::ics04_channel::msgs::chan_upgrade_confirm::MsgChannelUpgradeConfirm;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeConfirmResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub channel_end: ChannelEnd,
    pub upgrade: Upgrade,
    pub counterparty_upgrade: Upgrade,
    pub counterparty_channel_state: State,
}

pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeConfirm,
) -> HandlerResult<UpgradeConfirmResult, UpgradeHandlerError> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    let channel_end = ctx.channel_end(&port_channel_id)?;

    if !channel_end.state_matches(&State::Flushing) {
        return Err(Error::invalid_channel_state(msg.channel_id.clone(), *channel_end.state()).into());
    }

    if !msg.counterparty_channel_state.is_upgrading() {
        return Err(Error::invalid_counterparty_channel_state(msg.counterparty_channel_state).into());
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

    let expected_channel = ChannelEnd::new(
        msg.counterparty_channel_state,
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

    let upgrade = ctx
        .upgrade(&port_channel_id)
        .ok_or_else(|| Error::upgrade_not_found(msg.port_id.clone(), msg.channel_id.clone()))?;

    sync_upgrade_sequence(&channel_end, msg.counterparty_upgrade_sequence)?;
    check_counterparty_timeout(ctx, channel_end.upgrade_sequence(), &msg.counterparty_upgrade)?;

    output.log(format!(
        "channel ({}, {}) confirmed upgrade {}, counterparty is {}",
        msg.port_id,
        msg.channel_id,
        channel_end.upgrade_sequence(),
        msg.counterparty_channel_state
    ));

    Ok(output.with_result(UpgradeConfirmResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
        channel_end,
        upgrade,
        counterparty_upgrade: msg.counterparty_upgrade.clone(),
        counterparty_channel_state: msg.counterparty_channel_state,
    }))
}

/// Same flush bookkeeping as the Ack step. Returns the event and whether both ends
/// are now done flushing, in which case the channel can open right away.
pub fn write_upgrade_confirm_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeConfirmResult,
) -> Result<(IbcEvent, bool), FatalError>
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
        ctx.store_channel(port_channel_id, &channel_end)
            .map_err(FatalError::store)?;
    }

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        state = %channel_end.state(),
        counterparty_state = %result.counterparty_channel_state,
        "channel upgrade confirm"
    );

    let ready_to_open = channel_end.state_matches(&State::Flushcomplete)
        && result.counterparty_channel_state == State::Flushcomplete;

    let event = UpgradeConfirm(UpgradeAttributes::new(
        result.port_id.clone(),
        result.channel_id.clone(),
        &channel_end,
        &result.upgrade.fields,
    ))
    .into();

    Ok((event, ready_to_open))
}
