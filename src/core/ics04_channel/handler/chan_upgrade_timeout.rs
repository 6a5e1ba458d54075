//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeTimeout`.

use tracing::info;

use crate::core::ics04_channel::channel::State;
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError};
use crate::core::ics04_channel::events::{UpgradeAttributes, UpgradeTimeout as UpgradeTimeoutEvent};
use crate::core::ics04_channel::handler::abort::restore_channel;
use crate::core::ics04_channel::handler::verify::{
    get_timestamp_at_height, verify_channel_state, verify_error_receipt,
    verify_error_receipt_absence,
};
use crate::core::ics04_channel::msgs::chan_upgrade_timeout::MsgChannelUpgradeTimeout;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeTimeoutResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The deadline the counterparty let pass.
    pub timeout: UpgradeTimeout,
}

/// The initiator gives up on a proposal the counterparty never answered. This is only
/// safe once the counterparty provably passed the deadline without moving on: its
/// channel is still open and it holds no receipt for the current attempt.
pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeTimeout,
) -> HandlerResult<UpgradeTimeoutResult, Error> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    let channel_end = ctx.channel_end(&port_channel_id)?;

    if !channel_end.state_matches(&State::Open) {
        return Err(Error::invalid_channel_state(
            msg.channel_id.clone(),
            *channel_end.state(),
        ));
    }

    let upgrade = ctx
        .upgrade(&port_channel_id)
        .ok_or_else(|| Error::upgrade_not_found(msg.port_id.clone(), msg.channel_id.clone()))?;

    let connection_id = channel_end
        .connection_hops()
        .first()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;
    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()));
    }

    let timeout = upgrade.timeout.ok_or_else(Error::invalid_upgrade_timeout)?;

    let proof_timestamp = get_timestamp_at_height(ctx, &connection_end, msg.proof_height)?;
    if !timeout.has_elapsed(msg.proof_height, proof_timestamp) {
        return Err(Error::upgrade_timeout_not_reached(
            msg.proof_height,
            proof_timestamp,
        ));
    }

    if !msg.counterparty_channel.state_matches(&State::Open) {
        return Err(Error::invalid_counterparty_channel_state(
            *msg.counterparty_channel.state(),
        ));
    }

    verify_channel_state(
        ctx,
        &channel_end,
        &connection_end,
        &msg.counterparty_channel,
        &msg.proof_channel,
        msg.proof_height,
    )?;

    match &msg.prev_error_receipt {
        None => verify_error_receipt_absence(
            ctx,
            &channel_end,
            &connection_end,
            &msg.proof_error_receipt,
            msg.proof_height,
        )?,
        Some(receipt) => {
            // Only a receipt left over from an earlier attempt is acceptable.
            let upgrade_sequence = channel_end.upgrade_sequence();
            if receipt.sequence >= upgrade_sequence {
                return Err(Error::invalid_upgrade_sequence(
                    upgrade_sequence,
                    receipt.sequence,
                ));
            }

            verify_error_receipt(
                ctx,
                &channel_end,
                &connection_end,
                receipt,
                &msg.proof_error_receipt,
                msg.proof_height,
            )?;
        }
    }

    output.log(format!(
        "upgrade {} of channel ({}, {}) timed out on the counterparty",
        channel_end.upgrade_sequence(),
        msg.port_id,
        msg.channel_id
    ));

    Ok(output.with_result(UpgradeTimeoutResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
        timeout,
    }))
}

/// Restores the channel and records the timeout in an error receipt, which lets the
/// counterparty cancel if it did pick up the proposal late.
pub fn write_upgrade_timeout_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeTimeoutResult,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (result.port_id.clone(), result.channel_id.clone());

    let channel_end = ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(result.port_id.clone(), result.channel_id.clone(), e)
    })?;
    let upgrade = ctx.upgrade(&port_channel_id).ok_or_else(|| {
        FatalError::invariant_violated(
            result.port_id.clone(),
            result.channel_id.clone(),
            Error::upgrade_not_found(result.port_id.clone(), result.channel_id.clone()),
        )
    })?;

    let upgrade_sequence = channel_end.upgrade_sequence();
    let restored = restore_channel(ctx, &result.port_id, &result.channel_id, upgrade_sequence)?;

    let receipt = UpgradeError::new(
        upgrade_sequence,
        Error::upgrade_timeout_elapsed(result.timeout),
    )
    .error_receipt();
    ctx.store_upgrade_error_receipt(port_channel_id, &receipt)
        .map_err(FatalError::store)?;

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        %upgrade_sequence,
        timeout = %result.timeout,
        "channel upgrade timed out"
    );

    Ok(UpgradeTimeoutEvent(UpgradeAttributes::new(
        result.port_id.clone(),
        result.channel_id.clone(),
        &restored,
        &upgrade.fields,
    ))
    .into())
}
