//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeCancel`.

use core::cmp::max;

use tracing::info;

use crate::core::ics04_channel::channel::State;
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError};
use crate::core::ics04_channel::events::{UpgradeCancel, UpgradeErrorAttributes};
use crate::core::ics04_channel::handler::abort::restore_channel;
use crate::core::ics04_channel::handler::verify::verify_error_receipt;
use crate::core::ics04_channel::msgs::chan_upgrade_cancel::MsgChannelUpgradeCancel;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeCancelResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub error_receipt: ErrorReceipt,
}

pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeCancel,
) -> HandlerResult<UpgradeCancelResult, Error> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    let channel_end = ctx.channel_end(&port_channel_id)?;

    if ctx.upgrade(&port_channel_id).is_none() {
        return Err(Error::upgrade_not_found(
            msg.port_id.clone(),
            msg.channel_id.clone(),
        ));
    }

    let upgrade_sequence = channel_end.upgrade_sequence();
    if msg.error_receipt.sequence < upgrade_sequence {
        return Err(Error::invalid_upgrade_sequence(
            upgrade_sequence,
            msg.error_receipt.sequence,
        ));
    }

    let result = UpgradeCancelResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
        error_receipt: msg.error_receipt.clone(),
    };

    // Once this end is done flushing, the counterparty may open at any time: only its
    // own error receipt proves it will not.
    if ctx.is_authorized_upgrader(&msg.signer)
        && !channel_end.state_matches(&State::Flushcomplete)
    {
        output.log(format!(
            "upgrade {} of channel ({}, {}) cancelled by the upgrade authority",
            upgrade_sequence, msg.port_id, msg.channel_id
        ));
        return Ok(output.with_result(result));
    }

    let connection_id = channel_end
        .connection_hops()
        .first()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;
    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()));
    }

    let proof = msg
        .proof_error_receipt
        .as_ref()
        .ok_or_else(Error::missing_upgrade_error_receipt_proof)?;
    verify_error_receipt(
        ctx,
        &channel_end,
        &connection_end,
        &msg.error_receipt,
        proof,
        msg.proof_height,
    )?;

    output.log(format!(
        "upgrade {} of channel ({}, {}) cancelled by counterparty error receipt {}",
        upgrade_sequence, msg.port_id, msg.channel_id, msg.error_receipt.sequence
    ));

    Ok(output.with_result(result))
}

/// Restores the channel and keeps the counterparty receipt as this end's own, so
/// both ends agree on which attempt failed.
pub fn write_upgrade_cancel_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeCancelResult,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (result.port_id.clone(), result.channel_id.clone());

    let channel_end = ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(result.port_id.clone(), result.channel_id.clone(), e)
    })?;
    if ctx.upgrade(&port_channel_id).is_none() {
        return Err(FatalError::invariant_violated(
            result.port_id.clone(),
            result.channel_id.clone(),
            Error::upgrade_not_found(result.port_id.clone(), result.channel_id.clone()),
        ));
    }

    ctx.store_upgrade_error_receipt(port_channel_id, &result.error_receipt)
        .map_err(FatalError::store)?;

    let restored = restore_channel(
        ctx,
        &result.port_id,
        &result.channel_id,
        max(channel_end.upgrade_sequence(), result.error_receipt.sequence),
    )?;

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        previous_state = %channel_end.state(),
        upgrade_sequence = %restored.upgrade_sequence(),
        "channel upgrade cancelled"
    );

    Ok(UpgradeCancel(UpgradeErrorAttributes::new(
        result.port_id.clone(),
        result.channel_id.clone(),
        &restored,
        result.error_receipt.clone(),
    ))
    .into())
}
