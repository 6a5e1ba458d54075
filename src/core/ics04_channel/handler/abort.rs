//! Aborting an upgrade attempt: the channel goes back to `Open` with its pre-upgrade
//! fields, and an error receipt records which attempt failed.

use core::cmp::max;

use tracing::{info, warn};

use crate::core::ics04_channel::channel::{ChannelEnd, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError};
use crate::core::ics04_channel::events::{UpgradeError as UpgradeErrorEvent, UpgradeErrorAttributes};
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

/// Why an upgrade attempt is being aborted.
#[derive(Debug)]
pub enum AbortReason {
    /// A handshake step failed and already knows the attempt it failed for.
    Upgrade(UpgradeError),
    /// Raised outside the handshake, by the application bound to the channel for instance.
    /// It applies to the attempt in progress.
    Application(Error),
}

impl From<UpgradeError> for AbortReason {
    fn from(e: UpgradeError) -> Self {
        Self::Upgrade(e)
    }
}

impl From<Error> for AbortReason {
    fn from(e: Error) -> Self {
        Self::Application(e)
    }
}

/// Checks that the upgrade sequences of both ends agree. On a mismatch, the error is
/// tagged with the larger of the two, which the channel is restored to when aborting.
pub fn sync_upgrade_sequence(
    channel_end: &ChannelEnd,
    counterparty_sequence: Sequence,
) -> Result<(), UpgradeError> {
    let sequence = channel_end.upgrade_sequence();
    if sequence == counterparty_sequence {
        return Ok(());
    }

    Err(UpgradeError::new(
        max(sequence, counterparty_sequence),
        Error::invalid_upgrade_sequence(sequence, counterparty_sequence),
    ))
}

/// Puts the channel back in `Open` with the given upgrade sequence and drops both
/// upgrade proposals. The negotiable fields were never changed, so they are already
/// the pre-upgrade ones.
pub fn restore_channel<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
    upgrade_sequence: Sequence,
) -> Result<ChannelEnd, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (port_id.clone(), channel_id.clone());

    let mut channel_end = ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(port_id.clone(), channel_id.clone(), e)
    })?;

    let previous_state = *channel_end.state();
    channel_end.set_state(State::Open);
    channel_end.set_upgrade_sequence(upgrade_sequence);

    ctx.store_channel(port_channel_id.clone(), &channel_end)
        .map_err(FatalError::store)?;
    ctx.delete_upgrade_info(port_channel_id)
        .map_err(FatalError::store)?;

    info!(
        %port_id,
        %channel_id,
        %previous_state,
        %upgrade_sequence,
        "restored channel to its pre-upgrade state"
    );

    Ok(channel_end)
}

/// Ends the upgrade attempt in progress on the channel. The channel is restored and an
/// error receipt is written so that the counterparty can cancel its side of the attempt.
///
/// Fails only if there is no attempt to abort, which means the store no longer holds
/// what the step that triggered the abort relied on.
pub fn abort_upgrade<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
    reason: AbortReason,
) -> HandlerResult<ErrorReceipt, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (port_id.clone(), channel_id.clone());

    if ctx.upgrade(&port_channel_id).is_none() {
        return Err(FatalError::invariant_violated(
            port_id.clone(),
            channel_id.clone(),
            Error::upgrade_not_found(port_id.clone(), channel_id.clone()),
        ));
    }

    let channel_end = ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(port_id.clone(), channel_id.clone(), e)
    })?;

    let upgrade_error = match reason {
        AbortReason::Upgrade(e) => e,
        AbortReason::Application(e) => UpgradeError::new(channel_end.upgrade_sequence(), e),
    };

    warn!(
        %port_id,
        %channel_id,
        upgrade_sequence = %upgrade_error.sequence(),
        error = %upgrade_error.cause(),
        "aborting channel upgrade"
    );

    let restored = restore_channel(
        ctx,
        port_id,
        channel_id,
        max(channel_end.upgrade_sequence(), upgrade_error.sequence()),
    )?;

    let error_receipt = upgrade_error.error_receipt();
    ctx.store_upgrade_error_receipt(port_channel_id, &error_receipt)
        .map_err(FatalError::store)?;

    let mut output = HandlerOutput::builder();
    output.log(format!(
        "upgrade attempt {} of channel ({}, {}) aborted: {}",
        upgrade_error.sequence(),
        port_id,
        channel_id,
        upgrade_error.cause()
    ));
    output.emit(IbcEvent::UpgradeErrorChannel(UpgradeErrorEvent(
        UpgradeErrorAttributes::new(
            port_id.clone(),
            channel_id.clone(),
            &restored,
            error_receipt.clone(),
        ),
    )));

    Ok(output.with_result(error_receipt))
}
