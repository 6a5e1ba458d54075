//! This module implements the processing logic for ICS4 (channel) upgrade messages.

use core::fmt::{Display, Error as FmtError, Formatter};

use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError, UpgradeHandlerError};
use crate::core::ics04_channel::msgs::ChannelUpgradeMsg;
use crate::core::ics04_channel::upgrade::ErrorReceipt;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

pub mod abort;
pub mod chan_upgrade_ack;
pub mod chan_upgrade_cancel;
pub mod chan_upgrade_confirm;
pub mod chan_upgrade_init;
pub mod chan_upgrade_open;
pub mod chan_upgrade_timeout;
pub mod chan_upgrade_try;
pub mod compatibility;
pub mod flush;
pub mod send_packet;
pub mod verify;

/// What a handshake message led to once committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The step was applied.
    Success,
    /// The step could not proceed and the attempt was aborted. The channel is back
    /// to `Open` and the receipt is stored for the counterparty to pick up.
    Aborted(ErrorReceipt),
}

/// A message that could not be applied. Nothing was written for a rejected message.
#[derive(Debug)]
pub enum DispatchError {
    Rejected(Error),
    Fatal(FatalError),
}

impl From<Error> for DispatchError {
    fn from(e: Error) -> Self {
        Self::Rejected(e)
    }
}

impl From<FatalError> for DispatchError {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Rejected(e) => write!(f, "message rejected: {e}"),
            Self::Fatal(e) => write!(f, "fatal error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DispatchError {}

/// General entry point for processing any message of the channel upgrade handshake.
/// Each step is validated against the current state first and only then committed,
/// so a rejected message leaves the store untouched.
pub fn upgrade_dispatch<Ctx>(
    ctx: &mut Ctx,
    msg: &ChannelUpgradeMsg,
) -> HandlerResult<UpgradeOutcome, DispatchError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    msg.validate_basic()?;

    match msg {
        ChannelUpgradeMsg::Init(msg) => {
            let output = chan_upgrade_init::process(&*ctx, msg)?;
            let event = chan_upgrade_init::write_upgrade_init_channel(ctx, &output.result)?;
            Ok(committed(output, vec![event]))
        }
        ChannelUpgradeMsg::Try(msg) => {
            let staged = chan_upgrade_try::stage_init(&*ctx, msg)?;
            match chan_upgrade_try::process(&*ctx, msg, staged.as_ref()) {
                Ok(output) => {
                    let event = chan_upgrade_try::write_upgrade_try_channel(ctx, &output.result)?;
                    Ok(committed(output, vec![event]))
                }
                Err(UpgradeHandlerError::Channel(e)) => Err(e.into()),
                Err(UpgradeHandlerError::Upgrade(e)) => {
                    // The attempt this end just started is the one being aborted.
                    let mut events = Vec::new();
                    if let Some(staged) = staged {
                        events.push(chan_upgrade_init::write_upgrade_init_channel(
                            ctx, &staged,
                        )?);
                    }
                    abort_attempt(ctx, &msg.port_id, &msg.channel_id, e, events)
                }
            }
        }
        ChannelUpgradeMsg::Ack(msg) => match chan_upgrade_ack::process(&*ctx, msg) {
            Ok(output) => {
                let event = chan_upgrade_ack::write_upgrade_ack_channel(ctx, &output.result)?;
                Ok(committed(output, vec![event]))
            }
            Err(UpgradeHandlerError::Channel(e)) => Err(e.into()),
            Err(UpgradeHandlerError::Upgrade(e)) => {
                abort_attempt(ctx, &msg.port_id, &msg.channel_id, e, Vec::new())
            }
        },
        ChannelUpgradeMsg::Confirm(msg) => match chan_upgrade_confirm::process(&*ctx, msg) {
            Ok(output) => {
                let (event, ready_to_open) =
                    chan_upgrade_confirm::write_upgrade_confirm_channel(ctx, &output.result)?;
                let mut events = vec![event];
                if ready_to_open {
                    events.push(chan_upgrade_open::write_upgrade_open_channel(
                        ctx,
                        &msg.port_id,
                        &msg.channel_id,
                    )?);
                }
                Ok(committed(output, events))
            }
            Err(UpgradeHandlerError::Channel(e)) => Err(e.into()),
            Err(UpgradeHandlerError::Upgrade(e)) => {
                abort_attempt(ctx, &msg.port_id, &msg.channel_id, e, Vec::new())
            }
        },
        ChannelUpgradeMsg::Open(msg) => {
            let output = chan_upgrade_open::process(&*ctx, msg)?;
            let event = chan_upgrade_open::write_upgrade_open_channel(
                ctx,
                &output.result.port_id,
                &output.result.channel_id,
            )?;
            Ok(committed(output, vec![event]))
        }
        ChannelUpgradeMsg::Cancel(msg) => {
            let output = chan_upgrade_cancel::process(&*ctx, msg)?;
            let event = chan_upgrade_cancel::write_upgrade_cancel_channel(ctx, &output.result)?;
            Ok(committed(output, vec![event]))
        }
        ChannelUpgradeMsg::Timeout(msg) => {
            let output = chan_upgrade_timeout::process(&*ctx, msg)?;
            let event =
                chan_upgrade_timeout::write_upgrade_timeout_channel(ctx, &output.result)?;
            Ok(committed(output, vec![event]))
        }
    }
}

fn committed<T>(output: HandlerOutput<T>, events: Vec<IbcEvent>) -> HandlerOutput<UpgradeOutcome> {
    HandlerOutput::builder()
        .with_log(output.log)
        .with_events(output.events)
        .with_events(events)
        .with_result(UpgradeOutcome::Success)
}

fn abort_attempt<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
    error: UpgradeError,
    events: Vec<IbcEvent>,
) -> HandlerResult<UpgradeOutcome, DispatchError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let aborted = abort::abort_upgrade(ctx, port_id, channel_id, error.into())?;

    Ok(HandlerOutput::builder()
        .with_events(events)
        .with_log(aborted.log)
        .with_events(aborted.events)
        .with_result(UpgradeOutcome::Aborted(aborted.result)))
}
