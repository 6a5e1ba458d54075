//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeOpen`.

use tracing::info;

use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError};
use crate::core::ics04_channel::events::{UpgradeAttributes, UpgradeOpen};
use crate::core::ics04_channel::handler::verify::verify_channel_state;
use crate::core::ics04_channel::msgs::chan_upgrade_open::MsgChannelUpgradeOpen;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeOpenResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
}

pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeOpen,
) -> HandlerResult<UpgradeOpenResult, Error> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    let channel_end = ctx.channel_end(&port_channel_id)?;

    if !channel_end.state_matches(&State::Flushcomplete) {
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

    let upgrade_sequence = channel_end.upgrade_sequence();
    if msg.counterparty_upgrade_sequence != upgrade_sequence {
        return Err(Error::invalid_upgrade_sequence(
            upgrade_sequence,
            msg.counterparty_upgrade_sequence,
        ));
    }

    let counterparty = Counterparty::new(msg.port_id.clone(), Some(msg.channel_id.clone()));
    let expected_channel = match msg.counterparty_channel_state {
        // The counterparty already opened with the upgraded fields.
        State::Open => {
            let upgrade_connection_id = upgrade
                .fields
                .connection_hop()
                .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
            let upgrade_connection = ctx.connection_end(upgrade_connection_id)?;
            let counterparty_connection_id =
                upgrade_connection.counterparty().connection_id().ok_or_else(|| {
                    Error::undefined_connection_counterparty(upgrade_connection_id.clone())
                })?;

            ChannelEnd::new(
                State::Open,
                upgrade.fields.ordering,
                counterparty,
                vec![counterparty_connection_id.clone()],
                upgrade.fields.version.clone(),
                upgrade_sequence,
            )
        }
        State::Flushcomplete => {
            let counterparty_connection_id = connection_end
                .counterparty()
                .connection_id()
                .ok_or_else(|| Error::undefined_connection_counterparty(connection_id.clone()))?;

            ChannelEnd::new(
                State::Flushcomplete,
                *channel_end.ordering(),
                counterparty,
                vec![counterparty_connection_id.clone()],
                channel_end.version().clone(),
                upgrade_sequence,
            )
        }
        state => return Err(Error::invalid_counterparty_channel_state(state)),
    };

    verify_channel_state(
        ctx,
        &channel_end,
        &connection_end,
        &expected_channel,
        &msg.proof_channel,
        msg.proof_height,
    )?;

    output.log(format!(
        "channel ({}, {}) ready to open with upgrade {}",
        msg.port_id, msg.channel_id, upgrade_sequence
    ));

    Ok(output.with_result(UpgradeOpenResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
    }))
}

/// Switches the channel to its upgraded fields and reopens it. The proposals of this
/// attempt and the receipt of any earlier aborted attempt are discarded.
pub fn write_upgrade_open_channel<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (port_id.clone(), channel_id.clone());

    let mut channel_end = ctx
        .channel_end(&port_channel_id)
        .map_err(|e| FatalError::invariant_violated(port_id.clone(), channel_id.clone(), e))?;
    let upgrade = ctx.upgrade(&port_channel_id).ok_or_else(|| {
        FatalError::invariant_violated(
            port_id.clone(),
            channel_id.clone(),
            Error::upgrade_not_found(port_id.clone(), channel_id.clone()),
        )
    })?;

    let previous_fields = channel_end.upgrade_fields();
    channel_end.apply_upgrade_fields(&upgrade.fields);
    channel_end.set_state(State::Open);

    ctx.store_channel(port_channel_id.clone(), &channel_end)
        .map_err(FatalError::store)?;
    ctx.delete_upgrade_info(port_channel_id.clone())
        .map_err(FatalError::store)?;
    ctx.delete_upgrade_error_receipt(port_channel_id)
        .map_err(FatalError::store)?;

    info!(
        %port_id,
        %channel_id,
        previous = %previous_fields,
        upgraded = %upgrade.fields,
        upgrade_sequence = %channel_end.upgrade_sequence(),
        "channel upgrade open"
    );

    Ok(UpgradeOpen(UpgradeAttributes::new(
        port_id.clone(),
        channel_id.clone(),
        &channel_end,
        &upgrade.fields,
    ))
    .into())
}
