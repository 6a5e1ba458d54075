//! Tracking of the packets that must be resolved before an upgraded channel can open.

use tracing::debug;

use crate::core::ics04_channel::channel::{ChannelEnd, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError};
use crate::core::ics04_channel::handler::abort::abort_upgrade;
use crate::core::ics04_channel::handler::DispatchError;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

/// What a re-evaluation of a flushing channel led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushRefresh {
    /// Still waiting on in-flight packets or on the counterparty.
    Unchanged,
    /// Every packet is resolved; the channel is now `Flushcomplete`.
    Complete,
    /// The counterparty deadline passed before the packets were resolved.
    Aborted(ErrorReceipt),
}

/// Moves the channel to `Flushing`. Packets sent up to now must be resolved before the
/// upgrade completes, and the upgrade gets a deadline relative to the host chain.
pub fn start_flushing(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
    channel_end: &mut ChannelEnd,
    upgrade: &mut Upgrade,
) -> Result<(), Error> {
    let connection_id = channel_end
        .connection_hops()
        .first()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;
    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()));
    }

    let next_sequence_send = ctx.get_next_sequence_send(&(port_id.clone(), channel_id.clone()))?;

    channel_end.set_state(State::Flushing);
    upgrade.latest_sequence_send = next_sequence_send.decrement();
    upgrade.timeout = Some(
        ctx.channel_params()
            .upgrade_timeout_at(ctx.host_height(), ctx.host_timestamp())?,
    );

    Ok(())
}

pub fn has_in_flight_packets(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> bool {
    !ctx.packet_commitment_sequences(&(port_id.clone(), channel_id.clone()))
        .is_empty()
}

/// Fails with an upgrade error once the counterparty upgrade deadline is behind the host.
pub fn check_counterparty_timeout(
    ctx: &dyn ChannelReader,
    upgrade_sequence: Sequence,
    counterparty_upgrade: &Upgrade,
) -> Result<(), UpgradeError> {
    match &counterparty_upgrade.timeout {
        Some(timeout) if timeout.has_elapsed(ctx.host_height(), ctx.host_timestamp()) => Err(
            UpgradeError::new(upgrade_sequence, Error::upgrade_timeout_elapsed(*timeout)),
        ),
        Some(_) => Ok(()),
        None => Err(UpgradeError::new(
            upgrade_sequence,
            Error::invalid_upgrade_timeout(),
        )),
    }
}

/// Re-evaluates a flushing channel that already learned the counterparty upgrade. It
/// completes the flush when nothing is in flight anymore, and aborts the upgrade if the
/// counterparty deadline passed in the meantime.
pub fn refresh_flush_status<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> HandlerResult<FlushRefresh, DispatchError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (port_id.clone(), channel_id.clone());
    let mut channel_end = ctx
        .channel_end(&port_channel_id)
        .map_err(DispatchError::Rejected)?;

    let output = HandlerOutput::builder();

    if !channel_end.state_matches(&State::Flushing) {
        return Ok(output.with_result(FlushRefresh::Unchanged));
    }

    let counterparty_upgrade = match ctx.counterparty_upgrade(&port_channel_id) {
        Some(upgrade) => upgrade,
        None => return Ok(output.with_result(FlushRefresh::Unchanged)),
    };

    if let Err(e) = check_counterparty_timeout(
        &*ctx,
        channel_end.upgrade_sequence(),
        &counterparty_upgrade,
    ) {
        let aborted = abort_upgrade(ctx, port_id, channel_id, e.into())?;
        return Ok(aborted.map(FlushRefresh::Aborted));
    }

    if has_in_flight_packets(&*ctx, port_id, channel_id) {
        debug!(%port_id, %channel_id, "channel still has packets in flight");
        return Ok(output.with_result(FlushRefresh::Unchanged));
    }

    channel_end.set_state(State::Flushcomplete);
    ctx.store_channel(port_channel_id, &channel_end)
        .map_err(FatalError::store)?;

    debug!(%port_id, %channel_id, "channel finished flushing");

    let mut output = output;
    output.log(format!(
        "channel ({port_id}, {channel_id}) finished flushing"
    ));
    Ok(output.with_result(FlushRefresh::Complete))
}

/// Removes the commitment of an acknowledged or timed out packet, then re-evaluates
/// the flush status of the channel.
pub fn resolve_packet_commitment<Ctx>(
    ctx: &mut Ctx,
    port_id: &PortId,
    channel_id: &ChannelId,
    sequence: Sequence,
) -> HandlerResult<FlushRefresh, DispatchError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    ctx.delete_packet_commitment((port_id.clone(), channel_id.clone(), sequence))
        .map_err(FatalError::store)?;

    refresh_flush_status(ctx, port_id, channel_id)
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use test_log::test;

    use super::{has_in_flight_packets, refresh_flush_status, resolve_packet_commitment, start_flushing, FlushRefresh};
    use crate::core::ics04_channel::channel::State;
    use crate::core::ics04_channel::context::ChannelReader;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::params::{Params, UpgradeTimeoutParams};
    use crate::core::ics04_channel::timeout::{TimeoutHeight, UpgradeTimeout};
    use crate::core::ics04_channel::upgrade::Upgrade;
    use crate::prelude::*;
    use crate::test_utils::{dummy_upgrade, Fixture};
    use crate::Height;

    #[test]
    fn start_flushing_records_the_last_sent_packet() {
        let fixture = Fixture::new();
        let params = Params {
            upgrade_timeout: UpgradeTimeoutParams {
                height_offset: 10,
                timestamp_offset: Duration::ZERO,
            },
            authority: None,
        };
        let ctx = fixture
            .chain_a()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Open, Sequence::from(1)),
            )
            .with_next_sequence_send(fixture.port_id(), fixture.channel_a(), Sequence::from(8))
            .with_params(params);

        let mut channel_end = fixture.channel_end_a(State::Open, Sequence::from(1));
        let mut upgrade = dummy_upgrade();
        start_flushing(
            &ctx,
            &fixture.port_id(),
            &fixture.channel_a(),
            &mut channel_end,
            &mut upgrade,
        )
        .unwrap();

        assert_eq!(*channel_end.state(), State::Flushing);
        assert_eq!(upgrade.latest_sequence_send, Sequence::from(7));
        assert_eq!(
            upgrade.timeout.map(|t| t.height),
            Some(TimeoutHeight::At(ctx.host_height().add(10)))
        );
    }

    #[test]
    fn flush_completes_once_the_last_packet_is_resolved() {
        let fixture = Fixture::new();
        let counterparty_upgrade = Upgrade {
            timeout: Some(UpgradeTimeout::at_height(Height::new(0, 1_000).unwrap())),
            ..dummy_upgrade()
        };
        let mut ctx = fixture
            .chain_a()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Flushing, Sequence::from(1)),
            )
            .with_upgrade(fixture.port_id(), fixture.channel_a(), dummy_upgrade())
            .with_counterparty_upgrade(fixture.port_id(), fixture.channel_a(), counterparty_upgrade)
            .with_packet_commitment(fixture.port_id(), fixture.channel_a(), Sequence::from(1))
            .with_packet_commitment(fixture.port_id(), fixture.channel_a(), Sequence::from(2));

        let key = (fixture.port_id(), fixture.channel_a());

        let refresh = resolve_packet_commitment(&mut ctx, &key.0, &key.1, Sequence::from(1)).unwrap();
        assert_eq!(refresh.result, FlushRefresh::Unchanged);
        assert_eq!(*ctx.channel_end(&key).unwrap().state(), State::Flushing);

        let refresh = resolve_packet_commitment(&mut ctx, &key.0, &key.1, Sequence::from(2)).unwrap();
        assert_eq!(refresh.result, FlushRefresh::Complete);
        assert!(!has_in_flight_packets(&ctx, &key.0, &key.1));
        assert_eq!(*ctx.channel_end(&key).unwrap().state(), State::Flushcomplete);
    }

    #[test]
    fn flush_aborts_after_the_counterparty_deadline() {
        let fixture = Fixture::new();
        let counterparty_upgrade = Upgrade {
            timeout: Some(UpgradeTimeout::at_height(Height::new(0, 1).unwrap())),
            ..dummy_upgrade()
        };
        let mut ctx = fixture
            .chain_a()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Flushing, Sequence::from(3)),
            )
            .with_upgrade(fixture.port_id(), fixture.channel_a(), dummy_upgrade())
            .with_counterparty_upgrade(fixture.port_id(), fixture.channel_a(), counterparty_upgrade)
            .with_packet_commitment(fixture.port_id(), fixture.channel_a(), Sequence::from(1));

        let key = (fixture.port_id(), fixture.channel_a());
        let refresh = refresh_flush_status(&mut ctx, &key.0, &key.1).unwrap();

        match refresh.result {
            FlushRefresh::Aborted(receipt) => {
                assert_eq!(receipt.sequence, Sequence::from(3));
                assert_eq!(
                    receipt.message,
                    "upgrade error code: 4: restored channel to pre-upgrade state"
                );
            }
            other => panic!("expected the upgrade to be aborted, got {other:?}"),
        }
        assert_eq!(*ctx.channel_end(&key).unwrap().state(), State::Open);
        assert!(ctx.upgrade(&key).is_none());
    }

    #[test]
    fn refresh_waits_for_the_counterparty_upgrade() {
        let fixture = Fixture::new();
        let mut ctx = fixture
            .chain_a()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Flushing, Sequence::from(1)),
            )
            .with_upgrade(fixture.port_id(), fixture.channel_a(), dummy_upgrade());

        let refresh =
            refresh_flush_status(&mut ctx, &fixture.port_id(), &fixture.channel_a()).unwrap();
        assert_eq!(refresh.result, FlushRefresh::Unchanged);
    }
}
