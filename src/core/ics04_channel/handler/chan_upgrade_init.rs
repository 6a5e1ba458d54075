//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeInit`.

use tracing::info;

use crate::core::ics04_channel::channel::{ChannelEnd, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError};
use crate::core::ics04_channel::events::{UpgradeAttributes, UpgradeInit};
use crate::core::ics04_channel::msgs::chan_upgrade_init::MsgChannelUpgradeInit;
use crate::core::ics04_channel::timeout::UpgradeTimeout;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeInitResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The channel with its upgrade sequence bumped. Its state is still `Open`.
    pub channel_end: ChannelEnd,
    pub upgrade: Upgrade,
}

pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeInit,
) -> HandlerResult<UpgradeInitResult, Error> {
    let mut output = HandlerOutput::builder();

    let channel_end = ctx.channel_end(&(msg.port_id.clone(), msg.channel_id.clone()))?;

    let result = init_upgrade(
        ctx,
        &msg.port_id,
        &msg.channel_id,
        channel_end,
        msg.fields.clone(),
        msg.timeout,
    )?;

    output.log(format!(
        "upgrade {} of channel ({}, {}) proposed: {}",
        result.channel_end.upgrade_sequence(),
        msg.port_id,
        msg.channel_id,
        result.upgrade.fields
    ));

    Ok(output.with_result(result))
}

/// Validates a proposal against the current channel and starts a new upgrade attempt
/// for it. Shared with the Try step, which proposes an upgrade of its own when the
/// counterparty's proposal is the first one it hears of.
pub(crate) fn init_upgrade(
    ctx: &dyn ChannelReader,
    port_id: &PortId,
    channel_id: &ChannelId,
    mut channel_end: ChannelEnd,
    fields: UpgradeFields,
    timeout: Option<UpgradeTimeout>,
) -> Result<UpgradeInitResult, Error> {
    if !channel_end.state_matches(&State::Open) {
        return Err(Error::invalid_channel_state(
            channel_id.clone(),
            *channel_end.state(),
        ));
    }

    validate_self_upgrade_fields(ctx, &channel_end, &fields)?;

    channel_end.set_upgrade_sequence(channel_end.upgrade_sequence().increment());

    Ok(UpgradeInitResult {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        channel_end,
        upgrade: Upgrade::new(fields, timeout, Default::default()),
    })
}

/// The proposed fields must be well formed, change something, and the proposed
/// connection must be open and support the proposed ordering.
fn validate_self_upgrade_fields(
    ctx: &dyn ChannelReader,
    channel_end: &ChannelEnd,
    fields: &UpgradeFields,
) -> Result<(), Error> {
    fields.validate_basic()?;

    if channel_end.upgrade_fields() == *fields {
        return Err(Error::upgrade_fields_unchanged());
    }

    let connection_id = fields
        .connection_hop()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;

    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()));
    }

    match connection_end.versions() {
        [version] => {
            if !version.is_supported_feature(fields.ordering.as_str().to_string()) {
                return Err(Error::channel_feature_not_supported_by_connection());
            }
        }
        _ => return Err(Error::invalid_version_length_connection()),
    }

    Ok(())
}

/// Persists a new upgrade attempt. The channel stays `Open`.
pub fn write_upgrade_init_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeInitResult,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (result.port_id.clone(), result.channel_id.clone());

    ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(result.port_id.clone(), result.channel_id.clone(), e)
    })?;

    ctx.store_channel(port_channel_id.clone(), &result.channel_end)
        .map_err(FatalError::store)?;
    ctx.store_upgrade(port_channel_id, &result.upgrade)
        .map_err(FatalError::store)?;

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        upgrade_sequence = %result.channel_end.upgrade_sequence(),
        "channel upgrade initialized"
    );

    Ok(UpgradeInit(UpgradeAttributes::new(
        result.port_id.clone(),
        result.channel_id.clone(),
        &result.channel_end,
        &result.upgrade.fields,
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::{process, write_upgrade_init_channel};
    use crate::core::ics03_connection::connection::State as ConnectionState;
    use crate::core::ics03_connection::version::Version as ConnectionVersion;
    use crate::core::ics04_channel::channel::{Ordering, State};
    use crate::core::ics04_channel::context::ChannelReader;
    use crate::core::ics04_channel::error::ErrorDetail;
    use crate::core::ics04_channel::msgs::chan_upgrade_init::MsgChannelUpgradeInit;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics24_host::identifier::ConnectionId;
    use crate::events::IbcEvent;
    use crate::mock::context::MockContext;
    use crate::prelude::*;
    use crate::test_utils::{
        dummy_connection_end, dummy_connection_end_with_versions, dummy_signer,
        get_dummy_upgrade_fields, Fixture,
    };

    #[test]
    fn chan_upgrade_init_msg_processing() {
        struct Test {
            name: String,
            ctx: MockContext,
            msg: MsgChannelUpgradeInit,
            want_pass: bool,
        }

        let fixture = Fixture::new();
        let port_id = fixture.port_id();
        let channel_id = fixture.channel_a();
        let upgrade_connection = fixture.upgrade_connection_a();

        let msg = MsgChannelUpgradeInit::new(
            port_id.clone(),
            channel_id.clone(),
            get_dummy_upgrade_fields(upgrade_connection.clone()),
            None,
            dummy_signer(),
        );

        let ctx = fixture.chain_a().with_channel(
            port_id.clone(),
            channel_id.clone(),
            fixture.channel_end_a(State::Open, Sequence::from(0)),
        );

        let only_unordered = dummy_connection_end_with_versions(
            ConnectionState::Open,
            0,
            Some(fixture.upgrade_connection_b()),
            vec![ConnectionVersion::new(
                "1".to_string(),
                vec![Ordering::Unordered.as_str().to_string()],
            )
            .unwrap()],
        );

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                ctx: ctx.clone(),
                msg: msg.clone(),
                want_pass: true,
            },
            Test {
                name: "Processing fails because no channel exists in the context".to_string(),
                ctx: MockContext::default(),
                msg: msg.clone(),
                want_pass: false,
            },
            Test {
                name: "Processing fails because the channel is already flushing".to_string(),
                ctx: fixture.chain_a().with_channel(
                    port_id.clone(),
                    channel_id.clone(),
                    fixture.channel_end_a(State::Flushing, Sequence::from(1)),
                ),
                msg: msg.clone(),
                want_pass: false,
            },
            Test {
                name: "Processing fails because the proposed connection does not exist".to_string(),
                ctx: ctx.clone(),
                msg: MsgChannelUpgradeInit {
                    fields: get_dummy_upgrade_fields(ConnectionId::new(42)),
                    ..msg.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Processing fails because the proposed connection is not open".to_string(),
                ctx: ctx.clone().with_connection(
                    upgrade_connection.clone(),
                    dummy_connection_end(
                        ConnectionState::Init,
                        0,
                        Some(fixture.upgrade_connection_b()),
                    ),
                ),
                msg: msg.clone(),
                want_pass: false,
            },
            Test {
                name: "Processing fails because the connection does not support ordered channels"
                    .to_string(),
                ctx: ctx.with_connection(upgrade_connection, only_unordered),
                msg,
                want_pass: false,
            },
        ];

        for test in tests {
            let res = process(&test.ctx, &test.msg);

            assert_eq!(
                test.want_pass,
                res.is_ok(),
                "chan_upgrade_init: test {} failed, \nmsg {:?} with error {:?}",
                test.name,
                test.msg,
                res.err(),
            );
        }
    }

    #[test]
    fn unchanged_fields_are_rejected() {
        let fixture = Fixture::new();
        let channel_end = fixture.channel_end_a(State::Open, Sequence::from(0));
        let ctx = fixture.chain_a().with_channel(
            fixture.port_id(),
            fixture.channel_a(),
            channel_end.clone(),
        );

        let msg = MsgChannelUpgradeInit::new(
            fixture.port_id(),
            fixture.channel_a(),
            UpgradeFields::new(
                *channel_end.ordering(),
                channel_end.connection_hops().clone(),
                channel_end.version().clone(),
            ),
            None,
            dummy_signer(),
        );

        match process(&ctx, &msg) {
            Err(e) => assert!(matches!(e.detail(), ErrorDetail::UpgradeFieldsUnchanged(_))),
            Ok(_) => panic!("an upgrade changing nothing must be rejected"),
        }

        let key = (fixture.port_id(), fixture.channel_a());
        assert_eq!(ctx.channel_end(&key).unwrap(), channel_end);
        assert!(ctx.upgrade(&key).is_none());
    }

    #[test]
    fn init_bumps_the_sequence_and_keeps_the_channel_open() {
        let fixture = Fixture::new();
        let mut ctx = fixture.chain_a().with_channel(
            fixture.port_id(),
            fixture.channel_a(),
            fixture.channel_end_a(State::Open, Sequence::from(3)),
        );

        let msg = MsgChannelUpgradeInit::new(
            fixture.port_id(),
            fixture.channel_a(),
            get_dummy_upgrade_fields(fixture.upgrade_connection_a()),
            None,
            dummy_signer(),
        );

        let output = process(&ctx, &msg).unwrap();
        let event = write_upgrade_init_channel(&mut ctx, &output.result).unwrap();

        let key = (fixture.port_id(), fixture.channel_a());
        let channel_end = ctx.channel_end(&key).unwrap();
        assert_eq!(*channel_end.state(), State::Open);
        assert_eq!(channel_end.upgrade_sequence(), Sequence::from(4));

        let upgrade = ctx.upgrade(&key).unwrap();
        assert_eq!(upgrade.fields, msg.fields);
        assert!(upgrade.timeout.is_none());
        assert_eq!(upgrade.latest_sequence_send, Sequence::from(0));

        match event {
            IbcEvent::UpgradeInitChannel(ev) => {
                assert_eq!(ev.upgrade_sequence(), Sequence::from(4));
                assert_eq!(ev.attributes().upgrade_ordering, Ordering::Ordered);
            }
            other => panic!("unexpected event {other}"),
        }
    }
}
