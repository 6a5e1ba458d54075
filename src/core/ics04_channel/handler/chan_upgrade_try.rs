//! Protocol logic specific to ICS4 messages of type `MsgChannelUpgradeTry`.

use tracing::info;

use crate::core::ics04_channel::channel::{ChannelEnd, Counterparty, State};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError, UpgradeError, UpgradeHandlerError};
use crate::core::ics04_channel::events::{UpgradeAttributes, UpgradeTry};
use crate::core::ics04_channel::handler::abort::sync_upgrade_sequence;
use crate::core::ics04_channel::handler::chan_upgrade_init::{init_upgrade, UpgradeInitResult};
use crate::core::ics04_channel::handler::compatibility::check_upgrade_compatibility;
use crate::core::ics04_channel::handler::flush::start_flushing;
use crate::core::ics04_channel::handler::verify::{verify_channel_state, verify_upgrade_proposal};
use crate::core::ics04_channel::msgs::chan_upgrade_try::MsgChannelUpgradeTry;
use crate::core::ics04_channel::upgrade::Upgrade;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeTryResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    /// The channel, now `Flushing`.
    pub channel_end: ChannelEnd,
    pub upgrade: Upgrade,
}

/// Starts an upgrade attempt on this end from the counterparty proposal, unless this
/// end already proposed an upgrade of its own (crossing hellos), in which case `None`
/// is returned and the stored proposal is used.
///
/// The local upgrade sequence is first fast-forwarded to right below the counterparty
/// one, so that both ends agree on the sequence once it is incremented.
pub fn stage_init(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeTry,
) -> Result<Option<UpgradeInitResult>, Error> {
    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());
    if ctx.upgrade(&port_channel_id).is_some() {
        return Ok(None);
    }

    let mut channel_end = ctx.channel_end(&port_channel_id)?;
    if msg.counterparty_upgrade_sequence > channel_end.upgrade_sequence() {
        channel_end.set_upgrade_sequence(msg.counterparty_upgrade_sequence.decrement());
    }

    init_upgrade(
        ctx,
        &msg.port_id,
        &msg.channel_id,
        channel_end,
        msg.proposed_upgrade_fields(),
        None,
    )
    .map(Some)
}

/// Processes the Try step on top of `staged`, the output of [`stage_init`].
pub fn process(
    ctx: &dyn ChannelReader,
    msg: &MsgChannelUpgradeTry,
    staged: Option<&UpgradeInitResult>,
) -> HandlerResult<UpgradeTryResult, UpgradeHandlerError> {
    let mut output = HandlerOutput::builder();

    let port_channel_id = (msg.port_id.clone(), msg.channel_id.clone());

    let (mut channel_end, mut upgrade) = match staged {
        Some(staged) => (staged.channel_end.clone(), staged.upgrade.clone()),
        None => {
            let channel_end = ctx.channel_end(&port_channel_id)?;
            let upgrade = ctx.upgrade(&port_channel_id).ok_or_else(|| {
                Error::upgrade_not_found(msg.port_id.clone(), msg.channel_id.clone())
            })?;
            (channel_end, upgrade)
        }
    };

    if !channel_end.state_matches(&State::Open) {
        return Err(Error::invalid_channel_state(msg.channel_id.clone(), *channel_end.state()).into());
    }

    // An IBC connection running on the local (host) chain should exist.
    let connection_id = channel_end
        .connection_hops()
        .first()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;
    if !connection_end.state().is_open() {
        return Err(Error::connection_not_open(connection_id.clone()).into());
    }

    check_upgrade_compatibility(ctx, &upgrade.fields, &msg.counterparty_upgrade_fields)?;

    let counterparty_connection_id = connection_end
        .counterparty()
        .connection_id()
        .ok_or_else(|| Error::undefined_connection_counterparty(connection_id.clone()))?;

    // The counterparty has proposed the upgrade but has not started flushing yet.
    let expected_channel = ChannelEnd::new(
        State::Open,
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

    let expected_upgrade = Upgrade::new(
        msg.counterparty_upgrade_fields.clone(),
        msg.counterparty_upgrade_timeout,
        Default::default(),
    );
    verify_upgrade_proposal(
        ctx,
        &channel_end,
        &connection_end,
        &expected_upgrade,
        &msg.proof_upgrade,
        msg.proof_height,
    )?;

    let upgrade_sequence = channel_end.upgrade_sequence();
    if msg.counterparty_upgrade_sequence < upgrade_sequence {
        // The counterparty is behind: report the sequence before the current attempt
        // so that it aborts its stale proposal and catches up.
        return Err(UpgradeError::new(
            upgrade_sequence.decrement(),
            Error::invalid_upgrade_sequence(upgrade_sequence, msg.counterparty_upgrade_sequence),
        )
        .into());
    }
    if staged.is_none() {
        sync_upgrade_sequence(&channel_end, msg.counterparty_upgrade_sequence)?;
    }

    start_flushing(
        ctx,
        &msg.port_id,
        &msg.channel_id,
        &mut channel_end,
        &mut upgrade,
    )?;

    output.log(format!(
        "channel ({}, {}) accepted upgrade {} and started flushing",
        msg.port_id, msg.channel_id, upgrade_sequence
    ));

    Ok(output.with_result(UpgradeTryResult {
        port_id: msg.port_id.clone(),
        channel_id: msg.channel_id.clone(),
        channel_end,
        upgrade,
    }))
}

pub fn write_upgrade_try_channel<Ctx>(
    ctx: &mut Ctx,
    result: &UpgradeTryResult,
) -> Result<IbcEvent, FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    let port_channel_id = (result.port_id.clone(), result.channel_id.clone());

    let previous = ctx.channel_end(&port_channel_id).map_err(|e| {
        FatalError::invariant_violated(result.port_id.clone(), result.channel_id.clone(), e)
    })?;

    ctx.store_channel(port_channel_id.clone(), &result.channel_end)
        .map_err(FatalError::store)?;
    ctx.store_upgrade(port_channel_id, &result.upgrade)
        .map_err(FatalError::store)?;

    info!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        previous_state = %previous.state(),
        state = %result.channel_end.state(),
        upgrade_sequence = %result.channel_end.upgrade_sequence(),
        "channel upgrade try"
    );

    Ok(UpgradeTry(UpgradeAttributes::new(
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

    use super::{process, stage_init, write_upgrade_try_channel};
    use crate::core::ics04_channel::channel::State;
    use crate::core::ics04_channel::context::ChannelReader;
    use crate::core::ics04_channel::error::{ErrorDetail, UpgradeHandlerError};
    use crate::core::ics04_channel::msgs::chan_upgrade_try::MsgChannelUpgradeTry;
    use crate::core::ics04_channel::packet::Sequence;
    use crate::core::ics04_channel::upgrade::Upgrade;
    use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
    use crate::mock::context::MockContext;
    use crate::prelude::*;
    use crate::test_utils::{dummy_signer, Fixture};
    use crate::Height;

    /// Chain A proposed `fields_a` at sequence `sequence_a`; chain B is open at `sequence_b`.
    fn setup(
        fixture: &Fixture,
        sequence_a: u64,
        sequence_b: u64,
    ) -> (MockContext, MockContext, Height, CommitmentProofBytes) {
        let ctx_a = fixture
            .chain_a()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Open, Sequence::from(sequence_a)),
            )
            .with_upgrade(
                fixture.port_id(),
                fixture.channel_a(),
                Upgrade::new(fixture.upgrade_fields_a(), None, Sequence::from(0)),
            );
        let mut ctx_b = fixture.chain_b().with_channel(
            fixture.port_id(),
            fixture.channel_b(),
            fixture.channel_end_b(State::Open, Sequence::from(sequence_b)),
        );

        let proof_height = ctx_b.update_client_from(&fixture.client_on_b(), &ctx_a);
        let proof = ctx_a.commitment_proof();
        (ctx_a, ctx_b, proof_height, proof)
    }

    fn try_msg(
        fixture: &Fixture,
        counterparty_sequence: u64,
        proof_height: Height,
        proof: CommitmentProofBytes,
    ) -> MsgChannelUpgradeTry {
        MsgChannelUpgradeTry::new(
            fixture.port_id(),
            fixture.channel_b(),
            vec![fixture.upgrade_connection_b()],
            fixture.upgrade_fields_a(),
            None,
            Sequence::from(counterparty_sequence),
            proof.clone(),
            proof,
            proof_height,
            dummy_signer(),
        )
    }

    #[test]
    fn try_starts_flushing() {
        let fixture = Fixture::new();
        let (_, mut ctx_b, proof_height, proof) = setup(&fixture, 1, 0);
        let msg = try_msg(&fixture, 1, proof_height, proof);

        let staged = stage_init(&ctx_b, &msg).unwrap();
        assert!(staged.is_some());

        let output = process(&ctx_b, &msg, staged.as_ref()).unwrap();
        write_upgrade_try_channel(&mut ctx_b, &output.result).unwrap();

        let key = (fixture.port_id(), fixture.channel_b());
        let channel_end = ctx_b.channel_end(&key).unwrap();
        assert_eq!(*channel_end.state(), State::Flushing);
        assert_eq!(channel_end.upgrade_sequence(), Sequence::from(1));

        let upgrade = ctx_b.upgrade(&key).unwrap();
        assert_eq!(upgrade.fields, fixture.upgrade_fields_b());
        assert!(upgrade.timeout.is_some());
        assert_eq!(upgrade.latest_sequence_send, Sequence::from(0));
        assert!(ctx_b.counterparty_upgrade(&key).is_none());
    }

    #[test]
    fn try_with_a_forged_proof_is_rejected() {
        let fixture = Fixture::new();
        let (ctx_a, ctx_b, proof_height, _) = setup(&fixture, 1, 0);

        // The proof does not match what the client of chain B recorded.
        let forged = ctx_a
            .clone()
            .with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(State::Flushing, Sequence::from(1)),
            )
            .commitment_proof();
        let msg = try_msg(&fixture, 1, proof_height, forged);

        let staged = stage_init(&ctx_b, &msg).unwrap();
        match process(&ctx_b, &msg, staged.as_ref()) {
            Err(UpgradeHandlerError::Channel(e)) => {
                assert!(matches!(e.detail(), ErrorDetail::VerifyChannelFailed(_)))
            }
            other => panic!("expected a verification failure, got {other:?}"),
        }
    }

    #[test]
    fn try_with_a_stale_counterparty_sequence_is_an_upgrade_error() {
        let fixture = Fixture::new();
        let (_, ctx_b, proof_height, proof) = setup(&fixture, 1, 5);
        let msg = try_msg(&fixture, 1, proof_height, proof);

        let staged = stage_init(&ctx_b, &msg).unwrap().unwrap();
        assert_eq!(staged.channel_end.upgrade_sequence(), Sequence::from(6));

        match process(&ctx_b, &msg, Some(&staged)) {
            Err(UpgradeHandlerError::Upgrade(e)) => {
                assert_eq!(e.sequence(), Sequence::from(5));
                assert!(matches!(
                    e.cause().detail(),
                    ErrorDetail::InvalidUpgradeSequence(_)
                ));
            }
            other => panic!("expected an upgrade error, got {other:?}"),
        }

        // Nothing was written by processing alone.
        let key = (fixture.port_id(), fixture.channel_b());
        assert_eq!(
            ctx_b.channel_end(&key).unwrap().upgrade_sequence(),
            Sequence::from(5)
        );
        assert!(ctx_b.upgrade(&key).is_none());
    }

    #[test]
    fn crossing_hellos_use_the_stored_proposal() {
        let fixture = Fixture::new();
        let (_, ctx_b, proof_height, proof) = setup(&fixture, 1, 1);

        // Chain B proposed its own upgrade before hearing from chain A.
        let ctx_b = ctx_b.with_upgrade(
            fixture.port_id(),
            fixture.channel_b(),
            Upgrade::new(fixture.upgrade_fields_b(), None, Sequence::from(0)),
        );
        let mut msg = try_msg(&fixture, 1, proof_height, proof);
        // Whatever connection the relayer suggests, the stored proposal wins.
        msg.proposed_upgrade_connection_hops = vec![fixture.connection_b()];

        let staged = stage_init(&ctx_b, &msg).unwrap();
        assert!(staged.is_none());

        let output = process(&ctx_b, &msg, None).unwrap();
        assert_eq!(output.result.upgrade.fields, fixture.upgrade_fields_b());
        assert_eq!(output.result.channel_end.upgrade_sequence(), Sequence::from(1));
        assert_eq!(*output.result.channel_end.state(), State::Flushing);
    }

    #[test]
    fn crossing_hellos_with_a_counterparty_ahead_sync_sequences() {
        let fixture = Fixture::new();
        let (_, ctx_b, proof_height, proof) = setup(&fixture, 3, 1);
        let ctx_b = ctx_b.with_upgrade(
            fixture.port_id(),
            fixture.channel_b(),
            Upgrade::new(fixture.upgrade_fields_b(), None, Sequence::from(0)),
        );
        let msg = try_msg(&fixture, 3, proof_height, proof);

        match process(&ctx_b, &msg, None) {
            Err(UpgradeHandlerError::Upgrade(e)) => assert_eq!(e.sequence(), Sequence::from(3)),
            other => panic!("expected an upgrade error, got {other:?}"),
        }
    }

    #[test]
    fn try_on_a_flushing_channel_is_rejected() {
        let fixture = Fixture::new();
        let (_, ctx_b, proof_height, proof) = setup(&fixture, 1, 1);
        let ctx_b = ctx_b
            .with_channel(
                fixture.port_id(),
                fixture.channel_b(),
                fixture.channel_end_b(State::Flushing, Sequence::from(1)),
            )
            .with_upgrade(
                fixture.port_id(),
                fixture.channel_b(),
                Upgrade::new(fixture.upgrade_fields_b(), None, Sequence::from(0)),
            );
        let msg = try_msg(&fixture, 1, proof_height, proof);

        assert!(matches!(
            process(&ctx_b, &msg, None),
            Err(UpgradeHandlerError::Channel(_))
        ));
    }
}
