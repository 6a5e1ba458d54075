//! Verification of the counterparty state claimed by upgrade handshake messages.

use crate::core::ics02_client::client_def::ClientDef;
use crate::core::ics02_client::consensus_state::ConsensusState;
use crate::core::ics02_client::error::Error as ClientError;
use crate::core::ics03_connection::connection::ConnectionEnd;
use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::context::ChannelReader;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::core::ics23_commitment::commitment::CommitmentProofBytes;
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::prelude::*;
use crate::timestamp::Timestamp;
use crate::Height;

/// Resolves the light client tracking the counterparty of `connection_end`, together
/// with the consensus state it recorded at `height`.
fn counterparty_client<'a>(
    ctx: &'a dyn ChannelReader,
    connection_end: &ConnectionEnd,
    height: Height,
) -> Result<(&'a dyn ClientDef, ConsensusState), Error> {
    // This is the client which will perform proof verification.
    let client_id = connection_end.client_id();
    let client_type = client_id
        .client_type()
        .map_err(|e| Error::ics02_client(ClientError::invalid_client_identifier(e)))?;
    let client_def = ctx.client_def(client_type)?;

    let consensus_state = ctx.client_consensus_state(client_id, height)?;

    Ok((client_def, consensus_state))
}

/// The identifiers of the remote end of `channel_end`.
fn counterparty_ids(channel_end: &ChannelEnd) -> Result<(&PortId, &ChannelId), Error> {
    let counterparty = channel_end.counterparty();
    let channel_id = counterparty
        .channel_id()
        .ok_or_else(Error::missing_counterparty)?;
    Ok((counterparty.port_id(), channel_id))
}

/// Verify that the counterparty of `channel_end` committed `expected_channel` at `proof_height`.
pub fn verify_channel_state(
    ctx: &dyn ChannelReader,
    channel_end: &ChannelEnd,
    connection_end: &ConnectionEnd,
    expected_channel: &ChannelEnd,
    proof: &CommitmentProofBytes,
    proof_height: Height,
) -> Result<(), Error> {
    let (client_def, consensus_state) = counterparty_client(ctx, connection_end, proof_height)?;
    let (port_id, channel_id) = counterparty_ids(channel_end)?;

    client_def
        .verify_channel_state(
            &consensus_state,
            connection_end.counterparty().prefix(),
            proof,
            port_id,
            channel_id,
            expected_channel,
        )
        .map_err(Error::verify_channel_failed)
}

/// Verify that the counterparty of `channel_end` holds `expected_upgrade` at `proof_height`.
pub fn verify_upgrade_proposal(
    ctx: &dyn ChannelReader,
    channel_end: &ChannelEnd,
    connection_end: &ConnectionEnd,
    expected_upgrade: &Upgrade,
    proof: &CommitmentProofBytes,
    proof_height: Height,
) -> Result<(), Error> {
    let (client_def, consensus_state) = counterparty_client(ctx, connection_end, proof_height)?;
    let (port_id, channel_id) = counterparty_ids(channel_end)?;

    client_def
        .verify_channel_upgrade(
            &consensus_state,
            connection_end.counterparty().prefix(),
            proof,
            port_id,
            channel_id,
            expected_upgrade,
        )
        .map_err(Error::verify_upgrade_failed)
}

pub fn verify_error_receipt(
    ctx: &dyn ChannelReader,
    channel_end: &ChannelEnd,
    connection_end: &ConnectionEnd,
    expected_receipt: &ErrorReceipt,
    proof: &CommitmentProofBytes,
    proof_height: Height,
) -> Result<(), Error> {
    let (client_def, consensus_state) = counterparty_client(ctx, connection_end, proof_height)?;
    let (port_id, channel_id) = counterparty_ids(channel_end)?;

    client_def
        .verify_channel_upgrade_error(
            &consensus_state,
            connection_end.counterparty().prefix(),
            proof,
            port_id,
            channel_id,
            expected_receipt,
        )
        .map_err(Error::verify_error_receipt_failed)
}

pub fn verify_error_receipt_absence(
    ctx: &dyn ChannelReader,
    channel_end: &ChannelEnd,
    connection_end: &ConnectionEnd,
    proof: &CommitmentProofBytes,
    proof_height: Height,
) -> Result<(), Error> {
    let (client_def, consensus_state) = counterparty_client(ctx, connection_end, proof_height)?;
    let (port_id, channel_id) = counterparty_ids(channel_end)?;

    client_def
        .verify_channel_upgrade_error_absence(
            &consensus_state,
            connection_end.counterparty().prefix(),
            proof,
            port_id,
            channel_id,
        )
        .map_err(Error::verify_error_receipt_absence_failed)
}

/// The counterparty block time at `height`, as recorded by the client of `connection_end`.
pub fn get_timestamp_at_height(
    ctx: &dyn ChannelReader,
    connection_end: &ConnectionEnd,
    height: Height,
) -> Result<Timestamp, Error> {
    let (client_def, consensus_state) = counterparty_client(ctx, connection_end, height)?;

    client_def
        .timestamp_at_height(&consensus_state)
        .map_err(Error::ics02_client)
}
