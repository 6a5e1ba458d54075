//! Committing an outbound packet. The commitments written here are what a channel
//! upgrade waits on while flushing.

use tracing::debug;

use crate::core::ics04_channel::channel::{Counterparty, State};
use crate::core::ics04_channel::commitment::{compute_packet_commitment, PacketCommitment};
use crate::core::ics04_channel::context::{ChannelKeeper, ChannelReader};
use crate::core::ics04_channel::error::{Error, FatalError};
use crate::core::ics04_channel::events::SendPacket;
use crate::core::ics04_channel::packet::{Packet, Sequence};
use crate::core::ics24_host::identifier::{ChannelId, PortId};
use crate::events::IbcEvent;
use crate::handler::{HandlerOutput, HandlerResult};
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendPacketResult {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub seq: Sequence,
    pub seq_number: Sequence,
    pub commitment: PacketCommitment,
}

pub fn process(ctx: &dyn ChannelReader, packet: &Packet) -> HandlerResult<SendPacketResult, Error> {
    let mut output = HandlerOutput::builder();

    packet.validate_basic()?;

    let port_channel_id = (packet.source_port.clone(), packet.source_channel.clone());
    let source_channel_end = ctx.channel_end(&port_channel_id)?;

    // Sending is blocked for the whole duration of an upgrade flush.
    if !source_channel_end.state_matches(&State::Open) {
        return Err(Error::invalid_channel_state(
            packet.source_channel.clone(),
            *source_channel_end.state(),
        ));
    }

    let counterparty = Counterparty::new(
        packet.destination_port.clone(),
        Some(packet.destination_channel.clone()),
    );

    if !source_channel_end.counterparty_matches(&counterparty) {
        return Err(Error::invalid_packet_counterparty(
            packet.destination_port.clone(),
            packet.destination_channel.clone(),
        ));
    }

    let next_seq_send = ctx.get_next_sequence_send(&port_channel_id)?;

    if packet.sequence != next_seq_send {
        return Err(Error::invalid_packet_sequence(
            packet.sequence,
            next_seq_send,
        ));
    }

    output.log(format!(
        "packet {} committed on ({}, {})",
        packet.sequence, packet.source_port, packet.source_channel
    ));

    let result = SendPacketResult {
        port_id: packet.source_port.clone(),
        channel_id: packet.source_channel.clone(),
        seq: packet.sequence,
        seq_number: next_seq_send.increment(),
        commitment: compute_packet_commitment(packet),
    };

    output.emit(IbcEvent::SendPacket(SendPacket {
        packet: packet.clone(),
    }));

    Ok(output.with_result(result))
}

pub fn write_send_packet<Ctx>(ctx: &mut Ctx, result: &SendPacketResult) -> Result<(), FatalError>
where
    Ctx: ChannelReader + ChannelKeeper,
{
    ctx.store_packet_commitment(
        (result.port_id.clone(), result.channel_id.clone(), result.seq),
        result.commitment.clone(),
    )
    .map_err(FatalError::store)?;
    ctx.store_next_sequence_send(
        (result.port_id.clone(), result.channel_id.clone()),
        result.seq_number,
    )
    .map_err(FatalError::store)?;

    debug!(
        port_id = %result.port_id,
        channel_id = %result.channel_id,
        sequence = %result.seq,
        "packet committed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::{process, write_send_packet};
    use crate::core::ics04_channel::channel::State;
    use crate::core::ics04_channel::context::ChannelReader;
    use crate::core::ics04_channel::handler::flush::has_in_flight_packets;
    use crate::core::ics04_channel::packet::{Packet, Sequence};
    use crate::core::ics04_channel::timeout::TimeoutHeight;
    use crate::events::IbcEvent;
    use crate::prelude::*;
    use crate::test_utils::Fixture;
    use crate::Height;

    fn packet(fixture: &Fixture, sequence: u64) -> Packet {
        Packet {
            sequence: Sequence::from(sequence),
            source_port: fixture.port_id(),
            source_channel: fixture.channel_a(),
            destination_port: fixture.port_id(),
            destination_channel: fixture.channel_b(),
            data: b"transfer".to_vec(),
            timeout_height: TimeoutHeight::At(Height::new(0, 10_000).unwrap()),
            timeout_timestamp: Default::default(),
        }
    }

    #[test]
    fn send_packet_processing() {
        struct Test {
            name: String,
            state: State,
            packet: Packet,
            want_pass: bool,
        }

        let fixture = Fixture::new();

        let mut wrong_destination = packet(&fixture, 1);
        wrong_destination.destination_channel = fixture.channel_a();

        let mut no_timeout = packet(&fixture, 1);
        no_timeout.timeout_height = TimeoutHeight::Never;

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                state: State::Open,
                packet: packet(&fixture, 1),
                want_pass: true,
            },
            Test {
                name: "Channel is flushing".to_string(),
                state: State::Flushing,
                packet: packet(&fixture, 1),
                want_pass: false,
            },
            Test {
                name: "Destination is not the counterparty".to_string(),
                state: State::Open,
                packet: wrong_destination,
                want_pass: false,
            },
            Test {
                name: "Sequence is not the next one".to_string(),
                state: State::Open,
                packet: packet(&fixture, 2),
                want_pass: false,
            },
            Test {
                name: "Packet never times out".to_string(),
                state: State::Open,
                packet: no_timeout,
                want_pass: false,
            },
        ]
        .into_iter()
        .collect();

        for test in tests {
            let ctx = fixture.chain_a().with_channel(
                fixture.port_id(),
                fixture.channel_a(),
                fixture.channel_end_a(test.state, Sequence::from(0)),
            );
            let res = process(&ctx, &test.packet);
            match res {
                Ok(proto_output) => {
                    assert!(
                        test.want_pass,
                        "send_packet: test passed but was supposed to fail for test: {}, \nparams {:?} {:?}",
                        test.name,
                        test.packet.clone(),
                        ctx.clone()
                    );
                    assert_eq!(
                        proto_output.log,
                        vec![format!(
                            "packet {} committed on ({}, {})",
                            test.packet.sequence, fixture.port_id(), fixture.channel_a()
                        )],
                        "{}",
                        test.name
                    );
                    assert!(!proto_output.events.is_empty());
                    for e in proto_output.events.iter() {
                        assert!(matches!(e, &IbcEvent::SendPacket(_)));
                    }
                }
                Err(e) => {
                    assert!(
                        !test.want_pass,
                        "send_packet: did not pass test: {}, \nparams {:?} {:?} error: {:?}",
                        test.name,
                        test.packet.clone(),
                        ctx.clone(),
                        e,
                    );
                }
            }
        }
    }

    #[test]
    fn sent_packets_are_in_flight() {
        let fixture = Fixture::new();
        let mut ctx = fixture.chain_a().with_channel(
            fixture.port_id(),
            fixture.channel_a(),
            fixture.channel_end_a(State::Open, Sequence::from(0)),
        );
        let key = (fixture.port_id(), fixture.channel_a());

        let output = process(&ctx, &packet(&fixture, 1)).unwrap();
        write_send_packet(&mut ctx, &output.result).unwrap();

        assert!(has_in_flight_packets(&ctx, &key.0, &key.1));
        assert_eq!(ctx.get_next_sequence_send(&key).unwrap(), Sequence::from(2));
        assert_eq!(ctx.packet_commitment_sequences(&key), vec![Sequence::from(1)]);
    }
}
