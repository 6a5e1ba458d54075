use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::ics04_channel::channel::ChannelEnd;
use crate::core::ics04_channel::packet::Packet;
use crate::core::ics04_channel::upgrade::{ErrorReceipt, Upgrade};
use crate::prelude::*;

/// Packet commitment
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketCommitment(Vec<u8>);

impl PacketCommitment {
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PacketCommitment {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Commits to the fields of a packet the receiving end needs to prove:
/// `sha256(timeout_timestamp || timeout_revision_number || timeout_revision_height || sha256(data))`,
/// with every integer in big-endian form.
pub fn compute_packet_commitment(packet: &Packet) -> PacketCommitment {
    let mut hash_input = packet.timeout_timestamp.as_nanoseconds().to_be_bytes().to_vec();

    let revision_number = packet.timeout_height.commitment_revision_number().to_be_bytes();
    hash_input.append(&mut revision_number.to_vec());

    let revision_height = packet.timeout_height.commitment_revision_height().to_be_bytes();
    hash_input.append(&mut revision_height.to_vec());

    let packet_data_hash = Sha256::digest(&packet.data);
    hash_input.append(&mut packet_data_hash.to_vec());

    Sha256::digest(&hash_input).to_vec().into()
}

/// A record one chain commits to its store and the other proves membership of.
/// Both ends must agree on the bytes, so the encoding is canonical JSON.
pub trait CommittedValue: Serialize {
    fn encode_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl CommittedValue for ChannelEnd {}

impl CommittedValue for Upgrade {}

impl CommittedValue for ErrorReceipt {}
