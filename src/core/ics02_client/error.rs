use flex_error::define_error;

use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics24_host::error::ValidationError;
use crate::core::ics24_host::identifier::ClientId;
use crate::prelude::*;
use crate::Height;

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    Error {
        UnknownClientType
            { client_type: String }
            | e | { format_args!("unknown client type: {0}", e.client_type) },

        ClientImplementationNotFound
            { client_type: ClientType }
            | e | { format_args!("no light client implementation registered for {0}", e.client_type) },

        ConsensusStateNotFound
            { client_id: ClientId, height: Height }
            | e | {
                format_args!("consensus state not found at: {0} at height {1}",
                    e.client_id, e.height)
            },

        InvalidHeight
            | _ | { "height cannot end up zero or negative" },

        InvalidClientIdentifier
            [ ValidationError ]
            | _ | { "invalid client identifier" },

        MissingConsensusTimestamp
            | _ | { "the consensus state does not carry a timestamp" },

        EncodeCommittedValue
            { reason: String }
            | e | { format_args!("failed to encode the committed value: {0}", e.reason) },

        InvalidProofEncoding
            { reason: String }
            | e | { format_args!("the commitment proof could not be decoded: {0}", e.reason) },

        ProofRootMismatch
            | _ | { "the commitment proof does not hash to the consensus state root" },

        MembershipVerificationFailed
            { path: String }
            | e | {
                format_args!("the proof does not commit to the expected value at path {0}",
                    e.path)
            },

        NonMembershipVerificationFailed
            { path: String }
            | e | {
                format_args!("the proof shows a value is committed at path {0}",
                    e.path)
            },
    }
}
