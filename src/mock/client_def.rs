use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::core::ics02_client::client_def::ClientDef;
use crate::core::ics02_client::client_type::ClientType;
use crate::core::ics02_client::error::Error;
use crate::core::ics23_commitment::commitment::{
    CommitmentPrefix, CommitmentProofBytes, CommitmentRoot,
};
use crate::core::ics24_host::Path;
use crate::prelude::*;

/// The committed part of a mock host store: every prefixed key maps to the sha256 digest
/// of the value written under it.
pub type MockStore = BTreeMap<String, Vec<u8>>;

/// A light client for mock hosts. A proof is the JSON encoding of the whole committed
/// store, and the commitment root is the sha256 digest of that encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MockClient;

impl MockClient {
    fn decode_store(
        proof: &CommitmentProofBytes,
        root: &CommitmentRoot,
    ) -> Result<MockStore, Error> {
        if Sha256::digest(proof.as_bytes()).as_slice() != root.as_bytes() {
            return Err(Error::proof_root_mismatch());
        }

        serde_json::from_slice(proof.as_bytes())
            .map_err(|e| Error::invalid_proof_encoding(e.to_string()))
    }
}

impl ClientDef for MockClient {
    fn client_type(&self) -> ClientType {
        ClientType::Mock
    }

    fn verify_membership(
        &self,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        root: &CommitmentRoot,
        path: Path,
        value: Vec<u8>,
    ) -> Result<(), Error> {
        let store = Self::decode_store(proof, root)?;
        let key = prefix.apply(&path.to_string());

        match store.get(&key) {
            Some(digest) if digest.as_slice() == Sha256::digest(&value).as_slice() => Ok(()),
            _ => Err(Error::membership_verification_failed(key)),
        }
    }

    fn verify_non_membership(
        &self,
        prefix: &CommitmentPrefix,
        proof: &CommitmentProofBytes,
        root: &CommitmentRoot,
        path: Path,
    ) -> Result<(), Error> {
        let store = Self::decode_store(proof, root)?;
        let key = prefix.apply(&path.to_string());

        if store.contains_key(&key) {
            Err(Error::non_membership_verification_failed(key))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::{MockClient, MockStore};
    use crate::core::ics02_client::client_def::ClientDef;
    use crate::core::ics02_client::error::ErrorDetail;
    use crate::core::ics23_commitment::commitment::{
        CommitmentPrefix, CommitmentProofBytes, CommitmentRoot,
    };
    use crate::core::ics24_host::identifier::{ChannelId, PortId};
    use crate::core::ics24_host::path::{ChannelEndPath, ChannelUpgradeErrorPath};
    use crate::prelude::*;
    use sha2::{Digest, Sha256};

    fn snapshot(store: &MockStore) -> (CommitmentProofBytes, CommitmentRoot) {
        let bytes = serde_json::to_vec(store).unwrap();
        let root = CommitmentRoot::from_bytes(&Sha256::digest(&bytes));
        (CommitmentProofBytes::try_from(bytes).unwrap(), root)
    }

    #[test]
    fn membership_is_checked_against_the_committed_digest() {
        let prefix = CommitmentPrefix::try_from(b"ibc".to_vec()).unwrap();
        let path = ChannelEndPath(PortId::transfer(), ChannelId::new(0));

        let mut store = MockStore::new();
        store.insert(
            prefix.apply(&path.to_string()),
            Sha256::digest(b"committed").to_vec(),
        );
        let (proof, root) = snapshot(&store);

        let client = MockClient;
        assert!(client
            .verify_membership(&prefix, &proof, &root, path.clone().into(), b"committed".to_vec())
            .is_ok());

        let res = client.verify_membership(&prefix, &proof, &root, path.into(), b"forged".to_vec());
        assert!(matches!(
            res.unwrap_err().detail(),
            ErrorDetail::MembershipVerificationFailed(_)
        ));

        let absent = ChannelUpgradeErrorPath(PortId::transfer(), ChannelId::new(0));
        assert!(client
            .verify_non_membership(&prefix, &proof, &root, absent.into())
            .is_ok());
    }

    #[test]
    fn proofs_must_match_the_trusted_root() {
        let prefix = CommitmentPrefix::try_from(b"ibc".to_vec()).unwrap();
        let (proof, _) = snapshot(&MockStore::new());
        let other_root = CommitmentRoot::from_bytes(&Sha256::digest(b"another store"));

        let path = ChannelUpgradeErrorPath(PortId::transfer(), ChannelId::new(0));
        let res = MockClient.verify_non_membership(&prefix, &proof, &other_root, path.into());
        assert!(matches!(
            res.unwrap_err().detail(),
            ErrorDetail::ProofRootMismatch(_)
        ));
    }
}
