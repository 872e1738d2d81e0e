//! Per-identity key storage with an atomic one-time-prekey ledger.
//!
//! A `KeyStore` is an explicit handle, passed by reference, so multiple
//! identities can coexist in one process and tests stay deterministic.
//! The one-time-prekey maps are the consumption ledger: `take_*` removes
//! the key under a mutex, so concurrent session establishments can never
//! be handed the same prekey id twice.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::error::Result;
use crate::keys::{
    EcKeyPair, OneTimePreKey, PqOneTimePreKey, PqSignedPreKey, PreKeyId, ReceiverKeys,
    SignedPreKey,
};
use crate::params::ProtocolParams;
use crate::protocol::PreKeyBundle;

pub struct KeyStore {
    identity: EcKeyPair,
    signed_prekey: SignedPreKey,
    pq_signed_prekey: PqSignedPreKey,
    one_time_prekeys: Mutex<HashMap<PreKeyId, OneTimePreKey>>,
    pq_one_time_prekeys: Mutex<HashMap<PreKeyId, PqOneTimePreKey>>,
}

impl KeyStore {
    /// Build a store from a freshly generated receiver key set
    pub fn new(keys: ReceiverKeys) -> Self {
        let mut one_time_prekeys = HashMap::new();
        one_time_prekeys.insert(keys.one_time_prekey.id.clone(), keys.one_time_prekey);

        let mut pq_one_time_prekeys = HashMap::new();
        pq_one_time_prekeys.insert(keys.pq_one_time_prekey.id.clone(), keys.pq_one_time_prekey);

        KeyStore {
            identity: keys.identity,
            signed_prekey: keys.signed_prekey,
            pq_signed_prekey: keys.pq_signed_prekey,
            one_time_prekeys: Mutex::new(one_time_prekeys),
            pq_one_time_prekeys: Mutex::new(pq_one_time_prekeys),
        }
    }

    pub fn identity(&self) -> &EcKeyPair {
        &self.identity
    }

    pub fn signed_prekey(&self) -> &SignedPreKey {
        &self.signed_prekey
    }

    pub fn pq_signed_prekey(&self) -> &PqSignedPreKey {
        &self.pq_signed_prekey
    }

    /// Replace the signed prekey (periodic rotation, caller-driven)
    pub fn rotate_signed_prekey(&mut self, prekey: SignedPreKey) -> SignedPreKey {
        std::mem::replace(&mut self.signed_prekey, prekey)
    }

    /// Replace the PQ signed prekey
    pub fn rotate_pq_signed_prekey(&mut self, prekey: PqSignedPreKey) -> PqSignedPreKey {
        std::mem::replace(&mut self.pq_signed_prekey, prekey)
    }

    /// Add replenished one-time prekeys to the ledger
    pub fn add_one_time_prekeys(&self, prekeys: impl IntoIterator<Item = OneTimePreKey>) {
        let mut ledger = self.one_time_prekeys.lock().expect("opk ledger poisoned");
        for prekey in prekeys {
            ledger.insert(prekey.id.clone(), prekey);
        }
    }

    /// Add replenished PQ one-time prekeys to the ledger
    pub fn add_pq_one_time_prekeys(&self, prekeys: impl IntoIterator<Item = PqOneTimePreKey>) {
        let mut ledger = self
            .pq_one_time_prekeys
            .lock()
            .expect("pq opk ledger poisoned");
        for prekey in prekeys {
            ledger.insert(prekey.id.clone(), prekey);
        }
    }

    /// Atomically consume a one-time prekey
    ///
    /// Check-and-delete under the ledger mutex: for a given id, exactly one
    /// caller ever receives `Some`, every later caller gets `None`.
    pub fn take_one_time_prekey(&self, id: &PreKeyId) -> Option<OneTimePreKey> {
        let taken = self
            .one_time_prekeys
            .lock()
            .expect("opk ledger poisoned")
            .remove(id);
        if taken.is_some() {
            debug!("one-time prekey {id} consumed");
        }
        taken
    }

    /// Atomically consume a PQ one-time prekey
    pub fn take_pq_one_time_prekey(&self, id: &PreKeyId) -> Option<PqOneTimePreKey> {
        let taken = self
            .pq_one_time_prekeys
            .lock()
            .expect("pq opk ledger poisoned")
            .remove(id);
        if taken.is_some() {
            debug!("pq one-time prekey {id} consumed");
        }
        taken
    }

    /// Remaining (unconsumed) one-time prekey count
    pub fn one_time_prekey_count(&self) -> usize {
        self.one_time_prekeys.lock().expect("opk ledger poisoned").len()
    }

    /// Build the publishable prekey bundle
    ///
    /// Prefers an available PQ one-time prekey over the PQ signed prekey,
    /// without consuming it; consumption happens when the directory
    /// reports which id a session actually used. Signature bytes over the
    /// signed prekeys are produced by the signing collaborator and carried
    /// opaquely.
    pub fn prekey_bundle(
        &self,
        params: &ProtocolParams,
        signed_prekey_signature: Vec<u8>,
        pq_prekey_signature: Vec<u8>,
    ) -> Result<PreKeyBundle> {
        let (one_time_prekey, one_time_prekey_id) = {
            let ledger = self.one_time_prekeys.lock().expect("opk ledger poisoned");
            match ledger.values().next() {
                Some(prekey) => (
                    Some(params.encode_ec_public(&prekey.key.public)?),
                    Some(prekey.id.clone()),
                ),
                None => (None, None),
            }
        };

        let (pq_prekey, pq_prekey_id) = {
            let ledger = self
                .pq_one_time_prekeys
                .lock()
                .expect("pq opk ledger poisoned");
            match ledger.values().next() {
                Some(prekey) => (
                    params.encode_kem_public(&prekey.key.public)?,
                    prekey.id.clone(),
                ),
                None => (
                    params.encode_kem_public(&self.pq_signed_prekey.key.public)?,
                    self.pq_signed_prekey.id.clone(),
                ),
            }
        };

        Ok(PreKeyBundle {
            identity_key: params.encode_ec_public(&self.identity.public)?,
            signed_prekey: params.encode_ec_public(&self.signed_prekey.key.public)?,
            signed_prekey_id: self.signed_prekey.id.clone(),
            signed_prekey_signature,
            one_time_prekey,
            one_time_prekey_id,
            pq_prekey,
            pq_prekey_id,
            pq_prekey_signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::keys::create_receiver_keys;

    fn fresh_store() -> (KeyStore, PreKeyId, PreKeyId) {
        let params = ProtocolParams::v1();
        let keys = create_receiver_keys(&params).unwrap();
        let opk_id = keys.one_time_prekey.id.clone();
        let pq_opk_id = keys.pq_one_time_prekey.id.clone();
        (KeyStore::new(keys), opk_id, pq_opk_id)
    }

    #[test]
    fn test_take_returns_prekey_exactly_once() {
        let (store, opk_id, _) = fresh_store();

        assert!(store.take_one_time_prekey(&opk_id).is_some());
        assert!(store.take_one_time_prekey(&opk_id).is_none());
        assert_eq!(store.one_time_prekey_count(), 0);
    }

    #[test]
    fn test_unknown_id_yields_none() {
        let (store, _, _) = fresh_store();
        assert!(store.take_one_time_prekey(&PreKeyId::generate()).is_none());
    }

    #[test]
    fn test_concurrent_take_hands_out_single_winner() {
        let (store, opk_id, _) = fresh_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = opk_id.clone();
                thread::spawn(move || store.take_one_time_prekey(&id).is_some())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_bundle_prefers_pq_one_time_prekey() {
        let (store, _, pq_opk_id) = fresh_store();
        let params = ProtocolParams::v1();

        let bundle = store
            .prekey_bundle(&params, vec![0xAA; 64], vec![0xBB; 64])
            .unwrap();
        assert_eq!(bundle.pq_prekey_id, pq_opk_id);

        // Once the PQ one-time prekey is consumed, fall back to the signed one
        store.take_pq_one_time_prekey(&pq_opk_id).unwrap();
        let fallback = store
            .prekey_bundle(&params, vec![0xAA; 64], vec![0xBB; 64])
            .unwrap();
        assert_eq!(fallback.pq_prekey_id, store.pq_signed_prekey().id);
    }

    #[test]
    fn test_bundle_wire_roundtrip() {
        let (store, _, _) = fresh_store();
        let params = ProtocolParams::v1();

        let bundle = store
            .prekey_bundle(&params, vec![1; 64], vec![2; 64])
            .unwrap();
        let bytes = bundle.to_bytes().unwrap();
        let restored = PreKeyBundle::from_bytes(&bytes).unwrap();

        assert_eq!(restored.identity_key, bundle.identity_key);
        assert_eq!(restored.signed_prekey_id, bundle.signed_prekey_id);
        assert_eq!(restored.pq_prekey, bundle.pq_prekey);
        assert_eq!(restored.one_time_prekey_id, bundle.one_time_prekey_id);
    }

    #[test]
    fn test_replenished_prekeys_are_consumable() {
        let (store, opk_id, _) = fresh_store();
        store.take_one_time_prekey(&opk_id).unwrap();

        let params = ProtocolParams::v1();
        let extra = crate::keys::OneTimePreKey {
            id: PreKeyId::generate(),
            key: crate::keys::generate_ec_keypair(params.curve).unwrap(),
        };
        let extra_id = extra.id.clone();

        store.add_one_time_prekeys([extra]);
        assert_eq!(store.one_time_prekey_count(), 1);
        assert!(store.take_one_time_prekey(&extra_id).is_some());
    }
}
