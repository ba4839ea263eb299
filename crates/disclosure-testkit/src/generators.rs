//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use disclosure_core::{Keypair, LocalIdentity, PublicKey, RequestState};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random identity.
pub fn identity() -> impl Strategy<Value = LocalIdentity> {
    keypair().prop_map(LocalIdentity::new)
}

/// Generate a random public key.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a lowercase field name.
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

/// Generate `name` with each letter's case chosen at random.
pub fn case_variant(name: String) -> impl Strategy<Value = String> {
    let len = name.chars().count();
    prop::collection::vec(any::<bool>(), len).prop_map(move |upper| {
        name.chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

/// Generate a field value, including non-ASCII text.
pub fn field_value() -> impl Strategy<Value = String> {
    "\\PC{0,48}"
}

/// Generate a profile of 1 to `max_fields` fields.
pub fn profile(max_fields: usize) -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(field_name(), field_value(), 1..=max_fields.max(1))
}

/// Generate a non-empty list of distinct field names.
pub fn field_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(field_name(), 1..=max.max(1))
        .prop_map(|names| names.into_iter().collect())
}

/// Generate a RequestState.
pub fn request_state() -> impl Strategy<Value = RequestState> {
    prop_oneof![
        Just(RequestState::Await),
        Just(RequestState::Accept),
        Just(RequestState::Reject),
    ]
}
