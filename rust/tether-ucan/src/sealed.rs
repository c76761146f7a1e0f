use tether_did::{Did, Keypair};

/// Placeholder for a builder field that has not been set yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unset;

#[doc(hidden)]
pub trait IssuerOrUnset {}
impl IssuerOrUnset for Unset {}
impl<K: Keypair> IssuerOrUnset for K {}

#[doc(hidden)]
pub trait DidOrUnset {}
impl DidOrUnset for Unset {}
impl DidOrUnset for Did {}

#[doc(hidden)]
pub trait ExpirationOrUnset {}
impl ExpirationOrUnset for Unset {}
impl ExpirationOrUnset for u64 {}
