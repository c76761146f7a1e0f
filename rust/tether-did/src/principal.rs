//! Identity and signing traits.

use std::future::Future;

use crate::did::Did;

/// An entity identified by a [DID].
///
/// Implemented by anything that has a DID: key pairs, verifiers, or a bare
/// [`Did`]. Does not imply any cryptographic capability.
///
/// [DID]: https://www.w3.org/TR/did-core/
pub trait Principal {
    /// Returns this entity's DID.
    fn did(&self) -> Did;
}

impl Principal for Did {
    fn did(&self) -> Did {
        self.clone()
    }
}

/// A principal that can sign token payloads.
pub trait Keypair: Principal {
    /// The JWT `alg` header value for signatures produced by this key pair.
    fn jwt_alg(&self) -> &str;

    /// Sign `payload` and return the raw signature bytes.
    fn sign(&self, payload: &[u8]) -> impl Future<Output = Result<Vec<u8>, signature::Error>>;
}
