//! HMAC-SHA256 signing.
//!
//! One primitive covers outbound request auth, channel authorization and
//! webhook validation: a lowercase hex HMAC-SHA256 over a message.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 of `message` keyed by `secret`.
#[must_use]
pub fn sign(secret: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Lowercase hex MD5 digest of a request body, sent as `body_md5`.
#[must_use]
pub fn body_md5(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

/// Constant-time byte comparison.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// HMAC-SHA256 signer bound to an application secret.
#[derive(Clone)]
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    /// Create a signer for `secret`.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Sign a message, returning lowercase hex.
    #[must_use]
    pub fn sign(&self, message: &str) -> String {
        sign(&self.secret, message)
    }

    /// Check `signature` against the expected signature of `message`.
    ///
    /// Comparison is constant-time in the signature contents.
    #[must_use]
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        let expected = self.sign(message);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
