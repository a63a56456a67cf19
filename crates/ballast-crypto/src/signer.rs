use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of a compressed SEC1 public key.
pub const PUBKEY_LENGTH: usize = 33;

/// Length of a compact `r || s` signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// secp256k1 signing key (private).
#[derive(Clone)]
pub struct SigningKey(k256::ecdsa::SigningKey);

/// secp256k1 verifying key (public), carried on the wire as base64 of its
/// compressed SEC1 encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(k256::ecdsa::VerifyingKey);

/// Compact 64-byte secp256k1 signature, carried on the wire as base64.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(k256::ecdsa::Signature);

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        Self(k256::ecdsa::SigningKey::random(&mut rand::thread_rng()))
    }

    /// Create from a raw 32-byte secret scalar.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, SignatureError> {
        k256::ecdsa::SigningKey::from_slice(&bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidKey)
    }

    /// The corresponding public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key().clone())
    }

    /// Sign a 32-byte digest. The result is always low-S.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Signature, SignatureError> {
        let sig: k256::ecdsa::Signature = self
            .0
            .sign_prehash(digest)
            .map_err(|_| SignatureError::InvalidSignature)?;
        Ok(Signature(sig.normalize_s().unwrap_or(sig)))
    }

    /// Sign a digest and return the base64 authentifier text.
    pub fn authentifier(&self, digest: &[u8; 32]) -> Result<String, SignatureError> {
        Ok(self.sign_prehash(digest)?.to_base64())
    }
}

impl VerifyingKey {
    /// Verify a signature over a 32-byte digest.
    pub fn verify_prehash(
        &self,
        digest: &[u8; 32],
        signature: &Signature,
    ) -> Result<(), SignatureError> {
        self.0
            .verify_prehash(digest, &signature.0)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    /// Compressed SEC1 bytes.
    pub fn to_bytes(&self) -> [u8; PUBKEY_LENGTH] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; PUBKEY_LENGTH];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Parse from SEC1 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidKey)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(s: &str) -> Result<Self, SignatureError> {
        let bytes = STANDARD.decode(s).map_err(|_| SignatureError::InvalidKey)?;
        if bytes.len() != PUBKEY_LENGTH {
            return Err(SignatureError::InvalidKey);
        }
        Self::from_bytes(&bytes)
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidSignature);
        }
        k256::ecdsa::Signature::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(s: &str) -> Result<Self, SignatureError> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| SignatureError::InvalidSignature)?;
        Self::from_bytes(&bytes)
    }
}

/// Verify a base64 signature against a base64 public key.
///
/// Any malformed key or signature simply fails verification.
pub fn verify_base64(digest: &[u8; 32], signature_b64: &str, pubkey_b64: &str) -> bool {
    let Ok(key) = VerifyingKey::from_base64(pubkey_b64) else {
        return false;
    };
    let Ok(signature) = Signature::from_base64(signature_b64) else {
        return false;
    };
    key.verify_prehash(digest, &signature).is_ok()
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", self.to_base64())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.to_bytes()[..8]))
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::sha256;

    #[test]
    fn sign_and_verify() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let digest = sha256(b"hello world");
        let sig = sk.sign_prehash(&digest).unwrap();
        assert!(vk.verify_prehash(&digest, &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_digest() {
        let sk = SigningKey::generate();
        let sig = sk.sign_prehash(&sha256(b"correct")).unwrap();
        assert_eq!(
            sk.verifying_key().verify_prehash(&sha256(b"wrong"), &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let sig = SigningKey::generate()
            .sign_prehash(&sha256(b"message"))
            .unwrap();
        let other = SigningKey::generate().verifying_key();
        assert!(other.verify_prehash(&sha256(b"message"), &sig).is_err());
    }

    #[test]
    fn base64_roundtrip_and_lengths() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let digest = sha256(b"x");
        let auth = sk.authentifier(&digest).unwrap();
        assert_eq!(auth.len(), 88);
        assert_eq!(vk.to_base64().len(), 44);
        assert!(verify_base64(&digest, &auth, &vk.to_base64()));
        assert_eq!(VerifyingKey::from_base64(&vk.to_base64()).unwrap(), vk);
    }

    #[test]
    fn malformed_inputs_fail_closed() {
        let sk = SigningKey::generate();
        let digest = sha256(b"x");
        let auth = sk.authentifier(&digest).unwrap();
        let key = sk.verifying_key().to_base64();
        assert!(!verify_base64(&digest, "not base64!", &key));
        assert!(!verify_base64(&digest, &auth, "AAAA"));
        assert!(!verify_base64(&digest, &auth[..40], &key));
    }

    #[test]
    fn verifies_ledger_signature() {
        let digest: [u8; 32] =
            hex::decode("525f69e2b8503dc4ba385c0b4497afb2891be096791aaaa1a11c730e0c541134")
                .unwrap()
                .try_into()
                .unwrap();
        let sig = "IiL2yEebJEBuLxSFsP8jm1BXQiZax7qbGU0HBLahI8VEDq69j8X3vMaAHeLbXGGcz+69a2vJZEEJj7EqpDCFwA==";
        let key = "AwTz/u/JbunP3JmxrC3+cPO4ttIYzbYkUvCm7t5Mavib";
        assert!(verify_base64(&digest, sig, key));

        let mut tampered = digest;
        tampered[0] ^= 1;
        assert!(!verify_base64(&tampered, sig, key));
    }

    #[test]
    fn debug_redacts_secret() {
        assert_eq!(
            format!("{:?}", SigningKey::generate()),
            "SigningKey(<redacted>)"
        );
    }
}
