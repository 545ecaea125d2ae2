//! Signature verification seam.
//!
//! The engine treats keys and signatures as opaque bytes. Verification goes
//! through [`SignatureVerifier`]; [`Ed25519Verifier`] is the default
//! implementation and [`Keypair`] produces matching signatures.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;

use crate::error::CoreError;

/// Verifies a signature over a message with an opaque public key.
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over `message` under `public_key`.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8])
        -> Result<(), CoreError>;
}

/// Ed25519 verification over 32-byte keys and 64-byte signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CoreError> {
        let key_bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| CoreError::InvalidPublicKey)?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_bytes).map_err(|_| CoreError::InvalidPublicKey)?;

        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CoreError::InvalidSignature)?;
        let sig = Signature::from_bytes(&sig_bytes);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

/// An Ed25519 keypair for sealing operations.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// The public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", &hex::encode(self.public_key())[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"hello world";
        let signature = keypair.sign(message);

        Ed25519Verifier
            .verify(&keypair.public_key(), message, &signature)
            .expect("valid signature should verify");

        let tampered = b"hello worlD";
        assert_eq!(
            Ed25519Verifier.verify(&keypair.public_key(), tampered, &signature),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        assert_eq!(
            Keypair::from_seed(&seed).public_key(),
            Keypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn test_wrong_lengths() {
        let keypair = Keypair::from_seed(&[7; 32]);
        let signature = keypair.sign(b"m");

        assert_eq!(
            Ed25519Verifier.verify(&[0u8; 31], b"m", &signature),
            Err(CoreError::InvalidPublicKey)
        );
        assert_eq!(
            Ed25519Verifier.verify(&keypair.public_key(), b"m", &signature[..63]),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_other_key_rejected() {
        let signer = Keypair::from_seed(&[1; 32]);
        let other = Keypair::from_seed(&[2; 32]);
        let signature = signer.sign(b"payload");
        assert!(Ed25519Verifier
            .verify(&other.public_key(), b"payload", &signature)
            .is_err());
    }
}
