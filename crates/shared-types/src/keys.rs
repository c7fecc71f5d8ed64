//! # Keys and Event Signing
//!
//! BIP-340 Schnorr keys over secp256k1 and NIP-01 event id computation.
//!
//! ## Event Id
//!
//! ```text
//! id = sha256(json([0, <pubkey hex>, <created_at>, <kind>, <tags>, <content>]))
//! ```
//!
//! The signature is computed over the raw 32 id bytes.

use k256::schnorr::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::schnorr::{Signature as SchnorrSignature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::entities::{Event, EventId, Kind, PublicKey, Signature, Tag};
use crate::errors::NostrError;
use crate::unix_time;

/// Compute the NIP-01 event id.
pub fn compute_event_id(
    pubkey: &PublicKey,
    created_at: u64,
    kind: Kind,
    tags: &[Tag],
    content: &str,
) -> Result<EventId, NostrError> {
    let serialized = serde_json::to_string(&(0u8, pubkey, created_at, kind, tags, content))?;
    let digest = Sha256::digest(serialized.as_bytes());
    EventId::from_slice(&digest)
}

/// A signing key pair.
#[derive(Clone)]
pub struct Keys {
    secret: SigningKey,
    public: PublicKey,
}

impl Keys {
    /// Load a secret key from 64 hex characters.
    pub fn from_hex(secret_hex: &str) -> Result<Self, NostrError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(secret_hex.trim(), &mut bytes)
            .map_err(|e| NostrError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load a secret key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, NostrError> {
        let secret = SigningKey::from_bytes(bytes).map_err(|_| NostrError::InvalidSecretKey)?;
        let public = PublicKey::from_slice(&secret.verifying_key().to_bytes())?;
        Ok(Self { secret, public })
    }

    /// The x-only public key.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Sign an unsigned event.
    pub fn sign(
        &self,
        created_at: u64,
        kind: Kind,
        tags: Vec<Tag>,
        content: String,
    ) -> Result<Event, NostrError> {
        let id = compute_event_id(&self.public, created_at, kind, &tags, &content)?;
        let sig: SchnorrSignature = self
            .secret
            .sign_prehash(id.as_bytes())
            .map_err(|e| NostrError::SigningFailed(e.to_string()))?;
        Ok(Event {
            id,
            pubkey: self.public,
            created_at,
            kind,
            tags,
            content,
            sig: Signature::from_bytes(sig.to_bytes()),
        })
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Event {
    /// Check that the id matches the content and the signature is valid.
    pub fn verify(&self) -> Result<(), NostrError> {
        let computed = compute_event_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        if computed != self.id {
            return Err(NostrError::IdMismatch {
                declared: self.id.to_hex(),
                computed: computed.to_hex(),
            });
        }

        let key = VerifyingKey::from_bytes(self.pubkey.as_bytes())
            .map_err(|_| NostrError::InvalidPublicKey)?;
        let sig = SchnorrSignature::try_from(self.sig.as_bytes().as_slice())
            .map_err(|_| NostrError::InvalidSignature)?;
        key.verify_prehash(self.id.as_bytes(), &sig)
            .map_err(|_| NostrError::InvalidSignature)
    }
}

/// Builder for unsigned events.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    kind: Kind,
    content: String,
    tags: Vec<Tag>,
    created_at: Option<u64>,
}

impl EventBuilder {
    pub fn new(kind: Kind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tags: Vec::new(),
            created_at: None,
        }
    }

    /// Kind-1 text note.
    pub fn text_note(content: impl Into<String>) -> Self {
        Self::new(Kind::TEXT_NOTE, content)
    }

    /// Kind-7 reaction.
    pub fn reaction(content: impl Into<String>) -> Self {
        Self::new(Kind::REACTION, content)
    }

    /// Kind-0 profile metadata.
    pub fn metadata(content: impl Into<String>) -> Self {
        Self::new(Kind::METADATA, content)
    }

    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Override the creation time (defaults to now).
    #[must_use]
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn sign(self, keys: &Keys) -> Result<Event, NostrError> {
        let created_at = self.created_at.unwrap_or_else(unix_time);
        keys.sign(created_at, self.kind, self.tags, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0000000000000000000000000000000000000000000000000000000000000003";

    #[test]
    fn test_public_key_derivation() {
        // BIP-340 test vector 0
        let keys = Keys::from_hex(SECRET).unwrap();
        assert_eq!(
            keys.public_key().to_hex(),
            "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9"
        );
    }

    #[test]
    fn test_reject_zero_secret() {
        let result = Keys::from_hex(&"00".repeat(32));
        assert!(matches!(result, Err(NostrError::InvalidSecretKey)));
    }

    #[test]
    fn test_signed_event_verifies() {
        let keys = Keys::from_hex(SECRET).unwrap();
        let event = EventBuilder::text_note("こんにちは\n\"quoted\"")
            .tag(Tag::event(&EventId::from_bytes([9; 32]), ""))
            .created_at(1_700_000_000)
            .sign(&keys)
            .unwrap();

        assert_eq!(event.pubkey, keys.public_key());
        assert!(event.verify().is_ok());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let keys = Keys::from_hex(SECRET).unwrap();
        let mut event = EventBuilder::text_note("original")
            .created_at(1_700_000_000)
            .sign(&keys)
            .unwrap();
        event.content = "tampered".to_string();

        assert!(matches!(
            event.verify(),
            Err(NostrError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_event_id_is_deterministic() {
        let pk = PublicKey::from_bytes([1; 32]);
        let a = compute_event_id(&pk, 1, Kind::TEXT_NOTE, &[], "x").unwrap();
        let b = compute_event_id(&pk, 1, Kind::TEXT_NOTE, &[], "x").unwrap();
        let c = compute_event_id(&pk, 2, Kind::TEXT_NOTE, &[], "x").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
