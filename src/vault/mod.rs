//! Credential vault subsystem.
//!
//! # Data Flow
//! ```text
//! Authentication (external layer):
//!     provider issues credential + session
//!     → material.rs (typed key material, tagged byte encoding)
//!     → cipher.rs (AES-256-GCM encrypt, per-call random IV)
//!     → store.rs (one EncryptedBlob pair per user, JSON snapshot)
//!
//! Signing call:
//!     store.rs (fetch blob pair)
//!     → cipher.rs (decrypt, tag verification)
//!     → CredentialBundle handed to the signing protocol
//! ```
//!
//! # Design Decisions
//! - One process-wide symmetric key, read once at startup; no rotation.
//!   Rotating the key invalidates every stored blob.
//! - Binary key fields use a tagged `{kind, payload}` encoding chosen at
//!   encryption time, so decrypt never guesses the shape of a byte buffer.
//! - Credential and session are stored and loaded as an atomic pair.

pub mod cipher;
pub mod material;
pub mod store;

pub use cipher::{EncryptedBlob, VaultCipher, VaultError};
pub use material::{AuthorizationSession, CredentialBundle, KeyShareRecord, SigningCredential};
pub use store::CredentialStore;

use uuid::Uuid;

/// Encrypted credential storage for all users of this process.
///
/// Combines the process-wide cipher with the per-user blob store. All
/// signing paths obtain their [`CredentialBundle`] through [`Vault::load_bundle`];
/// raw key material never leaves this module unencrypted except inside a
/// bundle handed to the signing client.
pub struct Vault {
    cipher: VaultCipher,
    store: CredentialStore,
}

impl Vault {
    pub fn new(cipher: VaultCipher, store: CredentialStore) -> Self {
        Self { cipher, store }
    }

    /// Encrypt and store a user's credential/session pair, replacing any
    /// previous pair wholesale. Partial updates are not possible.
    pub fn store_bundle(
        &self,
        user: Uuid,
        credential: &SigningCredential,
        session: &AuthorizationSession,
    ) -> Result<(), VaultError> {
        let credential_blob = self.cipher.encrypt(credential)?;
        let session_blob = self.cipher.encrypt(session)?;
        self.store.put(user, credential_blob, session_blob);
        if let Err(e) = self.store.save_to_file() {
            tracing::warn!(user = %user, error = %e, "Failed to snapshot credential store");
        }
        Ok(())
    }

    /// Decrypt a user's credential/session pair.
    ///
    /// The pair is atomic: both blobs must be present and both must pass
    /// integrity verification, otherwise the user must re-authenticate.
    pub fn load_bundle(&self, user: Uuid) -> Result<CredentialBundle, VaultError> {
        let stored = self
            .store
            .get(&user)
            .ok_or(VaultError::NotEnrolled(user))?;
        let credential: SigningCredential = self.cipher.decrypt(&stored.credential)?;
        let session: AuthorizationSession = self.cipher.decrypt(&stored.session)?;
        Ok(CredentialBundle {
            credential,
            session,
        })
    }
}
