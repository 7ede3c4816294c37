// shopfront/src/auth/credential.rs

//! One-way, salted credential hashing (Argon2id).

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, instrument};

use crate::error::{CommerceError, CommerceResult};

/// Hashes a plain-text credential with a fresh random salt.
#[instrument(name = "auth::hash_credential", skip(plaintext), err(Display))]
pub fn hash_credential(plaintext: &str) -> CommerceResult<String> {
  if plaintext.is_empty() {
    return Err(CommerceError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(plaintext.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 hashing failed.");
      CommerceError::Internal(format!("credential hashing failed: {argon_err}"))
    })
}

/// Verifies `plaintext` against a stored hash.
///
/// A mismatch is `InvalidCredential`. An unparseable stored hash is an
/// internal error, not a user mistake.
#[instrument(name = "auth::verify_credential", skip_all, err(Display))]
pub fn verify_credential(stored_hash: &str, plaintext: &str) -> CommerceResult<()> {
  if plaintext.is_empty() {
    return Err(CommerceError::InvalidCredential);
  }
  let parsed = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Stored credential hash is malformed.");
    CommerceError::Internal(format!("malformed stored hash: {parse_err}"))
  })?;

  match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
    Ok(()) => Ok(()),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Credential mismatch.");
      Err(CommerceError::InvalidCredential)
    }
    Err(other) => {
      error!(error = %other, "Argon2 verification failed.");
      Err(CommerceError::Internal(format!("credential verification failed: {other}")))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  #[test]
  fn hashes_are_salted_and_verify() {
    let a = hash_credential("hunter22").unwrap();
    let b = hash_credential("hunter22").unwrap();
    assert_ne!(a, b);
    assert!(verify_credential(&a, "hunter22").is_ok());
    assert!(verify_credential(&b, "hunter22").is_ok());
  }

  #[test]
  fn wrong_password_is_invalid_credential() {
    let hash = hash_credential("hunter22").unwrap();
    let err = verify_credential(&hash, "hunter23").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredential);
  }

  #[test]
  fn garbage_hash_is_internal() {
    let err = verify_credential("not-a-phc-string", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
  }

  #[test]
  fn empty_password_is_rejected_for_hashing() {
    assert_eq!(hash_credential("").unwrap_err().kind(), ErrorKind::Validation);
  }
}
