// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Anonymous-sender sealing to a destination's public key.
//!
//! Output layout, base64-encoded:
//!
//! ```text
//! ephemeral public key (32 bytes) || XSalsa20-Poly1305 box ciphertext
//! ```
//!
//! The 24-byte nonce is BLAKE2b-192 over `ephemeral_pk || recipient_pk`.
//! A fresh ephemeral key pair per call makes every nonce unique, so the
//! nonce never travels separately. This is the libsodium `crypto_box_seal`
//! layout that GitHub expects for Actions and Dependabot secrets.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::SealError;

/// X25519 public key size in bytes.
pub const KEY_SIZE: usize = 32;

/// XSalsa20 nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Seal `plaintext` for the holder of `recipient_public_key` (base64).
///
/// Non-deterministic: two calls with identical inputs produce different
/// envelopes because the ephemeral key pair is regenerated every call.
/// Neither the ephemeral private key nor the nonce outlives this function.
pub fn seal(recipient_public_key: &str, plaintext: &[u8]) -> Result<String, SealError> {
	let recipient = decode_recipient_key(recipient_public_key)?;

	let mut ephemeral_bytes = Zeroizing::new([0u8; KEY_SIZE]);
	OsRng
		.try_fill_bytes(ephemeral_bytes.as_mut())
		.map_err(|e| SealError::RandomSource(e.to_string()))?;
	let ephemeral_secret = SecretKey::from(*ephemeral_bytes);
	let ephemeral_public = ephemeral_secret.public_key();

	let nonce = derive_nonce(ephemeral_public.as_bytes(), recipient.as_bytes())?;
	let ciphertext = SalsaBox::new(&recipient, &ephemeral_secret)
		.encrypt(GenericArray::from_slice(nonce.as_ref()), plaintext)
		.map_err(|_| SealError::Encryption)?;

	let mut envelope = Vec::with_capacity(KEY_SIZE + ciphertext.len());
	envelope.extend_from_slice(ephemeral_public.as_bytes());
	envelope.extend_from_slice(&ciphertext);

	Ok(STANDARD.encode(envelope))
}

/// Open an envelope produced by [`seal`] with the recipient's secret key.
///
/// The destination does this on its side; ghsync only needs it to verify
/// uploads in tests and in the in-memory destination.
pub fn open(recipient_secret: &SecretKey, sealed_base64: &str) -> Result<Zeroizing<Vec<u8>>, SealError> {
	let envelope = STANDARD
		.decode(sealed_base64)
		.map_err(|e| SealError::Open(e.to_string()))?;
	if envelope.len() < KEY_SIZE {
		return Err(SealError::Open(format!(
			"envelope too short ({} bytes)",
			envelope.len()
		)));
	}

	let (ephemeral, ciphertext) = envelope.split_at(KEY_SIZE);
	let mut ephemeral_bytes = [0u8; KEY_SIZE];
	ephemeral_bytes.copy_from_slice(ephemeral);
	let ephemeral_public = PublicKey::from(ephemeral_bytes);

	let recipient_public = recipient_secret.public_key();
	let nonce = derive_nonce(ephemeral_public.as_bytes(), recipient_public.as_bytes())?;

	let plaintext = SalsaBox::new(&ephemeral_public, recipient_secret)
		.decrypt(GenericArray::from_slice(nonce.as_ref()), ciphertext)
		.map_err(|_| SealError::Open("authentication failed".to_string()))?;

	Ok(Zeroizing::new(plaintext))
}

fn decode_recipient_key(encoded: &str) -> Result<PublicKey, SealError> {
	let bytes = STANDARD
		.decode(encoded)
		.map_err(|e| SealError::InvalidKeyEncoding(e.to_string()))?;

	let key: [u8; KEY_SIZE] = bytes
		.as_slice()
		.try_into()
		.map_err(|_| SealError::InvalidKeyLength {
			actual: bytes.len(),
		})?;

	Ok(PublicKey::from(key))
}

fn derive_nonce(
	ephemeral_public: &[u8; KEY_SIZE],
	recipient_public: &[u8; KEY_SIZE],
) -> Result<Zeroizing<[u8; NONCE_SIZE]>, SealError> {
	let mut hasher =
		Blake2bVar::new(NONCE_SIZE).map_err(|e| SealError::NonceDerivation(e.to_string()))?;
	hasher.update(ephemeral_public);
	hasher.update(recipient_public);

	let mut nonce = Zeroizing::new([0u8; NONCE_SIZE]);
	hasher
		.finalize_variable(nonce.as_mut())
		.map_err(|e| SealError::NonceDerivation(e.to_string()))?;
	Ok(nonce)
}
