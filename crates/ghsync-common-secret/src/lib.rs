// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for plaintext secret values.
//!
//! Every plaintext that ghsync handles (values read from the source store,
//! GitHub and GCP access tokens) travels inside a [`Secret<T>`]. The wrapper:
//!
//! - prints `[REDACTED]` for `Debug`, `Display` and `Serialize`
//! - zeroizes its memory on drop
//! - only hands out the inner value through an explicit `.expose()`
//!
//! ```
//! use ghsync_common_secret::SecretString;
//!
//! let value = SecretString::new("hunter2".to_string());
//! assert_eq!(format!("{value}"), "[REDACTED]");
//! assert_eq!(format!("{value:?}"), "Secret(\"[REDACTED]\")");
//! assert_eq!(value.expose(), "hunter2");
//! ```
//!
//! Because `tracing` formats fields through `Display` (`%field`) or `Debug`
//! (`?field`), a `Secret` placed in a log event also shows up redacted.

use std::fmt;

use zeroize::Zeroize;

/// Placeholder printed instead of a secret.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never be logged, serialized or left in memory.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// The common case: a secret string.
pub type SecretString = Secret<String>;

/// Raw secret bytes, e.g. a decoded binary payload.
pub type SecretBytes = Secret<Vec<u8>>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the plaintext. Every call site is a place where the secret
	/// leaves the wrapper, which keeps them easy to audit.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl SecretString {
	/// Length of the plaintext in bytes.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	use super::{Secret, REDACTED};

	impl<T> Serialize for Secret<T>
	where
		T: Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::new("ghp_live_token".to_string());

		assert_eq!(format!("{secret}"), REDACTED);
		assert!(!format!("{secret:?}").contains("ghp_live_token"));
		assert!(format!("{:?}", Some(&secret)).contains(REDACTED));
	}

	#[test]
	fn expose_returns_plaintext() {
		let secret = SecretString::new("v1".to_string());
		assert_eq!(secret.expose(), "v1");
		assert_eq!(secret.len(), 2);
		assert!(!secret.is_empty());
	}

	#[test]
	fn bytes_debug_is_redacted() {
		let bytes = SecretBytes::new(vec![0x30, 0x82, 0xff]);
		assert_eq!(format!("{bytes:?}"), "Secret(\"[REDACTED]\")");
		assert_eq!(bytes.expose().as_slice(), &[0x30, 0x82, 0xff]);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serialize_is_redacted_and_deserialize_keeps_value() {
		let secret = SecretString::new("db-password".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));

		let parsed: SecretString = serde_json::from_str("\"db-password\"").unwrap();
		assert_eq!(parsed, secret);
	}

	proptest! {
		#[test]
		fn formatting_never_leaks(inner in "[a-zA-Z0-9_+=:,./-]{3,64}") {
			prop_assume!(!inner.contains("REDACTED"));
			prop_assume!(!inner.contains("Secret"));

			let secret = SecretString::new(inner.clone());
			let debug = format!("{secret:?}");
			let display = format!("{secret}");
			prop_assert!(!debug.contains(&inner));
			prop_assert!(!display.contains(&inner));
		}
	}
}
