// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secrets from the environment with the `VAR` / `VAR_FILE` convention.
//!
//! Kubernetes mounts secrets as files, so every token ghsync reads can be
//! given either inline (`GHSYNC_GITHUB_TOKEN=ghp_...`) or as a path
//! (`GHSYNC_GITHUB_TOKEN_FILE=/var/run/secrets/github/token`).

use std::path::PathBuf;
use std::{env, fs};

use ghsync_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load a secret from `{var}_FILE` if set, else from `{var}`.
///
/// A single trailing newline is stripped from file content. An empty
/// `{var}` counts as unset.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|e| SecretEnvError::Io {
			path: path.clone(),
			source: e,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(secret)));
	}

	match env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}

/// First secret found among `vars`, in order.
pub fn load_first_secret_env(vars: &[&str]) -> Result<Option<SecretString>, SecretEnvError> {
	for var in vars {
		if let Some(secret) = load_secret_env(var)? {
			return Ok(Some(secret));
		}
	}
	Ok(None)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn returns_none_when_not_set() {
		let var = "GHSYNC_TEST_NONEXISTENT_VAR_31337";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));

		assert!(load_secret_env(var).unwrap().is_none());
	}

	#[test]
	fn empty_direct_value_is_unset() {
		let var = "GHSYNC_TEST_EMPTY_DIRECT_VAR_31337";
		env::set_var(var, "");
		env::remove_var(format!("{var}_FILE"));

		assert!(load_secret_env(var).unwrap().is_none());

		env::remove_var(var);
	}

	#[test]
	fn reads_from_direct_env_var() {
		let var = "GHSYNC_TEST_DIRECT_VAR_31337";
		env::set_var(var, "ghp_direct");
		env::remove_var(format!("{var}_FILE"));

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "ghp_direct");

		env::remove_var(var);
	}

	#[test]
	fn file_var_wins_and_trailing_newline_is_stripped() {
		let var = "GHSYNC_TEST_FILE_VAR_31337";
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "ghp_from_file").unwrap();

		env::set_var(var, "ghp_direct");
		env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "ghp_from_file");

		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn only_one_trailing_newline_is_stripped() {
		let var = "GHSYNC_TEST_NEWLINES_VAR_31337";
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "line\n\n").unwrap();

		env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "line\n");

		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn missing_file_is_an_error() {
		let var = "GHSYNC_TEST_MISSING_FILE_VAR_31337";
		env::set_var(format!("{var}_FILE"), "/nonexistent/ghsync/token");

		assert!(matches!(
			load_secret_env(var),
			Err(SecretEnvError::Io { .. })
		));

		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn empty_file_path_is_an_error() {
		let var = "GHSYNC_TEST_EMPTY_PATH_VAR_31337";
		env::set_var(format!("{var}_FILE"), "");

		assert!(matches!(
			load_secret_env(var),
			Err(SecretEnvError::EmptyPath { .. })
		));

		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn first_secret_falls_back_in_order() {
		let primary = "GHSYNC_TEST_PRIMARY_VAR_31337";
		let fallback = "GHSYNC_TEST_FALLBACK_VAR_31337";
		env::remove_var(primary);
		env::remove_var(format!("{primary}_FILE"));
		env::set_var(fallback, "from-fallback");

		let secret = load_first_secret_env(&[primary, fallback]).unwrap().unwrap();
		assert_eq!(secret.expose(), "from-fallback");

		env::set_var(primary, "from-primary");
		let secret = load_first_secret_env(&[primary, fallback]).unwrap().unwrap();
		assert_eq!(secret.expose(), "from-primary");

		env::remove_var(primary);
		env::remove_var(fallback);
	}
}
