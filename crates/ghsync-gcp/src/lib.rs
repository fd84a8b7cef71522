// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Google Cloud Secret Manager as a ghsync value source.
//!
//! ```text
//! GET {base}/v1/projects/{project}/secrets/{key}/versions/latest:access
//! Authorization: Bearer <token from config or the metadata server>
//! ```
//!
//! The payload is base64 in the response and is decoded straight into a
//! [`ghsync_common_secret::SecretBytes`]. Binary payloads are kept as-is.

mod client;
mod error;
mod source;
mod token;

pub use client::{resource_name, GcpConfig, SecretManagerClient, DEFAULT_BASE_URL};
pub use error::{GcpError, GcpResult};
pub use source::GcpSecretSource;
pub use token::{AccessTokenProvider, MetadataServerToken, StaticToken, DEFAULT_METADATA_TOKEN_URL};
