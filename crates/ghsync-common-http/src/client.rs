// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

/// Client builder with the standard `ghsync/<version>` User-Agent.
///
/// GitHub rejects API requests without a User-Agent, so every adapter
/// starts from here.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Build a client with a whole-request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// The User-Agent sent on every request: `ghsync/{crate version}`.
pub fn user_agent() -> String {
	format!("ghsync/{}", env!("CARGO_PKG_VERSION"))
}
