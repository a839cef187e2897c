//! Typed Facebook Graph API client: OAuth 2.0 login, custom audiences, conversions uploads, and
//! profile lookups over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod oauth;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::Client,
		config::{Config, OAuth2Config},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration whose Graph and dialog hosts point at `base_url`.
	pub fn test_config(base_url: &str, client_id: &str, client_secret: &str) -> Config {
		let base = Url::parse(base_url).expect("Mock server base URL should parse successfully.");
		let mut oauth2 = OAuth2Config::new(client_id, client_secret);

		oauth2.redirect_url = Some(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URL fixture should parse successfully."),
		);

		Config { graph_url: base.clone(), dialog_url: base, ..Config::new(oauth2) }
	}

	/// Constructs a [`Client`] that talks to `base_url` through the insecure reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_client(
		base_url: &str,
		client_id: &str,
		client_secret: &str,
	) -> ReqwestTestClient {
		build_reqwest_test_client_with(test_config(base_url, client_id, client_secret))
	}

	/// Constructs a [`Client`] from an explicit configuration using the test transport.
	pub fn build_reqwest_test_client_with(config: Config) -> ReqwestTestClient {
		Client::with_http_client(config, test_reqwest_http_client(), ReqwestTransportErrorMapper)
			.expect("Test client configuration should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
