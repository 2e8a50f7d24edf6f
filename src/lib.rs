//! Async client for a mini-app open-platform HTTP API—automatic access-token lifecycle,
//! pluggable token stores, and typed error classification in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AppId, AppSecret},
		client::Client,
		http::ReqwestTransport,
		store::{MemoryStore, TokenStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_transport(endpoint: Url) -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client, endpoint)
	}

	/// Constructs a [`Client`] backed by a fresh in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_test_client(
		endpoint: Url,
		app_id: &str,
		app_secret: &str,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let client =
			build_test_client_with_store(endpoint, app_id, app_secret, store_backend.clone());

		(client, store_backend)
	}

	/// Constructs a [`Client`] sharing the caller-provided store, so tests can exercise cache
	/// interactions between multiple clients.
	pub fn build_test_client_with_store(
		endpoint: Url,
		app_id: &str,
		app_secret: &str,
		store: Arc<dyn TokenStore>,
	) -> ReqwestTestClient {
		let app_id = AppId::new(app_id).expect("Test application identifier should be valid.");
		let app_secret = AppSecret::new(app_secret);

		Client::with_transport(store, app_id, app_secret, test_transport(endpoint))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
