//! Authenticated REST client for the PG management services: cookie credentials, one
//! shared token refresh per 401 wave, and queued replay of every request that hit it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod obs;
pub mod services;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::CredentialPair,
		client::ReqwestAuthClient,
		config::ClientConfig,
		http::ReqwestTransport,
		navigation::RecordingNavigator,
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		ReqwestTransport::from_builder(
			ReqwestClient::builder()
				.danger_accept_invalid_certs(true)
				.danger_accept_invalid_hostnames(true),
		)
		.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs a [`ReqwestAuthClient`] backed by an in-memory store (optionally seeded)
	/// and a recording navigator.
	pub fn build_reqwest_test_client(
		config: ClientConfig,
		seed: Option<CredentialPair>,
	) -> (ReqwestAuthClient, Arc<MemoryStore>, Arc<RecordingNavigator>) {
		let store_backend = Arc::new(seed.map(MemoryStore::seeded).unwrap_or_default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let navigator = Arc::new(RecordingNavigator::default());
		let client = ReqwestAuthClient::with_transport(config, store, test_reqwest_transport())
			.with_navigator(navigator.clone());

		(client, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
