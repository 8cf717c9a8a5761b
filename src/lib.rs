//! WeChat Work (qyapi) bindings built around a single-flight access-token manager and a
//! retry-once request gate, with pluggable credential stores and transport-aware
//! observability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod mediator;
pub mod obs;
pub mod store;
pub mod supplier;
pub mod token;
pub mod transport;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::WorkClient,
		auth::{CorpCredentials, CorpId},
		descriptor::ApiDescriptor,
		http::ReqwestHttpClient,
		store::{CredentialStore, MemoryStore},
		transport::ReqwestTransportErrorMapper,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = WorkClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

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

	/// Builds a descriptor whose endpoints point at the provided mock server base URL.
	pub fn test_descriptor(base: &str) -> ApiDescriptor {
		let api_base = Url::parse(&format!("{}/cgi-bin/", base.trim_end_matches('/')))
			.expect("Mock API base should parse successfully.");
		let authorize = Url::parse(&format!("{}/connect/oauth2/authorize", base.trim_end_matches('/')))
			.expect("Mock authorize endpoint should parse successfully.");

		ApiDescriptor::builder()
			.api_base(api_base)
			.authorize_endpoint(authorize)
			.build()
			.expect("Mock API descriptor should build successfully.")
	}

	/// Constructs a [`WorkClient`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_client(
		descriptor: ApiDescriptor,
		corp_id: &str,
		corp_secret: &str,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let credentials = CorpCredentials::new(
			CorpId::new(corp_id).expect("Corp identifier fixture should be valid."),
			corp_secret,
		);
		let client = WorkClient::with_http_client(
			store,
			descriptor,
			credentials,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(client, store_backend)
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

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
