//! Authenticated request client: dispatcher, 401 interceptor, and pending-request queue.
//!
//! [`AuthClient`] attaches the stored credential pair to every call. When a call comes
//! back 401 the interceptor runs one refresh per failure wave: the first caller leads
//! the refresh, concurrent callers park in the pending queue, and everyone replays their
//! own request once with the refreshed credentials. A replayed request that fails again
//! is surfaced as-is.

mod dispatch;
mod interceptor;
mod metrics;
mod queue;

pub use dispatch::RequestSpec;
pub(crate) use dispatch::decode;
pub use interceptor::RefreshPhase;
pub use metrics::RefreshMetrics;

// crates.io
use futures::lock::Mutex as AsyncMutex;
// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	client::interceptor::RefreshState,
	config::ClientConfig,
	http::{HttpResponse, HttpTransport},
	navigation::{LoginNavigator, NoopNavigator},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAuthClient = AuthClient<ReqwestTransport>;

/// Authenticated client for the PG management services.
///
/// Clones share the transport, credential store, navigator, metrics, and refresh state,
/// so the single-refresh guarantee holds across every clone of one client.
pub struct AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound call.
	pub transport: Arc<T>,
	/// Credential store acting as the cookie jar.
	pub store: Arc<dyn CredentialStore>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Side effect run when a refresh proves the session expired.
	pub navigator: Arc<dyn LoginNavigator>,
	/// Counters for refresh outcomes, parked callers, and replays.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh: Arc<Mutex<RefreshState>>,
	credential_writes: Arc<AsyncMutex<()>>,
}
impl<T> AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			navigator: Arc::new(NoopNavigator),
			refresh_metrics: Default::default(),
			refresh: Default::default(),
			credential_writes: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Sets or replaces the login navigator.
	pub fn with_navigator(mut self, navigator: Arc<dyn LoginNavigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Sends an intercepted request and returns the raw 2xx response.
	pub async fn send(&self, spec: RequestSpec) -> Result<HttpResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				// Epoch before credentials: a refresh landing in between must look stale.
				let epoch = self.epoch();
				let credentials = self.store.load().await?;

				match self.dispatch(&spec, credentials.as_ref(), KIND).await {
					Err(err) if err.is_unauthorized() && !spec.is_retried() =>
						self.recover(spec, epoch).await,
					other => other,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Sends an intercepted request and decodes the JSON response body.
	pub async fn request<R>(&self, spec: RequestSpec) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.send(spec).await?;

		dispatch::decode(&response)
	}

	/// `GET path`, decoded as `R`.
	pub async fn get<R>(&self, path: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(RequestSpec::get(path)).await
	}

	/// `POST path` with a JSON body, decoded as `R`.
	pub async fn post<B, R>(&self, path: impl Into<String>, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestSpec::post(path).json(body)?).await
	}

	/// `PUT path` with a JSON body, decoded as `R`.
	pub async fn put<B, R>(&self, path: impl Into<String>, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestSpec::put(path).json(body)?).await
	}

	/// `PATCH path` with a JSON body, decoded as `R`.
	pub async fn patch<B, R>(&self, path: impl Into<String>, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestSpec::patch(path).json(body)?).await
	}

	/// `DELETE path`, decoded as `R`.
	pub async fn delete<R>(&self, path: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(RequestSpec::delete(path)).await
	}

	/// Returns the currently stored credential pair.
	pub async fn credentials(&self) -> Result<Option<CredentialPair>> {
		Ok(self.store.load().await?)
	}
}
#[cfg(feature = "reqwest")]
impl AuthClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<T> Clone for AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			navigator: self.navigator.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh: self.refresh.clone(),
			credential_writes: self.credential_writes.clone(),
		}
	}
}
impl<T> Debug for AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_phase", &self.refresh_phase())
			.field("pending_requests", &self.pending_requests())
			.finish()
	}
}
