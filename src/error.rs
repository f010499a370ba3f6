//! Client-level error types shared across the dispatcher, interceptor, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Service answered with a non-2xx status.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Response body did not match the expected JSON shape.
	#[error("Response body (HTTP {status}) could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
	/// Credential refresh failed; shared by every caller parked on the same refresh.
	#[error("Credential refresh failed: {0}")]
	Refresh(#[source] Arc<Error>),
	/// Refresh endpoint answered 2xx without issuing an access token.
	#[error("Refresh endpoint returned an unusable response: {reason}.")]
	InvalidRefreshResponse {
		/// Why the response was rejected.
		reason: String,
	},
	/// The in-flight refresh was dropped before it settled.
	#[error("Credential refresh was abandoned before it settled.")]
	RefreshAborted,
	/// Login or logout replaced the stored credentials while the refresh was in flight;
	/// the refreshed pair was discarded.
	#[error("Credentials changed while the refresh was in flight.")]
	RefreshSuperseded,
}
impl Error {
	/// HTTP status behind this error, looking through shared refresh failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(e) => Some(e.status),
			Self::Decode { status, .. } => Some(*status),
			Self::Refresh(inner) => inner.status(),
			_ => None,
		}
	}

	/// Returns `true` for a direct HTTP 401 answer.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Api(e) if e.status == 401)
	}

	/// Returns `true` when a refresh was rejected with 401/403, meaning the refresh
	/// credential itself is invalid and the user must log in again.
	pub fn is_session_expired(&self) -> bool {
		match self {
			Self::Refresh(inner) => matches!(inner.status(), Some(401 | 403)),
			_ => false,
		}
	}
}

/// Structured non-2xx answer from a backend service.
#[derive(Clone, Debug, ThisError)]
#[error("Request failed with HTTP {status}: {message}.")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Server-provided message, or a body preview / placeholder when none was sent.
	pub message: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
	/// Parsed JSON body, when the service sent one.
	pub body: Option<serde_json::Value>,
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses something other than http/https.
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL carries a query or fragment.
	#[error("Base URL must not carry a query or fragment: {url}.")]
	BaseUrlNotPlain {
		/// Offending URL.
		url: String,
	},
	/// Path does not start with `/` or carries a query/fragment.
	#[error("The {field} path `{path}` must start with `/` and carry no query or fragment.")]
	InvalidPath {
		/// Which setting or call carried the path.
		field: &'static str,
		/// Offending path.
		path: String,
	},
	/// Cookie name is empty or contains separators.
	#[error("Cookie name `{name}` is not a valid token.")]
	InvalidCookieName {
		/// Offending cookie name.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	RequestBody(#[source] serde_json::Error),
	/// Config document could not be parsed.
	#[error("Client config document is invalid.")]
	Parse(#[source] serde_path_to_error::Error<serde_json::Error>),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete within its timeout.
	#[error("Request timed out before the service answered.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
