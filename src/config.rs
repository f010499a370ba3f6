//! Client configuration: base endpoint, auth paths, cookie names, and timeout policy.

// self
use crate::{_prelude::*, auth::CookieNames, error::ConfigError, services::Service};

/// Validated client configuration.
///
/// Build one with [`ClientConfig::builder`] or load a JSON document with
/// [`ClientConfig::from_json_str`]; both paths run the same validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Gateway base URL every service path is appended to.
	pub base_url: Url,
	/// Path of the refresh endpoint.
	#[serde(default = "default_refresh_path")]
	pub refresh_path: String,
	/// Entry/login route handed to the navigator when the session expires.
	#[serde(default = "default_login_path")]
	pub login_path: String,
	/// Cookie names carrying the credential pair.
	#[serde(default)]
	pub cookies: CookieNames,
	/// Also send the access token as an `Authorization: Bearer` header.
	#[serde(default = "default_bearer_header")]
	pub bearer_header: bool,
	/// Upper bound for the refresh call; unset means wait indefinitely.
	#[serde(default, with = "opt_millis", rename = "refresh_timeout_ms")]
	pub refresh_timeout: Option<StdDuration>,
	/// Default upper bound for every other call; per-call options override it.
	#[serde(default, with = "opt_millis", rename = "request_timeout_ms")]
	pub request_timeout: Option<StdDuration>,
}
impl ClientConfig {
	/// Starts a builder for the provided base URL.
	pub fn builder(base_url: impl AsRef<str>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON config document.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);
		let config: Self = serde_path_to_error::deserialize(&mut de).map_err(ConfigError::Parse)?;

		config.validate()?;

		Ok(config)
	}

	/// Resolves a service path against the base URL, keeping any base path prefix.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		validate_path("request", path)?;

		let mut url = self.base_url.clone();
		let joined = format!("{}{path}", self.base_url.path().trim_end_matches('/'));

		url.set_path(&joined);

		Ok(url)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			scheme => return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
		}
		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(ConfigError::BaseUrlNotPlain { url: self.base_url.to_string() });
		}

		validate_path("refresh", &self.refresh_path)?;
		validate_path("login", &self.login_path)?;
		self.cookies.validate()?;

		Ok(())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	base_url: String,
	refresh_path: String,
	login_path: String,
	cookies: CookieNames,
	bearer_header: bool,
	refresh_timeout: Option<StdDuration>,
	request_timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Creates a builder with default paths, cookie names, and no timeouts.
	pub fn new(base_url: impl AsRef<str>) -> Self {
		Self {
			base_url: base_url.as_ref().to_owned(),
			refresh_path: default_refresh_path(),
			login_path: default_login_path(),
			cookies: CookieNames::default(),
			bearer_header: default_bearer_header(),
			refresh_timeout: None,
			request_timeout: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the route used for forced login navigation.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the credential cookie names.
	pub fn cookies(mut self, cookies: CookieNames) -> Self {
		self.cookies = cookies;

		self
	}

	/// Enables or disables the `Authorization: Bearer` default credential.
	pub fn bearer_header(mut self, enabled: bool) -> Self {
		self.bearer_header = enabled;

		self
	}

	/// Bounds the refresh call.
	pub fn refresh_timeout(mut self, timeout: StdDuration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Bounds every other call unless a per-call timeout is given.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url =
			Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let config = ClientConfig {
			base_url,
			refresh_path: self.refresh_path,
			login_path: self.login_path,
			cookies: self.cookies,
			bearer_header: self.bearer_header,
			refresh_timeout: self.refresh_timeout,
			request_timeout: self.request_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

pub(crate) fn validate_path(field: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') && !path.contains(&['?', '#'][..]) {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { field, path: path.to_owned() })
	}
}

fn default_refresh_path() -> String {
	Service::Auth.path("refresh-token")
}

fn default_login_path() -> String {
	"/".into()
}

fn default_bearer_header() -> bool {
	true
}

mod opt_millis {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer, ser::Error as _};
	// self
	use crate::_prelude::StdDuration;

	pub fn serialize<S>(value: &Option<StdDuration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(duration) => {
				let millis = u64::try_from(duration.as_millis()).map_err(|_| {
					S::Error::custom("timeout does not fit in u64 milliseconds")
				})?;

				serializer.serialize_some(&millis)
			},
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<StdDuration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<u64>::deserialize(deserializer)?.map(StdDuration::from_millis))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_follow_auth_service_conventions() {
		let config = ClientConfig::builder("https://api.example.com")
			.build()
			.expect("Default config should build.");

		assert_eq!(config.refresh_path, "/auth-service/refresh-token");
		assert_eq!(config.login_path, "/");
		assert_eq!(config.cookies, CookieNames::default());
		assert!(config.bearer_header);
		assert!(config.refresh_timeout.is_none());
	}

	#[test]
	fn endpoint_keeps_base_path_prefix() {
		let config = ClientConfig::builder("https://example.com/api/")
			.build()
			.expect("Config with a base path should build.");
		let url = config.endpoint("/room-service/rooms").expect("Endpoint should resolve.");

		assert_eq!(url.as_str(), "https://example.com/api/room-service/rooms");
		assert!(matches!(
			config.endpoint("room-service/rooms"),
			Err(ConfigError::InvalidPath { field: "request", .. })
		));
		assert!(config.endpoint("/rooms?id=1").is_err());
	}

	#[test]
	fn builder_rejects_bad_urls_and_paths() {
		assert!(matches!(
			ClientConfig::builder("not a url").build(),
			Err(ConfigError::InvalidBaseUrl { .. })
		));
		assert!(matches!(
			ClientConfig::builder("ftp://example.com").build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(
			ClientConfig::builder("https://example.com?x=1").build(),
			Err(ConfigError::BaseUrlNotPlain { .. })
		));
		assert!(matches!(
			ClientConfig::builder("https://example.com").login_path("login").build(),
			Err(ConfigError::InvalidPath { field: "login", .. })
		));
	}

	#[test]
	fn json_documents_apply_defaults_and_millisecond_timeouts() {
		let config = ClientConfig::from_json_str(
			r#"{"base_url":"http://localhost:8080","login_path":"/login","refresh_timeout_ms":2500}"#,
		)
		.expect("Config document should parse.");

		assert_eq!(config.login_path, "/login");
		assert_eq!(config.refresh_path, "/auth-service/refresh-token");
		assert_eq!(config.refresh_timeout, Some(StdDuration::from_millis(2500)));
		assert!(config.request_timeout.is_none());
	}

	#[test]
	fn json_errors_report_the_failing_field() {
		let err = ClientConfig::from_json_str(r#"{"base_url":"http://x","bearer_header":"yes"}"#)
			.expect_err("A string bearer flag should be rejected.");

		match err {
			ConfigError::Parse(source) => assert_eq!(source.path().to_string(), "bearer_header"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn timeouts_serialize_as_milliseconds_and_reject_overflow() {
		let config = ClientConfig::builder("https://example.com")
			.refresh_timeout(StdDuration::from_millis(1500))
			.build()
			.expect("Config with a refresh timeout should build.");
		let document = serde_json::to_value(&config).expect("Config should serialize.");

		assert_eq!(document["refresh_timeout_ms"], 1500);
		assert!(document["request_timeout_ms"].is_null());

		let oversized = ClientConfig { refresh_timeout: Some(StdDuration::MAX), ..config };

		assert!(serde_json::to_string(&oversized).is_err());
	}
}
