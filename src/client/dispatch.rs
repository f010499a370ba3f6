//! Request dispatcher: credential attachment, wire calls, and response classification.

// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	client::AuthClient,
	error::{ApiError, ConfigError},
	http::{self, HttpRequest, HttpResponse, HttpTransport, Method},
	obs::CallKind,
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Description of one service call, relative to the configured base URL.
#[derive(Clone, Debug)]
pub struct RequestSpec {
	/// HTTP verb.
	pub method: Method,
	/// Path starting with `/`, e.g. `/room-service/rooms`.
	pub path: String,
	/// JSON-encoded body.
	pub body: Option<Vec<u8>>,
	/// Extra headers; an explicit `Authorization` replaces the bearer credential and an
	/// explicit `Cookie` is sent ahead of the credential cookies.
	pub headers: Vec<(String, String)>,
	/// Query parameters appended to the URL.
	pub query: Vec<(String, String)>,
	/// Per-call timeout overriding the configured default.
	pub timeout: Option<StdDuration>,
	retried: bool,
}
impl RequestSpec {
	/// Creates a spec for `method path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			body: None,
			headers: Vec::new(),
			query: Vec::new(),
			timeout: None,
			retried: false,
		}
	}

	/// `GET path`.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// `POST path`.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// `PUT path`.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// `PATCH path`.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// `DELETE path`.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Serializes `body` as the JSON request body.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(ConfigError::RequestBody)?);

		Ok(self)
	}

	/// Adds a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Adds a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Bounds this call.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Marks the spec as already retried so a 401 is surfaced instead of triggering a
	/// refresh.
	pub fn retried(mut self) -> Self {
		self.retried = true;

		self
	}

	/// Returns `true` once the request has been replayed (or opted out of recovery).
	pub fn is_retried(&self) -> bool {
		self.retried
	}
}

impl<T> AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `spec` with `credentials` attached. Non-2xx answers become [`Error::Api`];
	/// nothing is intercepted here.
	pub(crate) async fn dispatch(
		&self,
		spec: &RequestSpec,
		credentials: Option<&CredentialPair>,
		kind: CallKind,
	) -> Result<HttpResponse> {
		let request = self.build_request(spec, credentials, kind)?;
		let response = self.transport.execute(request).await?;

		if response.is_success() { Ok(response) } else { Err(api_error(&response).into()) }
	}

	fn build_request(
		&self,
		spec: &RequestSpec,
		credentials: Option<&CredentialPair>,
		kind: CallKind,
	) -> Result<HttpRequest> {
		let mut url = self.config.endpoint(&spec.path)?;

		if !spec.query.is_empty() {
			url.query_pairs_mut().extend_pairs(spec.query.iter());
		}

		let mut headers = vec![("accept".to_owned(), "application/json".to_owned())];

		if spec.body.is_some() {
			headers.push(("content-type".into(), "application/json".into()));
		}

		let mut caller_cookie = None;
		let mut caller_authorization = false;

		for (name, value) in &spec.headers {
			if name.eq_ignore_ascii_case("cookie") {
				caller_cookie = Some(value.as_str());

				continue;
			}
			if name.eq_ignore_ascii_case("authorization") {
				caller_authorization = true;
			}

			headers.push((name.clone(), value.clone()));
		}

		let credential_cookie = credentials.map(|pair| self.config.cookies.header_value(pair));
		let cookie = match (caller_cookie, credential_cookie) {
			(Some(caller), Some(ours)) => Some(format!("{caller}; {ours}")),
			(Some(caller), None) => Some(caller.to_owned()),
			(None, ours) => ours,
		};

		if let Some(cookie) = cookie {
			headers.push(("cookie".into(), cookie));
		}
		if let Some(pair) = credentials.filter(|_| self.config.bearer_header && !caller_authorization)
		{
			headers.push(("authorization".into(), pair.access_token.bearer()));
		}

		let default_timeout = match kind {
			CallKind::Refresh => self.config.refresh_timeout,
			_ => self.config.request_timeout,
		};

		Ok(HttpRequest {
			method: spec.method,
			url,
			headers,
			body: spec.body.clone(),
			timeout: spec.timeout.or(default_timeout),
		})
	}
}

/// Builds the structured error for a non-2xx response.
pub(crate) fn api_error(response: &HttpResponse) -> ApiError {
	let body = serde_json::from_slice::<serde_json::Value>(&response.body).ok();
	let message = body
		.as_ref()
		.and_then(json_message)
		.or_else(|| body_preview(&response.body))
		.unwrap_or_else(|| "no message from server".into());

	ApiError {
		status: response.status,
		message,
		retry_after: http::parse_retry_after(response),
		body,
	}
}

/// Decodes a 2xx body as JSON; an empty body decodes as `null`.
pub(crate) fn decode<R>(response: &HttpResponse) -> Result<R>
where
	R: DeserializeOwned,
{
	let raw: &[u8] =
		if response.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &response.body };
	let mut de = serde_json::Deserializer::from_slice(raw);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| Error::Decode { source, status: response.status })
}

fn json_message(body: &serde_json::Value) -> Option<String> {
	let object = body.as_object()?;

	["message", "error", "detail"].iter().find_map(|key| match object.get(*key)? {
		serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
		serde_json::Value::Object(nested) =>
			nested.get("message").and_then(serde_json::Value::as_str).map(str::to_owned),
		_ => None,
	})
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return None;
	}

	Some(text.chars().take(BODY_PREVIEW_LIMIT).collect())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		HttpResponse { status, headers: Vec::new(), body: body.as_bytes().to_vec() }
	}

	#[test]
	fn api_error_prefers_server_message_fields() {
		let err = api_error(&response(422, r#"{"message":"Room number already taken"}"#));

		assert_eq!(err.status, 422);
		assert_eq!(err.message, "Room number already taken");
		assert!(err.body.is_some());

		let nested = api_error(&response(400, r#"{"error":{"message":"Bad bed id"}}"#));

		assert_eq!(nested.message, "Bad bed id");
	}

	#[test]
	fn api_error_falls_back_to_body_preview_then_placeholder() {
		let text = api_error(&response(502, "upstream exploded"));

		assert_eq!(text.message, "upstream exploded");
		assert!(text.body.is_none());

		let long = "x".repeat(BODY_PREVIEW_LIMIT * 2);

		assert_eq!(api_error(&response(500, &long)).message.len(), BODY_PREVIEW_LIMIT);
		assert_eq!(api_error(&response(404, "")).message, "no message from server");
	}

	#[test]
	fn decode_treats_empty_bodies_as_null() {
		decode::<()>(&response(204, "")).expect("Empty body should decode as unit.");

		let missing: Option<u32> =
			decode(&response(200, " \n")).expect("Whitespace body should decode as None.");

		assert_eq!(missing, None);
	}

	#[test]
	fn decode_errors_carry_field_path_and_status() {
		#[derive(Debug, Deserialize)]
		struct Room {
			#[allow(dead_code)]
			beds: u32,
		}

		let err = decode::<Room>(&response(200, r#"{"beds":"two"}"#))
			.expect_err("A string bed count should not decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "beds");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn json_bodies_and_retry_markers_round_through_the_builder() {
		let spec = RequestSpec::post("/complaint-service/complaints")
			.json(&serde_json::json!({ "title": "Leaking tap" }))
			.expect("JSON body should encode.")
			.query("priority", "high");

		assert!(!spec.is_retried());
		assert!(spec.clone().retried().is_retried());
		assert_eq!(spec.body.as_deref(), Some(br#"{"title":"Leaking tap"}"#.as_slice()));
	}
}
