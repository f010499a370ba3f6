//! Stored credential pair and the token payloads issued by the auth service.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Access/refresh token pair held in the client's credential store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived credential authorizing API calls; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Longer-lived credential used solely against the refresh endpoint.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the pair was last written.
	pub updated_at: OffsetDateTime,
}
impl CredentialPair {
	/// Creates a pair holding only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			updated_at: OffsetDateTime::now_utc(),
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Produces the pair that follows a refresh: the access token is always replaced,
	/// the refresh token only when the service rotated it.
	pub fn rotate(&self, access_token: TokenSecret, refresh_token: Option<TokenSecret>) -> Self {
		Self {
			access_token,
			refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
			updated_at: OffsetDateTime::now_utc(),
		}
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("updated_at", &self.updated_at)
			.finish()
	}
}

/// Tokens found in an auth-service response, from its JSON body or `Set-Cookie` headers.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IssuedTokens {
	/// Newly issued access token.
	pub access_token: Option<TokenSecret>,
	/// Newly issued (rotated) refresh token.
	pub refresh_token: Option<TokenSecret>,
}
impl IssuedTokens {
	/// Reads tokens from a JSON body; bodies that are not JSON objects yield nothing.
	pub fn from_body(body: &[u8]) -> Self {
		#[derive(Deserialize)]
		#[serde(rename_all = "camelCase")]
		struct Payload {
			#[serde(default, alias = "access_token", alias = "token")]
			access_token: Option<String>,
			#[serde(default, alias = "refresh_token")]
			refresh_token: Option<String>,
		}

		match serde_json::from_slice::<Payload>(body) {
			Ok(payload) => Self {
				access_token: payload.access_token.filter(|v| !v.is_empty()).map(TokenSecret::new),
				refresh_token: payload
					.refresh_token
					.filter(|v| !v.is_empty())
					.map(TokenSecret::new),
			},
			Err(_) => Self::default(),
		}
	}

	/// Fills missing tokens from `other`; values already present win.
	pub fn or(self, other: Self) -> Self {
		Self {
			access_token: self.access_token.or(other.access_token),
			refresh_token: self.refresh_token.or(other.refresh_token),
		}
	}

	/// Returns `true` when neither token was issued.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none()
	}
}
impl Debug for IssuedTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedTokens")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
