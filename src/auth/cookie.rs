//! Cookie names, `Cookie` header rendering, and `Set-Cookie` capture for the credential pair.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, IssuedTokens, TokenSecret},
	error::ConfigError,
};

/// Names of the cookies carrying the credential pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieNames {
	/// Cookie carrying the access token.
	pub access: String,
	/// Cookie carrying the refresh token.
	pub refresh: String,
}
impl CookieNames {
	/// Rejects names that cannot appear as a cookie-name token.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for name in [&self.access, &self.refresh] {
			if !is_token(name) {
				return Err(ConfigError::InvalidCookieName { name: name.to_owned() });
			}
		}

		Ok(())
	}

	/// Renders the `Cookie` header value that carries `pair`.
	pub fn header_value(&self, pair: &CredentialPair) -> String {
		let mut value = format!("{}={}", self.access, pair.access_token.expose());

		if let Some(refresh) = &pair.refresh_token {
			value.push_str("; ");
			value.push_str(&self.refresh);
			value.push('=');
			value.push_str(refresh.expose());
		}

		value
	}

	/// Collects credential cookies from `Set-Cookie` header values. Cookies with other
	/// names and deletions (empty values) are ignored.
	pub fn capture<'a>(&self, set_cookie: impl IntoIterator<Item = &'a str>) -> IssuedTokens {
		let mut issued = IssuedTokens::default();

		for header in set_cookie {
			let Some((name, value)) = parse_pair(header) else { continue };

			if value.is_empty() {
				continue;
			}
			if name == self.access {
				issued.access_token = Some(TokenSecret::new(value));
			} else if name == self.refresh {
				issued.refresh_token = Some(TokenSecret::new(value));
			}
		}

		issued
	}
}
impl Default for CookieNames {
	fn default() -> Self {
		Self { access: "accessToken".into(), refresh: "refreshToken".into() }
	}
}

fn parse_pair(header: &str) -> Option<(&str, &str)> {
	let first = header.split(';').next()?;
	let (name, value) = first.split_once('=')?;
	let value = value.trim();
	let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);

	Some((name.trim(), value))
}

fn is_token(name: &str) -> bool {
	!name.is_empty()
		&& name.bytes().all(|b| {
			b.is_ascii_graphic()
				&& !matches!(
					b,
					b'(' | b')'
						| b'<' | b'>' | b'@'
						| b',' | b';' | b':'
						| b'\\' | b'"' | b'/'
						| b'[' | b']' | b'?'
						| b'=' | b'{' | b'}'
				)
		})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_value_includes_refresh_cookie_when_present() {
		let names = CookieNames::default();
		let access_only = CredentialPair::new("a1");
		let both = CredentialPair::new("a1").with_refresh_token("r1");

		assert_eq!(names.header_value(&access_only), "accessToken=a1");
		assert_eq!(names.header_value(&both), "accessToken=a1; refreshToken=r1");
	}

	#[test]
	fn capture_reads_only_credential_cookies() {
		let names = CookieNames::default();
		let issued = names.capture([
			"accessToken=new-access; Path=/; HttpOnly; Max-Age=900",
			"theme=dark; Path=/",
			"refreshToken=\"new-refresh\"; Path=/auth-service; HttpOnly",
		]);

		assert_eq!(issued.access_token.as_ref().map(TokenSecret::expose), Some("new-access"));
		assert_eq!(issued.refresh_token.as_ref().map(TokenSecret::expose), Some("new-refresh"));
	}

	#[test]
	fn capture_ignores_deletions_and_garbage() {
		let names = CookieNames::default();
		let issued = names.capture(["accessToken=; Max-Age=0", "no-equals-sign", ""]);

		assert!(issued.is_empty());
	}

	#[test]
	fn validate_rejects_separator_characters() {
		let bad = CookieNames { access: "access token".into(), ..CookieNames::default() };

		assert!(matches!(bad.validate(), Err(ConfigError::InvalidCookieName { .. })));
		assert!(CookieNames::default().validate().is_ok());
	}
}
