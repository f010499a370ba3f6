//! Session operations against the auth service.
//!
//! Login and logout bypass the 401 interceptor: a 401 from login means the credentials
//! were wrong, and a 401 from logout means there was nothing left to end. Both write the
//! credential store and advance the refresh epoch, so requests that read the previous
//! credentials replay instead of triggering a refresh, and a refresh still in flight
//! discards its pair instead of overwriting theirs.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, IssuedTokens},
	client::{self, AuthClient, RequestSpec},
	http::{HttpResponse, HttpTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	services::Service,
};

impl<T> AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Logs in with `credentials` and stores the issued tokens.
	///
	/// Tokens are read from the JSON body first and from `Set-Cookie` second. When the
	/// service issues no access token the store is left untouched. The response body is
	/// decoded as `R`.
	pub async fn login<B, R>(&self, credentials: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Login;

		let span = CallSpan::new(KIND, "login");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let spec =
					RequestSpec::post(Service::Auth.path("login")).json(credentials)?.retried();
				let response = self.dispatch(&spec, None, KIND).await?;

				self.store_issued(&response).await?;

				client::decode(&response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Ends the session on the server and clears the stored credentials.
	///
	/// The store is cleared even when the server call fails; that failure is still
	/// returned.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let current = self.store.load().await?;
				let spec = RequestSpec::post(Service::Auth.path("logout")).retried();
				let outcome = self.dispatch(&spec, current.as_ref(), KIND).await;
				let cleared = self.write_credentials(self.store.clear()).await;

				outcome?;
				cleared?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Fetches the signed-in user's profile.
	pub async fn me<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get(Service::Auth.path("me")).await
	}

	async fn store_issued(&self, response: &HttpResponse) -> Result<()> {
		let issued = IssuedTokens::from_body(&response.body)
			.or(self.config.cookies.capture(response.header_values("set-cookie")));
		let Some(access_token) = issued.access_token else { return Ok(()) };

		let pair = CredentialPair {
			access_token,
			refresh_token: issued.refresh_token,
			updated_at: OffsetDateTime::now_utc(),
		};

		self.write_credentials(self.store.save(pair)).await?;

		Ok(())
	}
}
