//! 401 interceptor: single-flight credential refresh and request replay.
//!
//! The refresh state lives behind one mutex. Admission, settlement, and queue draining
//! each happen inside a single critical section, so a caller either joins the refresh
//! that is in flight or starts a new one; it can never slip between a settled refresh
//! and the next. An epoch counter bumps whenever the stored credentials change. A 401
//! carrying credentials from an older epoch replays right away instead of starting a
//! second refresh, unless the refresh that followed it failed: then it receives that
//! cycle's shared error, so one wave never refreshes or navigates twice.
//!
//! Credential writes (refresh commit, login, logout) are serialized behind an async
//! lock. A refresh only commits when no login or logout advanced the epoch since it
//! began; otherwise its pair is discarded.

// std
use std::mem;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, IssuedTokens},
	client::{
		AuthClient,
		dispatch::RequestSpec,
		queue::{PendingQueue, PendingRequest, RefreshOutcome},
	},
	http::{HttpResponse, HttpTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Whether a credential refresh is currently in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh in flight.
	#[default]
	Idle,
	/// A refresh is in flight; further 401s park in the pending queue.
	Refreshing,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshState {
	phase: RefreshPhase,
	epoch: u64,
	/// Shared error of the last failed cycle; cleared by the next credential write.
	failure: Option<Arc<Error>>,
	queue: PendingQueue,
}
impl RefreshState {
	fn advance(&mut self) {
		self.epoch = self.epoch.wrapping_add(1);
		self.failure = None;
	}

	/// Ends the cycle that began at `started`.
	///
	/// A successful cycle already advanced the epoch when it committed. A failed one
	/// advances it here and caches the error, unless a login or logout moved the epoch
	/// first.
	fn settle(&mut self, started: u64, outcome: &RefreshOutcome) -> usize {
		if let Some(shared) = outcome.as_ref().err().filter(|_| self.epoch == started) {
			self.epoch = self.epoch.wrapping_add(1);
			self.failure = Some(shared.clone());
		}

		self.phase = RefreshPhase::Idle;

		self.queue.drain(outcome)
	}
}

enum Admission<'a> {
	/// Credentials changed since the failed request read them; replay without refreshing.
	Replay,
	/// The refresh that followed the failed request's credentials already failed.
	Reject(Arc<Error>),
	Flight(Flight<'a>),
}

enum Flight<'a> {
	Lead(RefreshLease<'a>),
	Wait(PendingRequest),
}

/// Leadership over one refresh cycle.
///
/// Dropping an unsettled lease (the leader's future was cancelled) returns the state
/// to idle and drops every parked sender, so waiters observe
/// [`Error::RefreshAborted`] instead of hanging.
struct RefreshLease<'a> {
	state: &'a Mutex<RefreshState>,
	started: u64,
	settled: bool,
}
impl<'a> RefreshLease<'a> {
	fn new(state: &'a Mutex<RefreshState>, started: u64) -> Self {
		Self { state, started, settled: false }
	}

	fn settle(mut self, outcome: &RefreshOutcome) -> usize {
		self.settled = true;

		self.state.lock().settle(self.started, outcome)
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let abandoned = {
			let mut state = self.state.lock();

			state.phase = RefreshPhase::Idle;

			mem::take(&mut state.queue)
		};

		obs::record_refresh_settled(false, abandoned.len());
	}
}

impl<T> AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Current refresh phase.
	pub fn refresh_phase(&self) -> RefreshPhase {
		self.refresh.lock().phase
	}

	/// Number of callers parked behind the in-flight refresh.
	pub fn pending_requests(&self) -> usize {
		self.refresh.lock().queue.len()
	}

	/// Refreshes the stored credentials, joining the refresh already in flight if there
	/// is one.
	///
	/// Failures are shared: every caller of one cycle receives the same
	/// [`Error::Refresh`], and a 401/403 from the refresh endpoint triggers exactly one
	/// login navigation.
	pub async fn refresh_credentials(&self) -> Result<CredentialPair> {
		let flight = self.join_refresh();

		self.await_refresh(flight).await
	}

	pub(crate) fn epoch(&self) -> u64 {
		self.refresh.lock().epoch
	}

	/// Runs a login or logout store write and starts a new epoch, superseding any
	/// refresh in flight.
	pub(crate) async fn write_credentials<F, R>(&self, write: F) -> R
	where
		F: Future<Output = R>,
	{
		let _writes = self.credential_writes.lock().await;
		let result = write.await;

		self.refresh.lock().advance();

		result
	}

	/// Recovers from a 401 answered to credentials read at `observed_epoch`, then replays
	/// `spec` once. The replay is never intercepted again.
	pub(crate) async fn recover(
		&self,
		spec: RequestSpec,
		observed_epoch: u64,
	) -> Result<HttpResponse> {
		let credentials = match self.admit(observed_epoch) {
			Admission::Replay => self.store.load().await?,
			Admission::Reject(shared) => return Err(Error::Refresh(shared)),
			Admission::Flight(flight) => Some(self.await_refresh(flight).await?),
		};

		self.replay(spec, credentials).await
	}

	fn admit(&self, observed_epoch: u64) -> Admission<'_> {
		let mut state = self.refresh.lock();

		if state.phase == RefreshPhase::Idle && state.epoch != observed_epoch {
			return match &state.failure {
				Some(shared) => Admission::Reject(shared.clone()),
				None => Admission::Replay,
			};
		}

		Admission::Flight(self.board(&mut state))
	}

	fn join_refresh(&self) -> Flight<'_> {
		let mut state = self.refresh.lock();

		self.board(&mut state)
	}

	fn board(&self, state: &mut RefreshState) -> Flight<'_> {
		match state.phase {
			RefreshPhase::Refreshing => Flight::Wait(state.queue.enqueue()),
			RefreshPhase::Idle => {
				state.phase = RefreshPhase::Refreshing;

				Flight::Lead(RefreshLease::new(&self.refresh, state.epoch))
			},
		}
	}

	async fn await_refresh(&self, flight: Flight<'_>) -> Result<CredentialPair> {
		match flight {
			Flight::Lead(lease) => self.lead_refresh(lease).await,
			Flight::Wait(pending) => {
				self.refresh_metrics.record_queued();

				pending.settled().await
			},
		}
	}

	async fn lead_refresh(&self, lease: RefreshLease<'_>) -> Result<CredentialPair> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "lead_refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome: RefreshOutcome =
			span.instrument(self.call_refresh_endpoint(lease.started)).await.map_err(Arc::new);

		if let Some(status @ (401 | 403)) = outcome.as_ref().err().and_then(|e| e.status()) {
			obs::record_login_redirect(&self.config.login_path, Some(status));
			self.navigator.redirect_to_login(&self.config.login_path);
		}

		let released = lease.settle(&outcome);

		obs::record_refresh_settled(outcome.is_ok(), released);

		match outcome {
			Ok(pair) => {
				self.refresh_metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);

				Ok(pair)
			},
			Err(shared) => {
				self.refresh_metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				Err(Error::Refresh(shared))
			},
		}
	}

	async fn call_refresh_endpoint(&self, started: u64) -> Result<CredentialPair> {
		let current = self.store.load().await?;
		let spec = RequestSpec::post(self.config.refresh_path.as_str()).retried();
		let response = self.dispatch(&spec, current.as_ref(), CallKind::Refresh).await?;
		let issued = IssuedTokens::from_body(&response.body)
			.or(self.config.cookies.capture(response.header_values("set-cookie")));
		let Some(access_token) = issued.access_token else {
			return Err(Error::InvalidRefreshResponse {
				reason: "no access token in the body or Set-Cookie headers".into(),
			});
		};
		let pair = match current {
			Some(current) => current.rotate(access_token, issued.refresh_token),
			None => CredentialPair {
				access_token,
				refresh_token: issued.refresh_token,
				updated_at: OffsetDateTime::now_utc(),
			},
		};

		let _writes = self.credential_writes.lock().await;

		if self.epoch() != started {
			return Err(Error::RefreshSuperseded);
		}

		self.store.save(pair.clone()).await?;
		self.refresh.lock().advance();

		Ok(pair)
	}

	async fn replay(
		&self,
		spec: RequestSpec,
		credentials: Option<CredentialPair>,
	) -> Result<HttpResponse> {
		const KIND: CallKind = CallKind::Replay;

		let span = CallSpan::new(KIND, "replay");
		let spec = spec.retried();

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_metrics.record_replay();

		let result = span.instrument(self.dispatch(&spec, credentials.as_ref(), KIND)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}
}
