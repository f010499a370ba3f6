// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("pg_auth_client.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the settlement of a refresh cycle and how many parked callers it released.
pub fn record_refresh_settled(succeeded: bool, released: usize) {
	#[cfg(feature = "tracing")]
	{
		if succeeded {
			tracing::info!(released, "credential refresh succeeded");
		} else {
			tracing::warn!(released, "credential refresh failed");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (succeeded, released);
	}
}

/// Emits the forced navigation to the login route.
pub fn record_login_redirect(login_path: &str, status: Option<u16>) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(login_path, ?status, "session expired; redirecting to login");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (login_path, status);
	}
}
