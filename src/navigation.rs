//! Login navigation hook invoked when a refresh proves the session is gone.
//!
//! The client calls [`LoginNavigator::redirect_to_login`] exactly once per failed
//! refresh cycle, and only when the refresh endpoint answered 401 or 403. Every caller
//! parked on that cycle still receives the refresh error, so callers that prefer routing
//! on a typed signal can check [`Error::is_session_expired`](crate::error::Error::is_session_expired)
//! and install [`NoopNavigator`].

// self
use crate::_prelude::*;

/// Side effect that sends the user back to the entry/login surface.
pub trait LoginNavigator
where
	Self: Send + Sync,
{
	/// Navigates to `login_path`.
	fn redirect_to_login(&self, login_path: &str);
}

/// Navigator that does nothing; the default for headless clients.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl LoginNavigator for NoopNavigator {
	fn redirect_to_login(&self, _login_path: &str) {}
}

/// Adapts a closure into a [`LoginNavigator`].
pub struct FnNavigator<F>(pub F);
impl<F> LoginNavigator for FnNavigator<F>
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect_to_login(&self, login_path: &str) {
		(self.0)(login_path)
	}
}
impl<F> Debug for FnNavigator<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnNavigator(..)")
	}
}

/// Navigator that remembers every redirect, for CLIs that poll for expiry and for tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator(Mutex<Vec<String>>);
impl RecordingNavigator {
	/// Returns the recorded redirect targets in order.
	pub fn redirects(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Returns how many redirects were recorded.
	pub fn count(&self) -> usize {
		self.0.lock().len()
	}
}
impl LoginNavigator for RecordingNavigator {
	fn redirect_to_login(&self, login_path: &str) {
		self.0.lock().push(login_path.to_owned());
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[test]
	fn recording_navigator_keeps_order() {
		let navigator = RecordingNavigator::default();

		navigator.redirect_to_login("/");
		navigator.redirect_to_login("/login");

		assert_eq!(navigator.redirects(), ["/", "/login"]);
		assert_eq!(navigator.count(), 2);
	}

	#[test]
	fn closures_act_as_navigators() {
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = hits.clone();
		let navigator: Arc<dyn LoginNavigator> = Arc::new(FnNavigator(move |path: &str| {
			assert_eq!(path, "/");
			counter.fetch_add(1, Ordering::Relaxed);
		}));

		navigator.redirect_to_login("/");
		NoopNavigator.redirect_to_login("/");

		assert_eq!(hits.load(Ordering::Relaxed), 1);
	}
}
