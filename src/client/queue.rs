//! Pending-request queue parking callers behind an in-flight refresh.

// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::CredentialPair};

/// Result shared with every caller parked on one refresh cycle.
pub(crate) type RefreshOutcome = Result<CredentialPair, Arc<Error>>;

/// Callers waiting for the refresh currently in flight, in arrival order.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}
impl PendingQueue {
	/// Parks a new caller and returns its side of the rendezvous.
	pub(crate) fn enqueue(&mut self) -> PendingRequest {
		let (tx, rx) = oneshot::channel();

		self.waiters.push(tx);

		PendingRequest(rx)
	}

	/// Releases every parked caller with `outcome` and empties the queue.
	///
	/// Callers that already gave up (dropped their [`PendingRequest`]) are skipped. Returns
	/// the number of callers that received the outcome.
	pub(crate) fn drain(&mut self, outcome: &RefreshOutcome) -> usize {
		self.waiters.drain(..).fold(0, |released, waiter| {
			if waiter.send(outcome.clone()).is_ok() { released + 1 } else { released }
		})
	}

	pub(crate) fn len(&self) -> usize {
		self.waiters.len()
	}
}

/// A parked caller's handle; resolves once the refresh it waits on settles.
#[derive(Debug)]
pub(crate) struct PendingRequest(oneshot::Receiver<RefreshOutcome>);
impl PendingRequest {
	/// Waits for the refresh outcome. A refresh that vanished without settling yields
	/// [`Error::RefreshAborted`].
	pub(crate) async fn settled(self) -> Result<CredentialPair> {
		match self.0.await {
			Ok(Ok(pair)) => Ok(pair),
			Ok(Err(shared)) => Err(Error::Refresh(shared)),
			Err(oneshot::Canceled) => Err(Error::RefreshAborted),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn drain_releases_every_waiter_with_the_same_credentials() {
		let mut queue = PendingQueue::default();
		let first = queue.enqueue();
		let second = queue.enqueue();

		assert_eq!(queue.len(), 2);

		let pair = CredentialPair::new("fresh");

		assert_eq!(queue.drain(&Ok(pair.clone())), 2);
		assert_eq!(queue.len(), 0);
		assert_eq!(first.settled().await.expect("First waiter should resolve."), pair);
		assert_eq!(second.settled().await.expect("Second waiter should resolve."), pair);
	}

	#[tokio::test]
	async fn drain_rejects_waiters_with_the_shared_error() {
		let mut queue = PendingQueue::default();
		let waiter = queue.enqueue();
		let shared = Arc::new(Error::InvalidRefreshResponse { reason: "empty".into() });

		queue.drain(&Err(shared.clone()));

		match waiter.settled().await {
			Err(Error::Refresh(inner)) => assert!(Arc::ptr_eq(&inner, &shared)),
			other => panic!("Unexpected waiter outcome: {other:?}."),
		}
	}

	#[tokio::test]
	async fn abandoned_waiters_are_skipped_and_lost_senders_abort() {
		let mut queue = PendingQueue::default();
		let gone = queue.enqueue();
		let kept = queue.enqueue();

		drop(gone);

		assert_eq!(queue.drain(&Ok(CredentialPair::new("x"))), 1);
		assert!(kept.settled().await.is_ok());

		let orphan = queue.enqueue();

		drop(queue);

		assert!(matches!(orphan.settled().await, Err(Error::RefreshAborted)));
	}
}
