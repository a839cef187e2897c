//! Call instrumentation for the client surfaces.
//!
//! Every public network call runs through [`observe`]. With the `tracing` feature it opens a
//! `facebook_graph.call` span carrying `surface`, `operation` and, once settled, `outcome`.
//! With the `metrics` feature it bumps `facebook_graph_call_total{surface, outcome}` and feeds
//! `facebook_graph_call_duration_seconds{surface}`. Both are no-ops when their feature is off.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Client surface a call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
	/// Login, token exchange, revocation.
	Auth,
	/// Custom audiences.
	Audiences,
	/// Datasets and events.
	Conversions,
	/// Token owner lookups.
	Me,
}
impl Surface {
	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Surface::Auth => "auth",
			Surface::Audiences => "audiences",
			Surface::Conversions => "conversions",
			Surface::Me => "me",
		}
	}
}
impl Display for Surface {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a call ended, as seen by telemetry.
///
/// Failures are split by who is at fault so dashboards can tell a provider rejection from a
/// flaky network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// The call started.
	Attempt,
	/// The call returned `Ok`.
	Success,
	/// Graph answered with an error envelope.
	Rejected,
	/// Retryable failure: outage, throttling, or transport error.
	Transient,
	/// Anything else, including configuration and decode errors.
	Failure,
}
impl CallOutcome {
	/// Classifies a settled call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => CallOutcome::Success,
			Err(Error::Api(_)) => CallOutcome::Rejected,
			Err(Error::Transient(_) | Error::Transport(_)) => CallOutcome::Transient,
			Err(_) => CallOutcome::Failure,
		}
	}

	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Rejected => "rejected",
			CallOutcome::Transient => "transient",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

pub(crate) async fn observe<T, Fut>(surface: Surface, operation: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = CallSpan::new(surface, operation);
	let started = Instant::now();

	record_call_outcome(surface, CallOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = CallOutcome::of(&result);

	span.settle(outcome);
	record_call_outcome(surface, outcome);
	record_call_duration(surface, started.elapsed());

	result
}
