// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{CallOutcome, Surface};

/// Bumps `facebook_graph_call_total` for `surface` and `outcome`.
pub fn record_call_outcome(surface: Surface, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"facebook_graph_call_total",
		"surface" => surface.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (surface, outcome);
}

/// Feeds `facebook_graph_call_duration_seconds` with the wall time of one settled call.
pub fn record_call_duration(surface: Surface, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("facebook_graph_call_duration_seconds", "surface" => surface.as_str())
		.record(elapsed.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (surface, elapsed);
}
