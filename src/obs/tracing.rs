// self
use crate::{
	_prelude::*,
	obs::{CallOutcome, Surface},
};

#[cfg(feature = "tracing")]
type Traced<F> = tracing::instrument::Instrumented<F>;
#[cfg(not(feature = "tracing"))]
type Traced<F> = F;

/// `facebook_graph.call` span for one client call; inert without the `tracing` feature.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens the span. `outcome` stays empty until [`CallSpan::settle`].
	pub fn new(surface: Surface, operation: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"facebook_graph.call",
					surface = surface.as_str(),
					operation,
					outcome = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (surface, operation);

			Self {}
		}
	}

	/// Runs `body` inside the span; used by the synchronous URL builders.
	pub fn in_scope<T>(&self, body: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(body)
		}
		#[cfg(not(feature = "tracing"))]
		{
			body()
		}
	}

	pub(crate) fn instrument<Fut>(&self, fut: Fut) -> Traced<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Stamps the final outcome on the span.
	pub fn settle(&self, outcome: CallOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());

			if !matches!(outcome, CallOutcome::Success) {
				self.span.in_scope(|| tracing::debug!(%outcome, "Graph call did not succeed."));
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn in_scope_returns_the_body_value() {
		let span = CallSpan::new(Surface::Auth, "auth_code_url");

		assert_eq!(span.in_scope(|| "dialog"), "dialog");

		span.settle(CallOutcome::Success);
	}

	#[tokio::test]
	async fn instrumented_futures_resolve_unchanged() {
		let span = CallSpan::new(Surface::Conversions, "upload_events");

		assert_eq!(span.instrument(async { 42 }).await, 42);

		span.settle(CallOutcome::Transient);
	}
}
