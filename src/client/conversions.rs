//! Conversions datasets and event uploads.

// self
use crate::{
	_prelude::*,
	auth::{AdAccountId, DatasetId},
	client::Client,
	graph::{GraphResult, Params},
	http::GraphHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, Surface},
};

/// Reply to an event upload; decode it with [`GraphResult::decode`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEventsResponse {
	/// Number of events the dataset accepted.
	#[serde(default)]
	pub events_received: u64,
	/// Diagnostic messages.
	#[serde(default)]
	pub messages: Vec<String>,
	/// Provider trace identifier.
	#[serde(default)]
	pub fbtrace_id: Option<String>,
}

impl<C, M> Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// `GET /{dataset_id}`.
	pub async fn dataset(&self, dataset_id: &DatasetId, params: Params) -> Result<GraphResult> {
		obs::observe(
			Surface::Conversions,
			"dataset",
			self.session.get(&format!("/{dataset_id}"), params),
		)
		.await
	}

	/// `GET /act_{ad_account_id}/adspixels`.
	pub async fn datasets(&self, ad_account_id: &AdAccountId, params: Params) -> Result<GraphResult> {
		obs::observe(
			Surface::Conversions,
			"datasets",
			self.session.get(&format!("/{}/adspixels", ad_account_id.node()), params),
		)
		.await
	}

	/// `POST /{dataset_id}/events`; events travel in the `data` param.
	pub async fn upload_events(&self, dataset_id: &DatasetId, params: Params) -> Result<GraphResult> {
		obs::observe(
			Surface::Conversions,
			"upload_events",
			self.session.post(&format!("/{dataset_id}/events"), params),
		)
		.await
	}
}
