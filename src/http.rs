//! HTTP seam for the client.
//!
//! Both Graph calls and the `oauth2` token grants go out through one [`GraphHttpClient`]. Each
//! call asks it for a fresh handle bound to a [`ResponseMetadataSlot`]; the handle records the
//! status and `Retry-After` of whatever answer came back, so a failed call can still be
//! classified as throttled or as an outage after the transport error has been flattened.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Which kind of endpoint a failed request was aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
	/// `{graph_url}/{version}/...` objects and edges.
	Graph,
	/// `oauth/access_token`.
	Token,
}
impl EndpointKind {
	/// Lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			EndpointKind::Graph => "graph",
			EndpointKind::Token => "token",
		}
	}
}
impl Display for EndpointKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Pluggable transport.
///
/// Implementors are shared behind `Arc` by every clone of a client, hence the
/// `'static + Send + Sync` bound. Handles own their state so the futures they return are
/// `Send`.
pub trait GraphHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error raised by the underlying stack.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-request handle handed to `oauth2` and to [`crate::graph::Session`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that reports into `slot`.
	///
	/// The handle clears `slot` before sending and stores the response status and retry hint
	/// as soon as headers arrive, whether or not the status is a success.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Status and retry hint of the last response seen by a handle.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status.
	pub status: Option<u16>,
	/// `Retry-After`, relative to when the response arrived.
	pub retry_after: Option<Duration>,
}

/// Shared cell a handle writes [`ResponseMetadata`] into.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Overwrites the slot.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Empties the slot, returning what it held.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Default transport backed by [`ReqwestClient`].
///
/// The same client also serves the token grants, so a custom client should keep redirect
/// following disabled.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Uses a preconfigured [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GraphHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.0.clone(), slot }
	}
}

/// [`ReqwestHttpClient`] handle bound to one [`ResponseMetadataSlot`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl ReqwestHandle {
	async fn send(
		client: ReqwestClient,
		slot: ResponseMetadataSlot,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<ReqwestError>> {
		slot.take();

		let request: reqwest::Request = request.try_into().map_err(Box::new)?;
		let response = client.execute(request).await.map_err(Box::new)?;
		let status = response.status();
		let headers = response.headers().clone();

		slot.store(ResponseMetadata {
			status: Some(status.as_u16()),
			retry_after: parse_retry_after(&headers),
		});

		let body = response.bytes().await.map_err(Box::new)?;
		let mut reply = HttpResponse::new(body.to_vec());

		*reply.status_mut() = status;
		*reply.headers_mut() = headers;

		Ok(reply)
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(Self::send(self.client.clone(), self.slot.clone(), request))
	}
}

// Delta-seconds or an HTTP date; dates already in the past carry no hint.
#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	match raw.parse::<u32>() {
		Ok(secs) => Some(Duration::seconds(secs.into())),
		Err(_) => OffsetDateTime::parse(raw, &Rfc2822)
			.ok()
			.map(|at| at - OffsetDateTime::now_utc())
			.filter(|delta| delta.is_positive()),
	}
}
