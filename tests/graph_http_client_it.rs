#![cfg(all(feature = "reqwest", feature = "test"))]

// self
use facebook_graph::{
	_preludet::*,
	auth::Token,
	client::Client,
	error::{ConfigError, Error, Result, TransientError, TransportError},
	graph::Params,
	http::{EndpointKind, GraphHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
};

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	retry_after: Duration,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { retry_after }
	}
}
impl GraphHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, retry_after: self.retry_after }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	retry_after: Duration,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let retry_after = self.retry_after;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	calls: Arc<Mutex<Vec<(EndpointKind, Option<ResponseMetadata>)>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded(&self) -> Vec<(EndpointKind, Option<ResponseMetadata>)> {
		self.calls.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);
		let retry_after = meta.and_then(|value| value.retry_after);

		self.calls.lock().push((endpoint, meta.cloned()));

		match (endpoint, err) {
			(EndpointKind::Token, HttpClientError::Reqwest(inner)) => TransientError::TokenEndpoint {
				message: format!("Fake transport error: {inner}"),
				status,
				retry_after,
			}
			.into(),
			(EndpointKind::Graph, HttpClientError::Reqwest(_)) =>
				TransientError::GraphEndpoint { status: status.unwrap_or_default(), retry_after }
					.into(),
			(_, HttpClientError::Http(inner)) => ConfigError::from(inner).into(),
			(_, HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
			(_, other) => TransportError::Io(std::io::Error::other(format!(
				"Unhandled HTTP client error variant: {other:?}"
			)))
			.into(),
		}
	}
}

fn fake_client(
	retry_after: Duration,
) -> (Client<FakeHttpClient, RecordingTransportErrorMapper>, RecordingTransportErrorMapper) {
	let mapper = RecordingTransportErrorMapper::default();
	let client = Client::with_http_client(
		test_config("https://graph.example.com", "fake-app", "fake-secret"),
		FakeHttpClient::throttled(retry_after),
		mapper.clone(),
	)
	.expect("Fake client configuration should be valid.");

	(client, mapper)
}

#[tokio::test]
async fn fake_transport_surfaces_token_metadata() {
	let (client, mapper) = fake_client(Duration::seconds(5));
	let err = client
		.exchange_oauth2_code("code")
		.await
		.expect_err("Request should be throttled with HTTP 429.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	let observed = mapper.recorded();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");
	assert_eq!(observed[0].0, EndpointKind::Token);
}

#[tokio::test]
async fn fake_mapper_captures_graph_metadata() {
	let (client, mapper) = fake_client(Duration::seconds(30));
	let client = client.auth(&Token::new("fake-token"), None);
	let err = client.me(Params::new()).await.expect_err("Request should be throttled.");

	assert!(matches!(err, Error::Transient(TransientError::GraphEndpoint { status: 429, .. })));

	let observed = mapper.recorded();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");

	let (endpoint, meta) = observed.into_iter().next().expect("One call should be recorded.");
	let meta = meta.expect("Response metadata should be recorded exactly once.");

	assert_eq!(endpoint, EndpointKind::Graph);
	assert_eq!(meta.status, Some(429));
	assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
}
