//! Signed Graph API calls.
//!
//! A [`Session`] turns `(method, path, params)` into one HTTP request against
//! `{graph_url}/{version}{path}`, attaches the bearer token (plus `appsecret_proof` and
//! `debug` when configured), dispatches it through the configured [`GraphHttpClient`], and
//! decodes the JSON reply. Provider error envelopes become [`Error::Api`].
//!
//! Sessions derived from a full [`Token`] redeem its refresh token once the access token
//! expires. Concurrent calls share a single refresh and every clone sees the rotated token.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Method as HttpMethod, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	config::Config,
	error::{ConfigError, DecodeError, GraphApiError, TransientError},
	graph::{BatchResponse, GraphResult, Params, signing},
	http::{EndpointKind, GraphHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{BasicFacade, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
const REFRESH_LEEWAY: Duration = Duration::seconds(30);

/// HTTP methods used by Graph calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// Read an object or edge; params travel in the query string.
	Get,
	/// Create or update; params travel as a form body.
	Post,
	/// Replace; params travel as a form body.
	Put,
	/// Remove; params travel as a form body so large payloads fit.
	Delete,
}
impl Method {
	/// Returns the HTTP verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}

	fn to_http(self) -> HttpMethod {
		match self {
			Method::Get => HttpMethod::GET,
			Method::Post => HttpMethod::POST,
			Method::Put => HttpMethod::PUT,
			Method::Delete => HttpMethod::DELETE,
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport stack.
pub type ReqwestSession = Session<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Signs and sends Graph API requests.
pub struct Session<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	config: Arc<Config>,
	credentials: Option<Arc<Credentials<C, M>>>,
}
impl<C, M> Session<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an unauthenticated session.
	pub fn new(
		config: impl Into<Arc<Config>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: config.into(),
			credentials: None,
		}
	}

	/// Returns a copy of the session that signs calls with a fixed `access_token`.
	pub fn with_access_token(&self, access_token: impl Into<TokenSecret>) -> Self {
		self.with_credentials(Credentials::new(Token::new(access_token), None))
	}

	/// Returns a copy of the session that signs calls with `token` and redeems its refresh
	/// token through `refresher` once it expires.
	pub(crate) fn with_token(&self, token: Token, refresher: BasicFacade<C, M>) -> Self {
		self.with_credentials(Credentials::new(token, Some(refresher)))
	}

	/// Snapshot of the token currently attached to the session, including refreshed values.
	pub fn token(&self) -> Option<Token> {
		self.credentials.as_ref().map(|credentials| credentials.token.lock().clone())
	}

	/// Configuration the session was built from.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Graph API version prefixed to every path.
	pub fn version(&self) -> &str {
		&self.config.version
	}

	/// Resolves the absolute URL for a Graph path.
	///
	/// `.` and `..` segments are rejected so a path can never escape the versioned root.
	pub fn url(&self, path: &str) -> Result<Url> {
		if path.split('/').any(|segment| segment == "." || segment == "..") {
			return Err(ConfigError::InvalidPath { path: path.to_owned() }.into());
		}

		let path = self.config.versioned(path);

		Ok(crate::config::join_endpoint("graph", &self.config.graph_url, &path)?)
	}

	/// Shorthand for [`Session::api`] with [`Method::Get`].
	pub async fn get(&self, path: &str, params: Params) -> Result<GraphResult> {
		self.api(path, Method::Get, params).await
	}

	/// Shorthand for [`Session::api`] with [`Method::Post`].
	pub async fn post(&self, path: &str, params: Params) -> Result<GraphResult> {
		self.api(path, Method::Post, params).await
	}

	/// Shorthand for [`Session::api`] with [`Method::Put`].
	pub async fn put(&self, path: &str, params: Params) -> Result<GraphResult> {
		self.api(path, Method::Put, params).await
	}

	/// Shorthand for [`Session::api`] with [`Method::Delete`].
	pub async fn delete(&self, path: &str, params: Params) -> Result<GraphResult> {
		self.api(path, Method::Delete, params).await
	}

	/// Performs one Graph call and decodes the JSON object it returns.
	pub async fn api(&self, path: &str, method: Method, params: Params) -> Result<GraphResult> {
		let value = self.call(method, path, params).await?;

		Ok(GraphResult::try_from(value)?)
	}

	/// Sends a batch call (`POST /` with `batch=[...]`).
	///
	/// Each request is forwarded as-is (`method`, `relative_url`, `body`, `name`, ...), and
	/// `batch_params` ride alongside the `batch` field (e.g. `include_headers`). Entries come
	/// back in request order; the provider reports `null` for requests it did not run.
	pub async fn batch<I>(
		&self,
		batch_params: Params,
		requests: I,
	) -> Result<Vec<Option<BatchResponse>>>
	where
		I: IntoIterator<Item = Params>,
	{
		let requests = requests.into_iter().collect::<Vec<_>>();
		let batch = serde_json::to_value(&requests).map_err(ConfigError::ParamsEncode)?;
		let mut params = batch_params;

		params.insert("batch", batch);

		let value = self.call(Method::Post, "/", params).await?;

		if !value.is_array() {
			return Err(DecodeError::UnexpectedShape { expected: "a JSON array" }.into());
		}

		Ok(crate::graph::result::decode_value(&value)?)
	}

	/// Verifies a signed request with the configured app secret.
	pub fn parse_signed_request(&self, signed_request: &str) -> Result<GraphResult> {
		let secret = &self.config.oauth2.client_secret;

		if secret.is_empty() {
			return Err(ConfigError::MissingAppSecret.into());
		}

		Ok(signing::parse_signed_request(secret.expose(), signed_request)?)
	}

	fn with_credentials(&self, credentials: Credentials<C, M>) -> Self {
		let mut session = self.clone();

		session.credentials = Some(Arc::new(credentials));

		session
	}

	async fn call(&self, method: Method, path: &str, params: Params) -> Result<Value> {
		let access_token = match &self.credentials {
			Some(credentials) => Some(credentials.access_token().await?),
			None => None,
		};
		let request = self.build_request(method, path, params, access_token.as_ref())?;

		#[cfg(feature = "tracing")]
		tracing::debug!(method = method.as_str(), path, "Dispatching Graph request.");

		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.transport_mapper.map_transport_error(EndpointKind::Graph, slot.take().as_ref(), err)
		})?;
		let meta = slot.take().unwrap_or_else(|| ResponseMetadata {
			status: Some(response.status().as_u16()),
			retry_after: None,
		});
		let status = response.status().as_u16();

		#[cfg(feature = "tracing")]
		tracing::debug!(status, path, "Graph response received.");

		decode_response(status, meta.retry_after, response.body())
	}

	fn build_request(
		&self,
		method: Method,
		path: &str,
		mut params: Params,
		access_token: Option<&TokenSecret>,
	) -> Result<HttpRequest> {
		let mut url = self.url(path)?;

		self.sign(&mut params, access_token);

		let pairs = params.encode();
		let mut builder =
			Request::builder().method(method.to_http()).header(ACCEPT, JSON_CONTENT_TYPE);

		if let Some(token) = access_token {
			builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
		}

		let request = match method {
			Method::Get => {
				if !pairs.is_empty() {
					url.query_pairs_mut().extend_pairs(pairs.iter());
				}

				builder.uri(url.as_str()).body(Vec::new())
			},
			Method::Post | Method::Put | Method::Delete => {
				let body = FormSerializer::new(String::new()).extend_pairs(pairs.iter()).finish();

				builder
					.uri(url.as_str())
					.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
					.body(body.into_bytes())
			},
		};

		Ok(request.map_err(ConfigError::from)?)
	}

	fn sign(&self, params: &mut Params, access_token: Option<&TokenSecret>) {
		if let Some(token) = access_token
			&& self.config.appsecret_proof
			&& !self.config.oauth2.client_secret.is_empty()
		{
			params.insert_default(
				"appsecret_proof",
				signing::appsecret_proof(self.config.oauth2.client_secret.expose(), token.expose()),
			);
		}
		if let Some(mode) = self.config.debug {
			params.insert_default("debug", mode.as_str());
		}
	}
}
impl<C, M> Clone for Session<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			credentials: self.credentials.clone(),
		}
	}
}
impl<C, M> Debug for Session<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("graph_url", &self.config.graph_url.as_str())
			.field("version", &self.config.version)
			.field("access_token_set", &self.credentials.is_some())
			.finish()
	}
}

struct Credentials<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	token: Mutex<Token>,
	refresher: Option<BasicFacade<C, M>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C, M> Credentials<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn new(token: Token, refresher: Option<BasicFacade<C, M>>) -> Self {
		Self { token: Mutex::new(token), refresher, refresh_guard: AsyncMutex::new(()) }
	}

	async fn access_token(&self) -> Result<TokenSecret> {
		let Some(refresher) = &self.refresher else {
			return Ok(self.current());
		};

		if self.pending_refresh().is_none() {
			return Ok(self.current());
		}

		let _singleflight = self.refresh_guard.lock().await;
		// Another caller may have rotated the token while this one waited.
		let Some(refresh_token) = self.pending_refresh() else {
			return Ok(self.current());
		};

		#[cfg(feature = "tracing")]
		tracing::debug!("Refreshing expired access token.");

		let refreshed = refresher.refresh(refresh_token.expose()).await?;
		let access_token = refreshed.access_token.clone();

		*self.token.lock() = refreshed;

		Ok(access_token)
	}

	fn current(&self) -> TokenSecret {
		self.token.lock().access_token.clone()
	}

	fn pending_refresh(&self) -> Option<TokenSecret> {
		let token = self.token.lock();

		if token.is_expired_at(OffsetDateTime::now_utc() + REFRESH_LEEWAY) {
			token.refresh_token.clone()
		} else {
			None
		}
	}
}

/// Decodes a Graph response body, surfacing provider error envelopes.
pub(crate) fn decode_response(
	status: u16,
	retry_after: Option<Duration>,
	body: &[u8],
) -> Result<Value> {
	let success = (200..300).contains(&status);
	let value: Value =
		match serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(body)) {
			Ok(value) => value,
			Err(_) if !success =>
				return Err(TransientError::GraphEndpoint { status, retry_after }.into()),
			Err(source) => return Err(DecodeError::json(source, Some(status)).into()),
		};

	if let Some(err) = GraphApiError::from_body(&value, Some(status)) {
		return Err(err.into());
	}
	if !success {
		return Err(TransientError::GraphEndpoint { status, retry_after }.into());
	}

	Ok(value)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decode_response_maps_error_envelopes() {
		let body = br#"{"error":{"message":"Unsupported get request.","type":"GraphMethodException","code":100,"error_subcode":33}}"#;
		let err = decode_response(400, None, body).expect_err("Error envelope must fail.");

		match err {
			Error::Api(api) => {
				assert_eq!(api.code, 100);
				assert_eq!(api.error_subcode, Some(33));
				assert_eq!(api.status, Some(400));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn decode_response_classifies_non_json_bodies() {
		let err = decode_response(502, Some(Duration::seconds(3)), b"<html>Bad gateway</html>")
			.expect_err("HTML error page must fail.");

		assert!(matches!(
			err,
			Error::Transient(TransientError::GraphEndpoint { status: 502, retry_after: Some(_) })
		));

		let err = decode_response(200, None, b"not json").expect_err("Malformed JSON must fail.");

		assert!(matches!(err, Error::Decode(DecodeError::Json { status: Some(200), .. })));
	}

	#[test]
	fn decode_response_rejects_bare_failure_status() {
		let err = decode_response(500, None, b"{}").expect_err("Server errors must fail.");

		assert!(matches!(err, Error::Transient(TransientError::GraphEndpoint { status: 500, .. })));
		assert_eq!(
			decode_response(200, None, br#"{"id":"1"}"#).expect("Success body should decode."),
			serde_json::json!({ "id": "1" })
		);
	}

	#[test]
	fn method_labels() {
		assert_eq!(Method::Get.to_string(), "GET");
		assert_eq!(Method::Put.as_str(), "PUT");
		assert_eq!(Method::Put.to_http(), HttpMethod::PUT);
		assert_eq!(Method::Delete.to_http(), HttpMethod::DELETE);
	}

	#[cfg(feature = "reqwest")]
	fn session() -> ReqwestSession {
		let oauth2 = crate::config::OAuth2Config::new("app-1", "shh");

		Session::new(Config::new(oauth2), ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn url_rejects_dot_segments() {
		let session = session();

		assert_eq!(
			session.url("/23850000/users").expect("Plain path should resolve.").as_str(),
			"https://graph.facebook.com/v21.0/23850000/users"
		);

		for path in ["/../users", "/./me", "me/.."] {
			assert!(
				matches!(session.url(path), Err(Error::Config(ConfigError::InvalidPath { .. }))),
				"`{path}` must be rejected."
			);
		}
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn delete_and_put_send_form_bodies() {
		let session = session();
		let token = TokenSecret::new("user-token");
		let params = Params::from([("payload", "{\"schema\":[\"EMAIL\"]}")]);

		for method in [Method::Delete, Method::Put] {
			let request = session
				.build_request(method, "/23850000/users", params.clone(), Some(&token))
				.expect("Request should build.");

			assert_eq!(*request.method(), method.to_http());
			assert_eq!(request.uri().query(), None);
			assert_eq!(
				request.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
				Some(FORM_CONTENT_TYPE)
			);
			assert_eq!(
				request.body().as_slice(),
				b"payload=%7B%22schema%22%3A%5B%22EMAIL%22%5D%7D".as_slice()
			);
		}
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn fixed_access_tokens_are_exposed_as_tokens() {
		let session = session();

		assert!(session.token().is_none());
		assert_eq!(
			session.with_access_token("user-token").token().map(|token| token.access_token),
			Some(TokenSecret::new("user-token"))
		);
	}
}
