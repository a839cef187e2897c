//! OAuth delegate built on the `oauth2` crate, plus transport error mapping shared with Graph
//! calls.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
	EndpointSet, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, Scope,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	config::Config,
	error::{ConfigError, GraphApiError, TransientError, TransportError},
	http::{EndpointKind, GraphHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a client error.
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_generic_transport_error(endpoint, meta, "unknown HTTP client failure"),
		}
	}
}

/// RFC 6749 error categories surfaced by the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorKind {
	/// Provider rejected the authorization grant (bad code or refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the application may ask for.
	InsufficientScope,
	/// Anything else; the caller may try again later.
	Transient,
}

/// Classifies a token endpoint error from its `error` code, `error_description`, and HTTP status.
///
/// Structured OAuth fields win; description text is scanned next and the status code is the
/// last resort.
pub fn classify_token_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
	status: Option<u16>,
) -> TokenErrorKind {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| error_description.and_then(classify_text))
		.unwrap_or_else(|| classify_status(status))
}

/// `oauth2`-backed delegate for the authorization dialog and token endpoint.
pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &Config,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let mut oauth_client = BasicClient::new(ClientId::new(config.oauth2.client_id.clone()))
			.set_auth_uri(AuthUrl::from_url(config.authorization_url()?))
			.set_token_uri(TokenUrl::from_url(config.token_url()?))
			.set_client_secret(ClientSecret::new(config.oauth2.client_secret.expose().to_owned()))
			.set_auth_type(AuthType::RequestBody);

		if let Some(redirect) = &config.oauth2.redirect_url {
			oauth_client = oauth_client.set_redirect_uri(RedirectUrl::from_url(redirect.clone()));
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Builds the login dialog URL.
	pub(crate) fn authorize_url(
		&self,
		state: &str,
		scopes: &[String],
		redirect_uri: Option<&Url>,
		extra_params: &[(String, String)],
	) -> Url {
		let state = state.to_owned();
		let mut request = self
			.oauth_client
			.authorize_url(move || CsrfToken::new(state))
			.add_scopes(scopes.iter().map(|scope| Scope::new(scope.clone())));

		if let Some(redirect) = redirect_uri {
			request = request.set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect.clone())));
		}
		for (key, value) in extra_params {
			request = request.add_extra_param(key.as_str(), value.as_str());
		}

		let (url, _) = request.url();

		url
	}

	/// Exchanges an authorization code for a token.
	pub(crate) async fn exchange_code(&self, code: &str, redirect_uri: Option<&Url>) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(redirect) = redirect_uri {
			request = request.set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect.clone())));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_token_response(response)
	}

	/// Redeems a refresh token for a fresh access token.
	pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;
		let token = map_token_response(response)?;

		// Keep the caller's refresh token when the provider does not rotate it.
		Ok(match token.refresh_token {
			Some(_) => token,
			None => token.with_refresh_token(refresh_token),
		})
	}
}
impl<C, M> Clone for BasicFacade<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			oauth_client: self.oauth_client.clone(),
			http_client: self.http_client.clone(),
			error_mapper: self.error_mapper.clone(),
		}
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<Token> {
	let mut token = Token::new(response.access_token().secret().to_owned())
		.with_token_type(response.token_type().as_ref());

	if let Some(expires_in) = response.expires_in() {
		let expires_in =
			i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		token = token.with_expires_in(Duration::seconds(expires_in));
	}
	if let Some(refresh) = response.refresh_token() {
		token = token.with_refresh_token(refresh.secret().to_owned());
	}

	Ok(token)
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(EndpointKind::Token, meta_ref, error),
		RequestTokenError::Parse(error, body) => {
			// The token endpoint reports most failures with a Graph error envelope.
			if let Ok(value) = serde_json::from_slice::<Value>(&body)
				&& let Some(api) = GraphApiError::from_body(&value, meta_status(meta_ref))
			{
				return api.into();
			}

			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into()
		},
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref();
	let description = response.error_description().map(String::as_str);
	let message = match description {
		Some(description) => format!("{code}: {description}"),
		None => code.to_owned(),
	};

	match classify_token_error(Some(code), description, meta_status(meta)) {
		TokenErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		TokenErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		TokenErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		TokenErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	endpoint: EndpointKind,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() && endpoint == EndpointKind::Token {
		return TransientError::TokenEndpoint {
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::network(endpoint.as_str(), err).into()
}

fn map_generic_transport_error(
	endpoint: EndpointKind,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	match (endpoint, meta_status(meta)) {
		(EndpointKind::Token, status) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status,
			retry_after: meta_retry_after(meta),
		}
		.into(),
		(EndpointKind::Graph, Some(status)) =>
			TransientError::GraphEndpoint { status, retry_after: meta_retry_after(meta) }.into(),
		(EndpointKind::Graph, None) =>
			TransportError::Io(std::io::Error::other(message.to_string())).into(),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

fn match_exact_value(value: &str) -> Option<TokenErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(TokenErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(TokenErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: &str) -> Option<TokenErrorKind> {
	let lowered = text.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(TokenErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(TokenErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(TokenErrorKind::InsufficientScope),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400 | 404 | 410) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		Some(403) => TokenErrorKind::InsufficientScope,
		_ => TokenErrorKind::Transient,
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use oauth2::{
		AccessToken, EmptyExtraTokenFields, StandardTokenResponse, basic::BasicTokenType,
	};
	// self
	use super::*;
	use crate::{config::OAuth2Config, http::ReqwestHttpClient};

	fn facade(config: &Config) -> BasicFacade<ReqwestHttpClient, ReqwestTransportErrorMapper> {
		BasicFacade::from_config(
			config,
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.expect("Facade should build from a valid config.")
	}

	fn config() -> Config {
		Config::new(
			OAuth2Config::new("app-1", "shh").with_redirect_url(
				Url::parse("https://app.example.com/cb").expect("Redirect fixture should parse."),
			),
		)
	}

	#[test]
	fn authorize_url_carries_client_scopes_and_state() {
		let url = facade(&config()).authorize_url(
			"state-123",
			&["email".into(), "ads_management".into()],
			None,
			&[("auth_type".into(), "rerequest".into())],
		);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.path(), "/v21.0/dialog/oauth");
		assert_eq!(pairs["response_type"], "code");
		assert_eq!(pairs["client_id"], "app-1");
		assert_eq!(pairs["redirect_uri"], "https://app.example.com/cb");
		assert_eq!(pairs["scope"], "email ads_management");
		assert_eq!(pairs["state"], "state-123");
		assert_eq!(pairs["auth_type"], "rerequest");
	}

	#[test]
	fn authorize_url_honors_redirect_override() {
		let redirect = Url::parse("https://other.example.com/done").expect("Fixture should parse.");
		let url = facade(&config()).authorize_url("s", &[], Some(&redirect), &[]);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs["redirect_uri"], "https://other.example.com/done");
		assert!(!pairs.contains_key("scope"));
	}

	#[test]
	fn token_responses_map_expiry_and_refresh() {
		let mut response = StandardTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		response.set_expires_in(Some(&std::time::Duration::from_secs(3_600)));
		response.set_refresh_token(Some(RefreshToken::new("refresh".into())));

		let token = map_token_response(response).expect("Token response should map.");

		assert_eq!(token.access_token.expose(), "access");
		assert_eq!(token.token_type, "bearer");
		assert_eq!(token.refresh_token.as_ref().map(|t| t.expose()), Some("refresh"));
		assert_eq!(
			token.expires_at.map(|at| at - token.issued_at),
			Some(Duration::seconds(3_600))
		);

		let mut zero = StandardTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		zero.set_expires_in(Some(&std::time::Duration::from_secs(0)));

		assert!(matches!(
			map_token_response(zero),
			Err(Error::Config(ConfigError::NonPositiveExpiresIn))
		));
	}

	#[test]
	fn parse_failures_surface_graph_envelopes() {
		let body = br#"{"error":{"message":"Invalid verification code format.","type":"OAuthException","code":100}}"#.to_vec();
		let source = serde_path_to_error::deserialize::<_, BasicTokenResponse>(
			&mut serde_json::Deserializer::from_slice(&body),
		)
		.expect_err("Envelope is not a token response.");
		let meta = ResponseMetadata { status: Some(400), retry_after: None };
		let err = map_request_error::<ReqwestError, _>(
			Some(meta),
			RequestTokenError::Parse(source, body),
			&ReqwestTransportErrorMapper,
		);

		match err {
			Error::Api(api) => {
				assert_eq!(api.code, 100);
				assert_eq!(api.status, Some(400));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn classification_prefers_structured_fields() {
		assert_eq!(
			classify_token_error(Some("invalid_grant"), None, Some(500)),
			TokenErrorKind::InvalidGrant
		);
		assert_eq!(
			classify_token_error(Some("unknown"), Some("invalid_client: bad secret"), None),
			TokenErrorKind::InvalidClient
		);
		assert_eq!(classify_token_error(None, None, Some(403)), TokenErrorKind::InsufficientScope);
		assert_eq!(classify_token_error(None, None, Some(503)), TokenErrorKind::Transient);
		assert_eq!(
			classify_token_error(Some("server_error"), None, Some(400)),
			TokenErrorKind::Transient
		);
	}
}
