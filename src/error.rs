//! Client-level error types shared across the OAuth delegate, the Graph session, and the
//! endpoint surfaces.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Unexpected upstream response that carried no provider error payload.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider-reported Graph API error.
	#[error(transparent)]
	Api(#[from] GraphApiError),
	/// Response body could not be decoded into the requested shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Signed request could not be verified or decoded.
	#[error(transparent)]
	SignedRequest(#[from] SignedRequestError),

	/// Provider rejected the grant (e.g., bad code or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Token lacks the scopes the provider expected.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Provider answered the revocation call without confirming success.
	#[error("Failed to revoke token.")]
	RevocationFailed,
	/// Audience is still processing a previous operation and cannot be replaced.
	#[error("Audience {audience_id} is not ready for replacement (operation status {code}).")]
	AudienceNotReady {
		/// Audience identifier that was checked.
		audience_id: String,
		/// Operation status code reported by the provider.
		code: i64,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured endpoint is not a valid URL.
	#[error("The {endpoint} endpoint is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Graph API version does not look like `v<major>.<minor>`.
	#[error("Graph API version `{version}` is invalid.")]
	InvalidVersion {
		/// Offending version string.
		version: String,
	},
	/// Required setting was not supplied.
	#[error("Required setting `{name}` is missing.")]
	MissingSetting {
		/// Setting or environment variable name.
		name: String,
	},
	/// Setting value could not be interpreted.
	#[error("Setting `{name}` has an invalid value: {reason}.")]
	InvalidSetting {
		/// Setting or environment variable name.
		name: String,
		/// Human-readable explanation.
		reason: String,
	},
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Graph path contains a `.` or `..` segment.
	#[error("Graph path `{path}` contains a dot segment.")]
	InvalidPath {
		/// Offending path.
		path: String,
	},
	/// Request parameters could not be encoded.
	#[error("Request parameters could not be encoded.")]
	ParamsEncode(#[source] serde_json::Error),
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Operation needs the app secret but none was configured.
	#[error("An app secret is required for this operation.")]
	MissingAppSecret,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Unexpected upstream responses that carried no structured provider error.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Graph endpoint answered with a non-success status and no error envelope.
	#[error("Graph endpoint returned HTTP {status}.")]
	GraphEndpoint {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label (`graph` or `token`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Graph API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Failures while turning a response body into the requested shape.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not valid JSON or does not match the target type.
	#[error("Graph response could not be decoded at `{}`.", .source.path())]
	Json {
		/// Structured parsing failure with the failing JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when the failure came from a response body.
		status: Option<u16>,
	},
	/// Requested field is absent from the decoded object.
	#[error("Graph response has no `{field}` field.")]
	MissingField {
		/// Field name that was requested.
		field: String,
	},
	/// Response was valid JSON but not the expected kind of value.
	#[error("Graph response was expected to be {expected}.")]
	UnexpectedShape {
		/// Description of the expected JSON kind.
		expected: &'static str,
	},
}
impl DecodeError {
	pub(crate) fn json(
		source: serde_path_to_error::Error<serde_json::Error>,
		status: Option<u16>,
	) -> Self {
		Self::Json { source, status }
	}
}

/// Provider-reported error envelope (`{"error": {...}}`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Graph API error {code}: {message}.")]
pub struct GraphApiError {
	/// Human-readable provider message.
	#[serde(default)]
	pub message: String,
	/// Provider error type, e.g. `OAuthException`.
	#[serde(default, rename = "type")]
	pub kind: String,
	/// Provider error code.
	#[serde(default)]
	pub code: i64,
	/// Provider error subcode.
	#[serde(default)]
	pub error_subcode: Option<i64>,
	/// Title suitable for end users.
	#[serde(default)]
	pub error_user_title: Option<String>,
	/// Message suitable for end users.
	#[serde(default)]
	pub error_user_msg: Option<String>,
	/// Provider trace identifier for support requests.
	#[serde(default)]
	pub fbtrace_id: Option<String>,
	/// HTTP status of the response that carried the error.
	#[serde(skip)]
	pub status: Option<u16>,
}
impl GraphApiError {
	/// Extracts the error envelope from a decoded response body, if present.
	pub fn from_body(body: &Value, status: Option<u16>) -> Option<Self> {
		let envelope = body.as_object()?.get("error")?;
		let mut err = match envelope {
			Value::Object(_) => Self::deserialize(envelope).ok()?,
			Value::String(message) => Self { message: message.clone(), ..Default::default() },
			_ => return None,
		};

		err.status = status;

		Some(err)
	}
}

/// Failures raised while verifying signed requests.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignedRequestError {
	/// Input is not `<signature>.<payload>`.
	#[error("Signed request is malformed.")]
	Malformed,
	/// A segment is not valid base64url.
	#[error("Signed request segment is not valid base64url.")]
	Encoding,
	/// Payload is not a JSON object.
	#[error("Signed request payload is not a JSON object.")]
	Payload,
	/// Payload declares an algorithm other than `HMAC-SHA256`.
	#[error("Signed request uses unsupported algorithm `{algorithm}`.")]
	UnsupportedAlgorithm {
		/// Declared algorithm.
		algorithm: String,
	},
	/// Signature does not match the payload.
	#[error("Signed request signature does not match.")]
	SignatureMismatch,
}
