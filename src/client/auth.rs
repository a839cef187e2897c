//! OAuth login, token exchange, and revocation.
//!
//! The authorization dialog URL and the code/refresh grants go through the `oauth2` crate with
//! `client_secret_post` client authentication. The long-lived token exchange and revocation are
//! plain Graph calls because the provider exposes them as non-standard endpoints.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	client::Client,
	config::OAuth2Config,
	graph::{GraphResult, Params},
	http::GraphHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, CallSpan, Surface},
};

const STATE_LEN: usize = 32;
const FB_EXCHANGE_TOKEN: &str = "fb_exchange_token";

/// Adjustments applied by [`Client::auth`] to the derived client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOption {
	/// Replaces the configured OAuth scopes.
	Scopes(Vec<String>),
}
impl AuthOption {
	/// Builds [`AuthOption::Scopes`] from any string iterator.
	pub fn scopes<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Scopes(scopes.into_iter().map(Into::into).collect())
	}

	fn apply(self, oauth2: &mut OAuth2Config) {
		match self {
			AuthOption::Scopes(scopes) => oauth2.scopes = scopes,
		}
	}
}

/// Extra knobs for the authorization dialog URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthCodeOption {
	/// Requests these scopes instead of the configured ones.
	Scopes(Vec<String>),
	/// Sends the user back to this URI instead of the configured one.
	RedirectUrl(Url),
	/// Sets `auth_type` (e.g. `rerequest` to ask again for declined permissions).
	AuthType(String),
	/// Appends an arbitrary query parameter.
	Param(String, String),
}

/// Login handshake metadata returned by [`Client::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI the dialog will send the user back to, if any.
	pub redirect_uri: Option<Url>,
	/// Fully-formed dialog URL that callers should send end-users to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "authorization state mismatch".into() })
		}
	}
}

#[derive(Deserialize)]
struct GraphTokenResponse {
	access_token: String,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}
impl GraphTokenResponse {
	fn into_token(self) -> Result<Token> {
		let mut token = Token::new(self.access_token);

		if let Some(token_type) = self.token_type {
			token = token.with_token_type(token_type);
		}
		if let Some(expires_in) = self.expires_in {
			if expires_in <= 0 {
				return Err(crate::error::ConfigError::NonPositiveExpiresIn.into());
			}

			token = token.with_expires_in(Duration::seconds(expires_in));
		}

		Ok(token)
	}
}

impl<C, M> Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Application (client) identifier.
	pub fn client_id(&self) -> &str {
		&self.config.oauth2.client_id
	}

	/// Application secret.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.config.oauth2.client_secret
	}

	/// OAuth settings in effect for this client, including any [`AuthOption`] overrides.
	pub fn oauth2_config(&self) -> &OAuth2Config {
		&self.config.oauth2
	}

	/// Builds the login dialog URL for `state`.
	pub fn auth_code_url(&self, state: &str, options: &[AuthCodeOption]) -> Url {
		CallSpan::new(Surface::Auth, "auth_code_url")
			.in_scope(|| self.build_auth_code_url(state, options).1)
	}

	/// Starts a login with a freshly generated `state`.
	pub fn start_authorization(&self, options: &[AuthCodeOption]) -> AuthorizationSession {
		CallSpan::new(Surface::Auth, "start_authorization").in_scope(|| {
			let state = random_string(STATE_LEN);
			let (redirect_uri, authorize_url) = self.build_auth_code_url(&state, options);

			AuthorizationSession { state, redirect_uri, authorize_url }
		})
	}

	/// Exchanges an authorization code for a token using the configured redirect URI.
	pub async fn exchange_oauth2_code(&self, code: &str) -> Result<Token> {
		obs::observe(Surface::Auth, "exchange_oauth2_code", self.oauth.exchange_code(code, None))
			.await
	}

	/// Validates the returned `state` and exchanges `code` with the session's redirect URI.
	pub async fn complete_authorization(
		&self,
		session: &AuthorizationSession,
		returned_state: &str,
		code: &str,
	) -> Result<Token> {
		obs::observe(Surface::Auth, "complete_authorization", async {
			session.validate_state(returned_state)?;

			self.oauth.exchange_code(code, session.redirect_uri.as_ref()).await
		})
		.await
	}

	/// Redeems `refresh_token` for a fresh access token.
	pub async fn access_token(&self, refresh_token: &str) -> Result<Token> {
		obs::observe(Surface::Auth, "access_token", self.oauth.refresh(refresh_token)).await
	}

	/// Trades a short-lived user token for a long-lived one (`grant_type=fb_exchange_token`).
	pub async fn exchange_long_lived_token(&self, access_token: &str) -> Result<Token> {
		obs::observe(Surface::Auth, "exchange_long_lived_token", async {
			let params = Params::new()
				.with("grant_type", FB_EXCHANGE_TOKEN)
				.with("client_id", self.client_id())
				.with("client_secret", self.client_secret().expose())
				.with("fb_exchange_token", access_token);
			let result = self.app_session().get("/oauth/access_token", params).await?;

			result.decode::<GraphTokenResponse>()?.into_token()
		})
		.await
	}

	/// Revokes `refresh_token`; fails with [`Error::RevocationFailed`] unless the provider
	/// confirms `{"success": true}`.
	pub async fn revoke(&self, refresh_token: &str) -> Result<()> {
		obs::observe(Surface::Auth, "revoke", async {
			let params = Params::new()
				.with("client_id", self.client_id())
				.with("client_secret", self.client_secret().expose())
				.with("revoke_token", refresh_token);
			let result = self.session.get("/oauth/revoke", params).await?;

			if result.get("success").and_then(Value::as_bool).unwrap_or(false) {
				Ok(())
			} else {
				Err(Error::RevocationFailed)
			}
		})
		.await
	}

	/// Returns a client whose session signs every call with `token`.
	///
	/// When `token` carries a refresh token, the session redeems it once the access token
	/// expires. Clones of the returned client share the rotated token.
	pub fn auth<I>(&self, token: &Token, options: I) -> Self
	where
		I: IntoIterator<Item = AuthOption>,
	{
		let mut config = (*self.config).clone();

		for option in options {
			option.apply(&mut config.oauth2);
		}

		let config = Arc::new(config);
		let session = crate::graph::Session::new(
			config.clone(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
		.with_token(token.clone(), self.oauth.clone());

		Self {
			config,
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			oauth: self.oauth.clone(),
			session,
		}
	}

	/// Token the session currently signs with, reflecting any automatic refresh.
	pub fn token(&self) -> Option<Token> {
		self.session.token()
	}

	/// Verifies a signed request (`<signature>.<payload>`) with the app secret.
	pub fn parse_signed_request(&self, signed_request: &str) -> Result<GraphResult> {
		self.session.parse_signed_request(signed_request)
	}

	fn build_auth_code_url(&self, state: &str, options: &[AuthCodeOption]) -> (Option<Url>, Url) {
		let mut scopes = self.config.oauth2.scopes.as_slice();
		let mut redirect_uri = self.config.oauth2.redirect_url.as_ref();
		let mut extra_params = Vec::new();

		for option in options {
			match option {
				AuthCodeOption::Scopes(requested) => scopes = requested.as_slice(),
				AuthCodeOption::RedirectUrl(url) => redirect_uri = Some(url),
				AuthCodeOption::AuthType(auth_type) =>
					extra_params.push(("auth_type".to_owned(), auth_type.clone())),
				AuthCodeOption::Param(key, value) => extra_params.push((key.clone(), value.clone())),
			}
		}

		let url = self.oauth.authorize_url(state, scopes, redirect_uri, &extra_params);

		(redirect_uri.cloned(), url)
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
