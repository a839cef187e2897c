//! OAuth token values returned by the login flows.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token type reported when the provider omits one.
pub const BEARER: &str = "bearer";

/// Current lifecycle status for a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid (or carries no expiry).
	Active,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Access token plus the optional refresh secret and expiry metadata.
///
/// Tokens are plain values; the crate never persists them. Long-lived page tokens may carry no
/// expiry at all, in which case [`Token::expires_at`] is `None` and the token never reports
/// itself as expired.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (normally `bearer`).
	pub token_type: String,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when supplied.
	pub expires_at: Option<OffsetDateTime>,
}
impl Token {
	/// Creates a bearer token issued now without expiry or refresh secret.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self {
			access_token: access_token.into(),
			token_type: BEARER.into(),
			refresh_token: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	/// Attaches a refresh secret.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Overrides the issued-at instant, shifting any relative expiry along with it.
	pub fn with_issued_at(mut self, issued_at: OffsetDateTime) -> Self {
		if let Some(expires_at) = self.expires_at {
			self.expires_at = Some(issued_at + (expires_at - self.issued_at));
		}

		self.issued_at = issued_at;

		self
	}

	/// Sets the expiry relative to the issued-at instant.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = Some(self.issued_at + expires_in);

		self
	}

	/// Sets the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self.expires_at {
			Some(expires_at) if instant >= expires_at => TokenStatus::Expired,
			_ => TokenStatus::Active,
		}
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &self.access_token)
			.field("token_type", &self.token_type)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
