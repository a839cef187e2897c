//! Lookups for the owner of the access token.

// self
use crate::{
	_prelude::*,
	client::Client,
	graph::{GraphResult, Params},
	http::GraphHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, Surface},
};

/// Minimal profile of the token owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// App-scoped user id.
	pub id: String,
	/// Primary email; absent unless the `email` permission was granted.
	#[serde(default)]
	pub email: Option<String>,
}

impl<C, M> Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// `GET /me/adaccounts`.
	pub async fn ad_accounts(&self, params: Params) -> Result<GraphResult> {
		obs::observe(Surface::Me, "ad_accounts", self.session.get("/me/adaccounts", params)).await
	}

	/// `GET /me`.
	pub async fn me(&self, params: Params) -> Result<GraphResult> {
		obs::observe(Surface::Me, "me", self.session.get("/me", params)).await
	}

	/// `GET /me?fields=id,email` decoded into [`User`].
	pub async fn user(&self) -> Result<User> {
		obs::observe(Surface::Me, "user", async {
			let result = self.session.get("/me", Params::fields(["id", "email"])).await?;

			Ok(result.decode()?)
		})
		.await
	}
}
