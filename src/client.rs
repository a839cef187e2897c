//! Graph API client facade, split by endpoint surface.

pub mod audiences;
pub mod auth;
pub mod conversions;
pub mod me;

pub use audiences::*;
pub use auth::*;
pub use conversions::*;
pub use me::*;

// self
use crate::{
	_prelude::*,
	config::Config,
	graph::Session,
	http::GraphHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestGraphClient = Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Typed entry point for the Graph API.
///
/// The client owns the configuration, the OAuth delegate, and a [`Session`] that signs every
/// Graph call. A client built from configuration alone is app-level: it can drive the login
/// dialog and token endpoint. [`Client::auth`] derives a user-level client whose session
/// carries an access token. Clones share the transport.
pub struct Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<Config>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	oauth: BasicFacade<C, M>,
	session: Session<C, M>,
}
impl<C, M> Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: Config,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		config.validate()?;

		let config = Arc::new(config);
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let oauth = BasicFacade::from_config(&config, http_client.clone(), transport_mapper.clone())?;
		let session = Session::new(config.clone(), http_client.clone(), transport_mapper.clone());

		Ok(Self { config, http_client, transport_mapper, oauth, session })
	}

	/// Configuration the client was built from.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Session used for every Graph call; exposed for endpoints without a typed method.
	pub fn session(&self) -> &Session<C, M> {
		&self.session
	}

	fn app_session(&self) -> Session<C, M> {
		Session::new(self.config.clone(), self.http_client.clone(), self.transport_mapper.clone())
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: Config) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Clone for Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			oauth: self.oauth.clone(),
			session: self.session.clone(),
		}
	}
}
impl<C, M> Debug for Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("client_id", &self.config.oauth2.client_id)
			.field("version", &self.config.version)
			.field("session", &self.session)
			.finish()
	}
}
