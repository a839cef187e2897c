//! Launches a Facebook login, then redeems the returned code for a long-lived user token.
//!
//! Reads `FACEBOOK_*` settings from the environment. Run once to print the dialog URL, then
//! again with `FACEBOOK_DEMO_CODE` copied from the redirect.

// std
use std::env;
// crates.io
use color_eyre::Result;
// self
use facebook_graph::{
	client::{AuthCodeOption, ReqwestGraphClient},
	config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client = ReqwestGraphClient::new(Config::from_env()?)?;
	let Ok(code) = env::var("FACEBOOK_DEMO_CODE") else {
		let session = client.start_authorization(&[AuthCodeOption::AuthType("rerequest".into())]);

		println!("Send your user to {}.", session.authorize_url);
		println!("Expect state {} on the redirect, then rerun with its code.", session.state);

		return Ok(());
	};
	let short_lived = client.exchange_oauth2_code(&code).await?;
	let long_lived = client.exchange_long_lived_token(short_lived.access_token.expose()).await?;
	let user = client.auth(&long_lived, None).user().await?;

	println!("Signed in as {} ({}).", user.id, user.email.as_deref().unwrap_or("no email"));

	if let Some(expires_at) = long_lived.expires_at {
		println!("Long-lived token expires at {expires_at}.");
	}

	Ok(())
}
