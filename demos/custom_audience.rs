//! Creates a customer-file audience and uploads hashed emails to it.
//!
//! Expects `FACEBOOK_*` settings plus `FACEBOOK_DEMO_ACCESS_TOKEN` and
//! `FACEBOOK_DEMO_AD_ACCOUNT`.

// std
use std::{collections::HashMap, env};
// crates.io
use color_eyre::{Result, eyre::eyre};
use sha2::{Digest, Sha256};
// self
use facebook_graph::{
	auth::{AdAccountId, AudienceId, Token},
	client::{AudiencePayload, ReqwestGraphClient, SUBTYPE_CUSTOM, USER_PROVIDED_ONLY},
	config::Config,
	graph::Params,
};

fn hashed(email: &str) -> String {
	hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let token = Token::new(env::var("FACEBOOK_DEMO_ACCESS_TOKEN")?);
	let account = AdAccountId::new(env::var("FACEBOOK_DEMO_AD_ACCOUNT")?)?;
	let client = ReqwestGraphClient::new(Config::from_env()?)?.auth(&token, None);
	let created = client
		.create_audience(
			&account,
			Params::new()
				.with("name", "Demo buyers")
				.with("subtype", SUBTYPE_CUSTOM)
				.with("customer_file_source", USER_PROVIDED_ONLY),
		)
		.await?;
	let audience_id = created
		.get("id")
		.and_then(|id| id.as_str())
		.ok_or_else(|| eyre!("Audience creation returned no id."))?;
	let audience_id = AudienceId::new(audience_id)?;
	let records = ["jane@example.com", "john@example.com"]
		.into_iter()
		.map(|email| HashMap::from([("email".to_owned(), hashed(email))]));
	let payload = AudiencePayload::from_records(["EMAIL"], records);
	let reply = client.add_users(&audience_id, &payload, Params::new()).await?;

	println!(
		"Audience {audience_id} received {} rows ({} invalid).",
		reply.num_received, reply.num_invalid_entries
	);

	Ok(())
}
