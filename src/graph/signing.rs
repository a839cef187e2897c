//! App-secret keyed signatures: `appsecret_proof` and signed-request verification.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, error::SignedRequestError, graph::GraphResult};

type HmacSha256 = Hmac<Sha256>;

const SIGNED_REQUEST_ALGORITHM: &str = "HMAC-SHA256";

/// Computes `hex(HMAC-SHA256(key = app_secret, message = access_token))`.
pub fn appsecret_proof(app_secret: &str, access_token: &str) -> String {
	hex::encode(sign(app_secret, access_token.as_bytes()))
}

/// Verifies and decodes a `<signature>.<payload>` signed request issued by the provider.
///
/// Both segments are base64url (padding tolerated). The payload must declare
/// `"algorithm": "HMAC-SHA256"` and its signature must match the raw payload segment keyed by
/// the app secret.
pub fn parse_signed_request(
	app_secret: &str,
	signed_request: &str,
) -> Result<GraphResult, SignedRequestError> {
	let (signature, payload) =
		signed_request.trim().split_once('.').ok_or(SignedRequestError::Malformed)?;

	if signature.is_empty() || payload.is_empty() {
		return Err(SignedRequestError::Malformed);
	}

	let signature = decode_segment(signature)?;
	let body = decode_segment(payload)?;
	let data: Value = serde_json::from_slice(&body).map_err(|_| SignedRequestError::Payload)?;
	let data = GraphResult::try_from(data).map_err(|_| SignedRequestError::Payload)?;
	let algorithm = data.get("algorithm").and_then(Value::as_str).unwrap_or_default();

	if !algorithm.eq_ignore_ascii_case(SIGNED_REQUEST_ALGORITHM) {
		return Err(SignedRequestError::UnsupportedAlgorithm { algorithm: algorithm.to_owned() });
	}

	let mut mac = new_mac(app_secret);

	mac.update(payload.as_bytes());
	mac.verify_slice(&signature).map_err(|_| SignedRequestError::SignatureMismatch)?;

	Ok(data)
}

fn sign(key: &str, message: &[u8]) -> Vec<u8> {
	let mut mac = new_mac(key);

	mac.update(message);

	mac.finalize().into_bytes().to_vec()
}

fn new_mac(key: &str) -> HmacSha256 {
	// HMAC accepts keys of any length, so construction cannot fail.
	<HmacSha256 as Mac>::new_from_slice(key.as_bytes())
		.unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any length"))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, SignedRequestError> {
	URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).map_err(|_| SignedRequestError::Encoding)
}

#[cfg(test)]
pub(crate) fn sign_request(app_secret: &str, payload: &Value) -> String {
	let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
	let signature = URL_SAFE_NO_PAD.encode(sign(app_secret, encoded.as_bytes()));

	format!("{signature}.{encoded}")
}
