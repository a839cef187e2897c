//! Batch call results.

// self
use crate::{_prelude::*, graph::GraphResult};

/// One header echoed back for a batched request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchHeader {
	/// Header name.
	pub name: String,
	/// Header value.
	pub value: String,
}

/// Result of a single request inside a batch call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
	/// HTTP status of the batched request.
	pub code: u16,
	/// Response headers; omitted when the batch was sent with `include_headers=false`.
	#[serde(default)]
	pub headers: Vec<BatchHeader>,
	/// Raw JSON body as text.
	#[serde(default)]
	pub body: Option<String>,
}
impl BatchResponse {
	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|h| h.name.eq_ignore_ascii_case(name)).map(|h| h.value.as_str())
	}

	/// Decodes the body like a standalone Graph call would.
	///
	/// Missing bodies decode as an empty object.
	pub fn result(&self) -> Result<GraphResult> {
		let Some(body) = self.body.as_deref() else {
			return Ok(GraphResult::default());
		};
		let value = crate::graph::session::decode_response(self.code, None, body.as_bytes())?;

		Ok(GraphResult::try_from(value)?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn batch_entries_decode_bodies_and_errors() {
		let entries: Vec<Option<BatchResponse>> = serde_json::from_value(serde_json::json!([
			{
				"code": 200,
				"headers": [{ "name": "Content-Type", "value": "text/javascript; charset=UTF-8" }],
				"body": "{\"id\":\"1001\",\"name\":\"Buyers\"}"
			},
			{
				"code": 400,
				"body": "{\"error\":{\"message\":\"Unsupported get request.\",\"type\":\"GraphMethodException\",\"code\":100}}"
			},
			null
		]))
		.expect("Batch fixture should deserialize.");

		assert_eq!(entries.len(), 3);
		assert!(entries[2].is_none());

		let ok = entries[0].as_ref().expect("First entry should be present.");

		assert_eq!(ok.header("content-type"), Some("text/javascript; charset=UTF-8"));
		assert_eq!(
			ok.result().expect("First body should decode.").get("name"),
			Some(&Value::from("Buyers"))
		);

		let failed = entries[1].as_ref().expect("Second entry should be present.");

		match failed.result().expect_err("Error body must surface as an error.") {
			Error::Api(api) => {
				assert_eq!(api.code, 100);
				assert_eq!(api.status, Some(400));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
