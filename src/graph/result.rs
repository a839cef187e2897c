//! Decoded Graph responses.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::DecodeError};

/// JSON object returned by a Graph call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphResult(JsonMap<String, Value>);
impl GraphResult {
	/// Wraps a decoded JSON object.
	pub fn new(object: JsonMap<String, Value>) -> Self {
		Self(object)
	}

	/// Returns the top-level field `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Walks a dotted path (`"operation_status.code"`, `"data.0.id"`); numeric segments index
	/// into arrays.
	pub fn get_path(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let mut current = self.0.get(segments.next()?)?;

		for segment in segments {
			current = match current {
				Value::Object(map) => map.get(segment)?,
				Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
				_ => return None,
			};
		}

		Some(current)
	}

	/// Returns `true` when the response carries `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Decodes the whole object into `T`, reporting the failing JSON path on mismatch.
	pub fn decode<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		decode_value(&Value::Object(self.0.clone()))
	}

	/// Decodes the field `key` into `T`.
	pub fn decode_field<T>(&self, key: &str) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let value =
			self.0.get(key).ok_or_else(|| DecodeError::MissingField { field: key.into() })?;

		decode_value(value)
	}

	/// Borrows the underlying JSON object.
	pub fn as_object(&self) -> &JsonMap<String, Value> {
		&self.0
	}

	/// Returns the underlying JSON object.
	pub fn into_inner(self) -> JsonMap<String, Value> {
		self.0
	}
}
impl From<JsonMap<String, Value>> for GraphResult {
	fn from(value: JsonMap<String, Value>) -> Self {
		Self(value)
	}
}
impl TryFrom<Value> for GraphResult {
	type Error = DecodeError;

	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Object(map) => Ok(Self(map)),
			_ => Err(DecodeError::UnexpectedShape { expected: "a JSON object" }),
		}
	}
}

pub(crate) fn decode_value<T>(value: &Value) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|source| DecodeError::json(source, None))
}
