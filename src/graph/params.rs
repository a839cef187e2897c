//! Parameter maps attached to Graph calls.

// std
use std::collections::btree_map::{IntoIter, Iter};
// self
use crate::{_prelude::*, error::ConfigError};

/// Ordered parameter map for a single Graph call.
///
/// String values are sent verbatim; every other JSON value is sent as its compact JSON text,
/// which is how the Graph API expects nested objects (`payload`, `data`, `batch`) to arrive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);
impl Params {
	/// Creates an empty parameter map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds `{"fields": "<a>,<b>,..."}`.
	pub fn fields<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let joined =
			fields.into_iter().map(|f| f.as_ref().to_owned()).collect::<Vec<_>>().join(",");

		Self::new().with("fields", joined)
	}

	/// Converts a serializable struct into a parameter map, one entry per top-level field.
	pub fn from_serialize(value: &impl Serialize) -> Result<Self, ConfigError> {
		serde_json::to_value(value)
			.and_then(serde_json::from_value)
			.map_err(ConfigError::ParamsEncode)
	}

	/// Inserts a value, returning the map for chaining.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);

		self
	}

	/// Inserts a value, replacing any previous entry for `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	/// Inserts a value only when `key` is absent.
	pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.0.entry(key.into()).or_insert_with(|| value.into());
	}

	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns `true` when `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Removes `key`, returning its value.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.0.remove(key)
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over raw entries.
	pub fn iter(&self) -> Iter<'_, String, Value> {
		self.0.iter()
	}

	/// Copies every entry of `other` into this map, overriding duplicates.
	pub fn merge(&mut self, other: Params) {
		self.0.extend(other.0);
	}

	/// Encodes the parameters into wire `(key, value)` pairs.
	pub fn encode(&self) -> Vec<(String, String)> {
		self.0.iter().map(|(key, value)| (key.clone(), encode_value(value))).collect()
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from(entries: [(K, V); N]) -> Self {
		entries.into_iter().collect()
	}
}
impl IntoIterator for Params {
	type IntoIter = IntoIter<String, Value>;
	type Item = (String, Value);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

fn encode_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
