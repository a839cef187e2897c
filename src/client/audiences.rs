//! Custom audience management.

// crates.io
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	auth::{AdAccountId, AudienceId},
	client::Client,
	error::ConfigError,
	graph::{GraphResult, Params},
	http::GraphHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, Surface},
};

/// Audience subtype for customer-file audiences.
pub const SUBTYPE_CUSTOM: &str = "CUSTOM";
/// Customer file collected directly from users.
pub const USER_PROVIDED_ONLY: &str = "USER_PROVIDED_ONLY";
/// Customer file collected from partners.
pub const PARTNER_PROVIDED_ONLY: &str = "PARTNER_PROVIDED_ONLY";
/// Customer file collected from both users and partners.
pub const BOTH_USERS_AND_PARTNERS_PROVIDED: &str = "BOTH_USERS_AND_PARTNERS_PROVIDED";

const READY_STATUS: i64 = 200;

/// Keyed record that can be projected onto an audience schema.
pub trait AudienceRecord {
	/// Returns the value stored under `key` (already lowercased), if any.
	fn lookup(&self, key: &str) -> Option<Value>;
}
impl AudienceRecord for JsonMap<String, Value> {
	fn lookup(&self, key: &str) -> Option<Value> {
		self.get(key).cloned()
	}
}
impl<V> AudienceRecord for HashMap<String, V>
where
	V: Clone + Into<Value>,
{
	fn lookup(&self, key: &str) -> Option<Value> {
		self.get(key).cloned().map(Into::into)
	}
}
impl<V> AudienceRecord for BTreeMap<String, V>
where
	V: Clone + Into<Value>,
{
	fn lookup(&self, key: &str) -> Option<Value> {
		self.get(key).cloned().map(Into::into)
	}
}
impl<T> AudienceRecord for &T
where
	T: ?Sized + AudienceRecord,
{
	fn lookup(&self, key: &str) -> Option<Value> {
		(**self).lookup(key)
	}
}

/// `payload` for audience user uploads: a schema plus one row per user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudiencePayload {
	/// Column names, e.g. `EMAIL`, `PHONE`.
	pub schema: Vec<String>,
	/// Rows aligned with `schema`.
	pub data: Vec<Vec<Value>>,
}
impl AudiencePayload {
	/// Creates an empty payload for `schema`.
	pub fn new<I, S>(schema: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { schema: schema.into_iter().map(Into::into).collect(), data: Vec::new() }
	}

	/// Builds a payload by projecting each record onto `schema`.
	pub fn from_records<I, S, R, J>(schema: I, records: J) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		J: IntoIterator<Item = R>,
		R: AudienceRecord,
	{
		let mut payload = Self::new(schema);

		for record in records {
			payload.push_record(&record);
		}

		payload
	}

	/// Appends one row, looking each schema key up in lowercase; missing keys become `null`.
	pub fn push_record(&mut self, record: &impl AudienceRecord) {
		let row = self
			.schema
			.iter()
			.map(|key| record.lookup(&key.to_lowercase()).unwrap_or(Value::Null))
			.collect();

		self.data.push(row);
	}

	/// Number of rows.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns `true` when the payload carries no rows.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// JSON form of the `payload` parameter.
	pub fn to_value(&self) -> Value {
		serde_json::json!({ "schema": self.schema, "data": self.data })
	}

	/// Compact JSON text sent as the `payload` parameter; `schema` always precedes `data`.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self).map_err(ConfigError::ParamsEncode)?)
	}
}

/// Multi-batch upload session attached to user uploads as the `session` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
	/// Caller-chosen session identifier shared by all batches.
	pub session_id: String,
	/// 1-based batch sequence number.
	pub batch_seq: u32,
	/// Marks the final batch.
	pub last_batch_flag: bool,
	/// Estimated total number of users across the session.
	pub estimated_num_total: u64,
}
impl UserSession {
	/// JSON form sent as the `session` parameter.
	pub fn to_value(&self) -> Value {
		serde_json::json!({
			"session_id": self.session_id,
			"batch_seq": self.batch_seq,
			"last_batch_flag": self.last_batch_flag,
			"estimated_num_total": self.estimated_num_total,
		})
	}

	/// Compact JSON text sent as the `session` parameter, fields in declaration order.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self).map_err(ConfigError::ParamsEncode)?)
	}
}

/// Reply to an audience user upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUsersResponse {
	/// Audience that received the upload.
	#[serde(default)]
	pub audience_id: String,
	/// Upload session identifier.
	#[serde(default, deserialize_with = "string_or_number")]
	pub session_id: String,
	/// Rows received.
	#[serde(default)]
	pub num_received: u64,
	/// Rows rejected as invalid.
	#[serde(default)]
	pub num_invalid_entries: u64,
	/// Sample of rejected rows keyed by provider-chosen labels.
	#[serde(default)]
	pub invalid_entry_samples: BTreeMap<String, String>,
}

/// `operation_status` of an audience: a bare code or `{ code, description }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationStatus {
	/// Bare status code.
	Code(i64),
	/// Status code with a human-readable description.
	Detailed {
		/// Status code.
		code: i64,
		/// Provider description.
		#[serde(default)]
		description: Option<String>,
	},
}
impl OperationStatus {
	/// Status code.
	pub fn code(&self) -> i64 {
		match self {
			OperationStatus::Code(code) | OperationStatus::Detailed { code, .. } => *code,
		}
	}

	/// Provider description, when present.
	pub fn description(&self) -> Option<&str> {
		match self {
			OperationStatus::Code(_) => None,
			OperationStatus::Detailed { description, .. } => description.as_deref(),
		}
	}

	/// Returns `true` when the audience accepts a replacement.
	pub fn is_ready(&self) -> bool {
		self.code() == READY_STATUS
	}
}

impl<C, M> Client<C, M>
where
	C: ?Sized + GraphHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// `GET /{audience_id}`.
	pub async fn audience(&self, audience_id: &AudienceId, params: Params) -> Result<GraphResult> {
		obs::observe(
			Surface::Audiences,
			"audience",
			self.session.get(&format!("/{audience_id}"), params),
		)
		.await
	}

	/// `GET /act_{ad_account_id}/customaudiences`.
	pub async fn custom_audiences(
		&self,
		ad_account_id: &AdAccountId,
		params: Params,
	) -> Result<GraphResult> {
		obs::observe(
			Surface::Audiences,
			"custom_audiences",
			self.session.get(&format!("/{}/customaudiences", ad_account_id.node()), params),
		)
		.await
	}

	/// `POST /act_{ad_account_id}/customaudiences`.
	///
	/// Typical params: `name`, `subtype` ([`SUBTYPE_CUSTOM`]), `description`, and
	/// `customer_file_source` (e.g. [`USER_PROVIDED_ONLY`]).
	pub async fn create_audience(
		&self,
		ad_account_id: &AdAccountId,
		params: Params,
	) -> Result<GraphResult> {
		obs::observe(
			Surface::Audiences,
			"create_audience",
			self.session.post(&format!("/{}/customaudiences", ad_account_id.node()), params),
		)
		.await
	}

	/// `POST /{audience_id}/users` with `payload`.
	pub async fn add_users(
		&self,
		audience_id: &AudienceId,
		payload: &AudiencePayload,
		params: Params,
	) -> Result<AddUsersResponse> {
		obs::observe(Surface::Audiences, "add_users", async {
			let params = params.with("payload", payload.to_json()?);
			let result = self.session.post(&format!("/{audience_id}/users"), params).await?;

			Ok(result.decode()?)
		})
		.await
	}

	/// Replaces every user of the audience with `payload`.
	///
	/// Reads `operation_status` first and fails with [`Error::AudienceNotReady`] unless the
	/// audience reports code 200, then posts to `/{audience_id}/usersreplace`.
	pub async fn replace_users(
		&self,
		audience_id: &AudienceId,
		payload: &AudiencePayload,
		params: Params,
	) -> Result<AddUsersResponse> {
		obs::observe(Surface::Audiences, "replace_users", async {
			let status = self
				.session
				.get(&format!("/{audience_id}"), Params::fields(["operation_status"]))
				.await?
				.decode_field::<OperationStatus>("operation_status")?;

			if !status.is_ready() {
				return Err(Error::AudienceNotReady {
					audience_id: audience_id.to_string(),
					code: status.code(),
				});
			}

			let params = params.with("payload", payload.to_json()?);
			let result = self.session.post(&format!("/{audience_id}/usersreplace"), params).await?;

			Ok(result.decode()?)
		})
		.await
	}

	/// `DELETE /{audience_id}/users` with `payload` in the form body.
	pub async fn remove_users(
		&self,
		audience_id: &AudienceId,
		payload: &AudiencePayload,
		params: Params,
	) -> Result<GraphResult> {
		obs::observe(Surface::Audiences, "remove_users", async {
			let params = params.with("payload", payload.to_json()?);

			self.session.delete(&format!("/{audience_id}/users"), params).await
		})
		.await
	}

	/// `GET /{audience_id}/sessions?session_id=...`.
	pub async fn sessions(&self, audience_id: &AudienceId, session_id: &str) -> Result<GraphResult> {
		obs::observe(
			Surface::Audiences,
			"sessions",
			self.session
				.get(&format!("/{audience_id}/sessions"), Params::from([("session_id", session_id)])),
		)
		.await
	}
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	match Value::deserialize(deserializer)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		Value::Null => Ok(String::new()),
		other => Err(D::Error::custom(format!("expected a string or number, got {other}"))),
	}
}
