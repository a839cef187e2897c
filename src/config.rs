//! Client configuration: Graph API version, hosts, and OAuth application credentials.
//!
//! [`Config`] deserializes from any serde source with defaults for everything except the
//! application credentials, and [`Config::from_env`] reads the same settings from
//! `FACEBOOK_*` environment variables.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Graph API version used when none is configured.
pub const DEFAULT_VERSION: &str = "v21.0";
/// Default Graph API host.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
/// Default host serving the login dialog.
pub const DEFAULT_DIALOG_URL: &str = "https://www.facebook.com";

const ENV_PREFIX: &str = "FACEBOOK_";

/// Graph API debug modes appended to every call as `debug=<mode>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
	/// Report every debug message.
	All,
	/// Report informational messages and warnings.
	Info,
	/// Report warnings only.
	Warning,
}
impl DebugMode {
	/// Returns the wire value of the mode.
	pub const fn as_str(self) -> &'static str {
		match self {
			DebugMode::All => "all",
			DebugMode::Info => "info",
			DebugMode::Warning => "warning",
		}
	}
}
impl FromStr for DebugMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"all" => Ok(Self::All),
			"info" => Ok(Self::Info),
			"warning" => Ok(Self::Warning),
			other => Err(ConfigError::InvalidSetting {
				name: "debug".into(),
				reason: format!("unknown debug mode `{other}`"),
			}),
		}
	}
}

/// OAuth application credentials and login defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Config {
	/// Application (client) identifier.
	pub client_id: String,
	/// Application secret; also keys `appsecret_proof` and signed-request verification.
	pub client_secret: TokenSecret,
	/// Permissions requested by the login dialog.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Redirect URI registered for the application.
	#[serde(default)]
	pub redirect_url: Option<Url>,
}
impl OAuth2Config {
	/// Creates credentials without scopes or redirect URI.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			scopes: Vec::new(),
			redirect_url: None,
		}
	}

	/// Replaces the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the redirect URI.
	pub fn with_redirect_url(mut self, url: Url) -> Self {
		self.redirect_url = Some(url);

		self
	}
}

/// Top-level client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// Graph API version (e.g. `v21.0`); empty means unversioned paths.
	#[serde(default = "default_version")]
	pub version: String,
	/// Graph API host.
	#[serde(default = "default_graph_url")]
	pub graph_url: Url,
	/// Host serving the login dialog.
	#[serde(default = "default_dialog_url")]
	pub dialog_url: Url,
	/// Appends `appsecret_proof` to every authenticated call.
	#[serde(default)]
	pub appsecret_proof: bool,
	/// Optional Graph API debug mode.
	#[serde(default)]
	pub debug: Option<DebugMode>,
	/// OAuth application credentials.
	pub oauth2: OAuth2Config,
}
impl Config {
	/// Creates a configuration with default version and hosts.
	pub fn new(oauth2: OAuth2Config) -> Self {
		Self {
			version: default_version(),
			graph_url: default_graph_url(),
			dialog_url: default_dialog_url(),
			appsecret_proof: false,
			debug: None,
			oauth2,
		}
	}

	/// Loads the configuration from `FACEBOOK_*` environment variables.
	///
	/// Recognized keys: `VERSION`, `GRAPH_URL`, `DIALOG_URL`, `APPSECRET_PROOF`, `DEBUG`,
	/// `OAUTH2_CLIENT_ID`, `OAUTH2_CLIENT_SECRET`, `OAUTH2_SCOPES` (comma separated), and
	/// `OAUTH2_REDIRECT_URL`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads the configuration through an arbitrary key lookup (keys carry the `FACEBOOK_`
	/// prefix).
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| {
			lookup(&format!("{ENV_PREFIX}{name}"))
				.map(|value| value.trim().to_owned())
				.filter(|value| !value.is_empty())
		};
		let require = |name: &str| {
			get(name)
				.ok_or_else(|| ConfigError::MissingSetting { name: format!("{ENV_PREFIX}{name}") })
		};
		let mut oauth2 =
			OAuth2Config::new(require("OAUTH2_CLIENT_ID")?, require("OAUTH2_CLIENT_SECRET")?);

		if let Some(scopes) = get("OAUTH2_SCOPES") {
			oauth2.scopes = split_scopes(&scopes);
		}
		if let Some(redirect) = get("OAUTH2_REDIRECT_URL") {
			oauth2.redirect_url = Some(
				Url::parse(&redirect).map_err(|source| ConfigError::InvalidRedirect { source })?,
			);
		}

		let mut config = Self::new(oauth2);

		if let Some(version) = lookup(&format!("{ENV_PREFIX}VERSION")) {
			config.version = version.trim().to_owned();
		}
		if let Some(graph_url) = get("GRAPH_URL") {
			config.graph_url = parse_endpoint("graph", &graph_url)?;
		}
		if let Some(dialog_url) = get("DIALOG_URL") {
			config.dialog_url = parse_endpoint("dialog", &dialog_url)?;
		}
		if let Some(flag) = get("APPSECRET_PROOF") {
			config.appsecret_proof = parse_flag("APPSECRET_PROOF", &flag)?;
		}
		if let Some(mode) = get("DEBUG") {
			config.debug = Some(mode.parse()?);
		}

		config.validate()?;

		Ok(config)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.oauth2.client_id.trim().is_empty() {
			return Err(ConfigError::MissingSetting { name: "oauth2.client_id".into() });
		}
		if self.oauth2.client_secret.is_empty() {
			return Err(ConfigError::MissingSetting { name: "oauth2.client_secret".into() });
		}
		if !self.version.is_empty() && !is_valid_version(&self.version) {
			return Err(ConfigError::InvalidVersion { version: self.version.clone() });
		}

		Ok(())
	}

	/// Login dialog endpoint: `{dialog_url}/{version}/dialog/oauth`.
	pub fn authorization_url(&self) -> Result<Url, ConfigError> {
		join_endpoint("authorization", &self.dialog_url, &self.versioned("/dialog/oauth"))
	}

	/// Token endpoint: `{graph_url}/{version}/oauth/access_token`.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		join_endpoint("token", &self.graph_url, &self.versioned("/oauth/access_token"))
	}

	/// Prefixes `path` with the configured version segment.
	pub(crate) fn versioned(&self, path: &str) -> String {
		let path = path.trim_start_matches('/');

		if self.version.is_empty() {
			format!("/{path}")
		} else {
			format!("/{}/{path}", self.version)
		}
	}
}

fn default_version() -> String {
	DEFAULT_VERSION.into()
}

fn default_graph_url() -> Url {
	Url::parse(DEFAULT_GRAPH_URL).expect("Default Graph URL is a valid constant.")
}

fn default_dialog_url() -> Url {
	Url::parse(DEFAULT_DIALOG_URL).expect("Default dialog URL is a valid constant.")
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

pub(crate) fn join_endpoint(
	endpoint: &'static str,
	base: &Url,
	path: &str,
) -> Result<Url, ConfigError> {
	let root = base.as_str().trim_end_matches('/');

	parse_endpoint(endpoint, &format!("{root}{path}"))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
	match raw.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidSetting {
			name: format!("{ENV_PREFIX}{name}"),
			reason: format!("expected a boolean, got `{raw}`"),
		}),
	}
}

fn split_scopes(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|scope| !scope.is_empty()).map(str::to_owned).collect()
}

fn is_valid_version(version: &str) -> bool {
	let Some(rest) = version.strip_prefix('v') else {
		return false;
	};
	let mut parts = rest.splitn(2, '.');
	let digits = |part: Option<&str>| {
		part.is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
	};

	digits(parts.next()) && digits(parts.next())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		move |key| map.get(key).cloned()
	}

	#[test]
	fn env_lookup_applies_defaults() {
		let config = Config::from_lookup(lookup(&[
			("FACEBOOK_OAUTH2_CLIENT_ID", "app-1"),
			("FACEBOOK_OAUTH2_CLIENT_SECRET", "shh"),
			("FACEBOOK_OAUTH2_SCOPES", "ads_management, email,,business_management"),
		]))
		.expect("Minimal environment should produce a config.");

		assert_eq!(config.version, DEFAULT_VERSION);
		assert_eq!(config.graph_url.as_str(), "https://graph.facebook.com/");
		assert_eq!(config.oauth2.client_id, "app-1");
		assert_eq!(config.oauth2.client_secret.expose(), "shh");
		assert_eq!(config.oauth2.scopes, ["ads_management", "email", "business_management"]);
		assert!(!config.appsecret_proof);
		assert!(config.debug.is_none());
	}

	#[test]
	fn env_lookup_requires_credentials() {
		let err = Config::from_lookup(lookup(&[("FACEBOOK_OAUTH2_CLIENT_ID", "app-1")]))
			.expect_err("Missing secret should be rejected.");

		assert!(matches!(
			err,
			ConfigError::MissingSetting { ref name } if name == "FACEBOOK_OAUTH2_CLIENT_SECRET"
		));
	}

	#[test]
	fn env_lookup_parses_overrides() {
		let config = Config::from_lookup(lookup(&[
			("FACEBOOK_OAUTH2_CLIENT_ID", "app-2"),
			("FACEBOOK_OAUTH2_CLIENT_SECRET", "secret"),
			("FACEBOOK_OAUTH2_REDIRECT_URL", "https://app.example.com/cb"),
			("FACEBOOK_VERSION", "v19.0"),
			("FACEBOOK_APPSECRET_PROOF", "true"),
			("FACEBOOK_DEBUG", "warning"),
		]))
		.expect("Overrides should parse.");

		assert_eq!(config.version, "v19.0");
		assert!(config.appsecret_proof);
		assert_eq!(config.debug, Some(DebugMode::Warning));
		assert_eq!(
			config.oauth2.redirect_url.as_ref().map(Url::as_str),
			Some("https://app.example.com/cb")
		);

		let err = Config::from_lookup(lookup(&[
			("FACEBOOK_OAUTH2_CLIENT_ID", "app-2"),
			("FACEBOOK_OAUTH2_CLIENT_SECRET", "secret"),
			("FACEBOOK_APPSECRET_PROOF", "maybe"),
		]))
		.expect_err("Non-boolean flag should be rejected.");

		assert!(matches!(err, ConfigError::InvalidSetting { .. }));
	}

	#[test]
	fn version_validation() {
		let mut config = Config::new(OAuth2Config::new("id", "secret"));

		assert!(config.validate().is_ok());

		config.version = "21.0".into();

		assert!(matches!(config.validate(), Err(ConfigError::InvalidVersion { .. })));

		config.version = "v21".into();

		assert!(config.validate().is_err());

		config.version = String::new();

		assert!(config.validate().is_ok());
		assert_eq!(config.versioned("/me"), "/me");
	}

	#[test]
	fn derived_endpoints_follow_version() {
		let config = Config::new(OAuth2Config::new("id", "secret"));

		assert_eq!(
			config.authorization_url().expect("Authorization URL should build.").as_str(),
			"https://www.facebook.com/v21.0/dialog/oauth"
		);
		assert_eq!(
			config.token_url().expect("Token URL should build.").as_str(),
			"https://graph.facebook.com/v21.0/oauth/access_token"
		);
	}

	#[test]
	fn serde_defaults_fill_optional_fields() {
		let config: Config = serde_json::from_str(
			r#"{"oauth2":{"client_id":"app","client_secret":"secret","scopes":["email"]}}"#,
		)
		.expect("Config should deserialize with defaults.");

		assert_eq!(config.version, DEFAULT_VERSION);
		assert_eq!(config.dialog_url.as_str(), "https://www.facebook.com/");
		assert_eq!(config.oauth2.scopes, ["email"]);
		assert!(config.oauth2.redirect_url.is_none());
	}
}
