//! Strongly typed Graph object identifiers used to build request paths.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const AD_ACCOUNT_PREFIX: &str = "act_";

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (audience, dataset, ad account).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (audience, dataset, ad account).
		kind: &'static str,
	},
	/// The identifier contains characters that would alter the request path.
	#[error("{kind} identifier contains the reserved character `{character}`.")]
	ContainsReserved {
		/// Kind of identifier (audience, dataset, ad account).
		kind: &'static str,
		/// Offending character.
		character: char,
	},
	/// The identifier is a `.` or `..` path segment.
	#[error("{kind} identifier cannot be a dot segment.")]
	DotSegment {
		/// Kind of identifier (audience, dataset, ad account).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (audience, dataset, ad account).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { AudienceId, "Identifier of a custom audience.", "Audience" }
def_id! { DatasetId, "Identifier of a conversions dataset (pixel).", "Dataset" }

/// Identifier of an ad account.
///
/// The Graph API addresses ad accounts as `act_<id>`. The identifier accepts either form and
/// stores the bare id; [`AdAccountId::node`] renders the prefixed path segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdAccountId(String);
impl AdAccountId {
	/// Creates a new identifier after validation, stripping an `act_` prefix when present.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();
		let bare = view.strip_prefix(AD_ACCOUNT_PREFIX).unwrap_or(view);

		validate_view("Ad account", bare)?;

		Ok(Self(bare.to_owned()))
	}

	/// Returns the bare account id without the `act_` prefix.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the Graph node name (`act_<id>`).
	pub fn node(&self) -> String {
		format!("{AD_ACCOUNT_PREFIX}{}", self.0)
	}
}
impl AsRef<str> for AdAccountId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AdAccountId> for String {
	fn from(value: AdAccountId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AdAccountId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Debug for AdAccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AdAccount({})", self.0)
	}
}
impl Display for AdAccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AdAccountId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if let Some(character) =
		view.chars().find(|c| matches!(c, '/' | '\\' | '?' | '#' | '&' | '%'))
	{
		return Err(IdentifierError::ContainsReserved { kind, character });
	}
	if view == "." || view == ".." {
		return Err(IdentifierError::DotSegment { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
