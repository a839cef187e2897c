//! Auth-domain value types: typed Graph identifiers, redacted secrets, and OAuth tokens.

pub mod id;
pub mod secret;
pub mod token;

pub use id::*;
pub use secret::*;
pub use token::*;
