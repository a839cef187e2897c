//! Graph API call plumbing: parameter maps, signed sessions, batch calls, decoded results,
//! and app-secret signatures.

pub mod batch;
pub mod params;
pub mod result;
pub mod session;
pub mod signing;

pub use batch::*;
pub use params::*;
pub use result::*;
pub use session::*;
pub use signing::{appsecret_proof, parse_signed_request};
