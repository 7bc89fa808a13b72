//! Token issuance, password hashing and the session cache.

pub mod password;
pub mod session;
pub mod token;

pub use session::SessionStore;
pub use token::{CandidateUser, TokenKind, TokenService};
