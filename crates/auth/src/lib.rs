//! `catalog-auth`: caller identity from bearer tokens.
//!
//! Tokens are minted by the user subsystem; this crate only verifies them and
//! exposes who is calling. It is decoupled from HTTP and storage.

pub mod claims;
pub mod roles;
pub mod validator;

pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use roles::Role;
pub use validator::{Hs256TokenValidator, TokenValidator};
