//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs issued by [`make_jwt`]; handlers receive the verified
//! caller through the [`AuthUser`] extractor.

pub mod jwt;
pub mod models;

pub use jwt::{make_jwt, validate_jwt};
pub use models::{AuthUser, JwtClaims};
