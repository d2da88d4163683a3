//! Authentication module
//!
//! Bearer-token issuance/validation and password hashing.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{AuthError, Claims, TokenPair, TokenService, TokenType};
