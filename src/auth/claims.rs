use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
///
/// Decoding fails when a field is missing or has the wrong type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,   // user ID
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
