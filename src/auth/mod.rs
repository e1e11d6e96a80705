/// Credential primitives
///
/// Password hashing with a tunable bcrypt work factor, and opaque token
/// issuance with at-rest digests.

mod password;
mod token;

pub use password::{Cost, PasswordVault, MIN_PRODUCTION_COST, RECOMMENDED_VERIFY_LATENCY};
pub use token::{DigestScheme, IssuedToken, PlainToken, TokenIssuer};
