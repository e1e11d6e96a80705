/// Password Hashing and Verification
///
/// `PasswordVault` wraps bcrypt with an explicit work factor. Every digest
/// embeds its own salt and cost, so digests are verified, never compared.

use std::time::{Duration, Instant};

use crate::error::VaultError;
use crate::validators::MAX_PASSWORD_BYTES;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Lowest cost accepted outside the test profile.
pub const MIN_PRODUCTION_COST: u32 = 10;

/// Verification latency a production cost should reach on the host.
pub const RECOMMENDED_VERIFY_LATENCY: Duration = Duration::from_millis(100);

/// bcrypt work factor (log2 of the number of key expansion rounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost(u32);

impl Cost {
    /// bcrypt's default cost, used in production unless configured otherwise.
    pub const PRODUCTION: Cost = Cost(bcrypt::DEFAULT_COST);

    /// Minimal cost. Only selected by the explicit test profile.
    pub const TEST: Cost = Cost(MIN_COST);

    pub fn new(value: u32) -> Result<Self, VaultError> {
        if !(MIN_COST..=MAX_COST).contains(&value) {
            return Err(VaultError::InvalidInput(format!(
                "cost {} outside {}..={}",
                value, MIN_COST, MAX_COST
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct PasswordVault {
    cost: Cost,
}

impl PasswordVault {
    pub fn new(cost: Cost) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Hash a plaintext secret at the vault's configured cost
    pub fn hash(&self, plaintext: &str) -> Result<String, VaultError> {
        self.hash_with_cost(plaintext, self.cost)
    }

    /// Hash a plaintext secret with a fresh random salt
    ///
    /// # Errors
    /// Returns `InvalidInput` if the plaintext is empty or longer than bcrypt
    /// can read without truncating.
    pub fn hash_with_cost(&self, plaintext: &str, cost: Cost) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Err(VaultError::InvalidInput("plaintext is empty".to_string()));
        }

        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(VaultError::InvalidInput(format!(
                "plaintext exceeds {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        bcrypt::hash(plaintext, cost.value()).map_err(|e| VaultError::HashFailed(e.to_string()))
    }

    /// Verify a plaintext secret against a digest this vault produced
    ///
    /// A wrong secret is `Ok(false)`. Only a digest that is not a bcrypt
    /// digest at all is an error.
    ///
    /// A plaintext longer than `MAX_PASSWORD_BYTES` was never hashed by this
    /// vault, so it never verifies, even when its first 72 bytes do.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, VaultError> {
        let matched = bcrypt::verify(plaintext, digest).map_err(|e| {
            tracing::debug!(error = %e, "Rejected malformed password digest");
            VaultError::MalformedDigest
        })?;
        Ok(matched && plaintext.len() <= MAX_PASSWORD_BYTES)
    }

    /// Time one hash-and-verify cycle at the configured cost
    pub fn measure_verification(&self) -> Result<Duration, VaultError> {
        let digest = self.hash("calibration-probe")?;
        let started = Instant::now();
        self.verify("calibration-probe", &digest)?;
        Ok(started.elapsed())
    }
}
