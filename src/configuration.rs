use serde::Deserialize;

use crate::auth::{Cost, DigestScheme, PasswordVault, TokenIssuer, MIN_PRODUCTION_COST};
use crate::error::ConfigError;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub vault: VaultSettings,
    pub tokens: TokenSettings,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Base URL activation links point at
    pub activation_base_url: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            activation_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Which work factor family the process runs with
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CostProfile {
    #[default]
    Production,
    Test,
}

/// Password vault settings
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct VaultSettings {
    pub profile: CostProfile,
    /// Explicit bcrypt cost; the profile's cost applies when unset
    pub cost: Option<u32>,
}

impl VaultSettings {
    /// Resolve the effective cost
    ///
    /// The minimal test cost is only reachable through `profile = "test"`.
    /// A production profile refuses anything below `MIN_PRODUCTION_COST`.
    pub fn cost(&self) -> Result<Cost, ConfigError> {
        let cost = match (self.profile, self.cost) {
            (CostProfile::Production, None) => Cost::PRODUCTION,
            (CostProfile::Test, None) => Cost::TEST,
            (_, Some(value)) => {
                Cost::new(value).map_err(|e| ConfigError::InvalidValue(e.to_string()))?
            }
        };

        if self.profile == CostProfile::Production && cost.value() < MIN_PRODUCTION_COST {
            return Err(ConfigError::InvalidValue(format!(
                "vault.cost {} is below the production minimum {}",
                cost.value(),
                MIN_PRODUCTION_COST
            )));
        }

        Ok(cost)
    }

    pub fn vault(&self) -> Result<PasswordVault, ConfigError> {
        Ok(PasswordVault::new(self.cost()?))
    }
}

/// Token digest settings
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct TokenSettings {
    pub digest: DigestScheme,
}

impl Settings {
    pub fn token_issuer(&self) -> Result<TokenIssuer, ConfigError> {
        Ok(TokenIssuer::new(self.tokens.digest, self.vault.vault()?))
    }
}

/// Load settings from an optional `configuration` file and `APP_*` environment variables
///
/// Nested keys use `__`, e.g. `APP_VAULT__PROFILE=test` or `APP_VAULT__COST=11`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(source: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_production() {
        let settings = parse("");
        assert_eq!(settings.vault.profile, CostProfile::Production);
        assert_eq!(settings.vault.cost().unwrap(), Cost::PRODUCTION);
        assert_eq!(settings.tokens.digest, DigestScheme::Bcrypt);
    }

    #[test]
    fn test_test_profile_uses_minimal_cost() {
        let settings = parse("[vault]\nprofile = \"test\"\n");
        assert_eq!(settings.vault.cost().unwrap(), Cost::TEST);
    }

    #[test]
    fn test_explicit_cost_and_digest() {
        let settings = parse(
            "[vault]\ncost = 11\n[tokens]\ndigest = \"sha256\"\n[application]\nactivation_base_url = \"https://example.com\"\n",
        );
        assert_eq!(settings.vault.cost().unwrap().value(), 11);
        assert_eq!(settings.tokens.digest, DigestScheme::Sha256);
        assert_eq!(settings.application.activation_base_url, "https://example.com");
        assert_eq!(settings.token_issuer().unwrap().scheme(), DigestScheme::Sha256);
    }

    #[test]
    fn test_low_cost_rejected_outside_test_profile() {
        let settings = VaultSettings {
            profile: CostProfile::Production,
            cost: Some(4),
        };
        assert!(settings.cost().is_err());
    }

    #[test]
    fn test_out_of_range_cost_rejected() {
        let settings = VaultSettings {
            profile: CostProfile::Test,
            cost: Some(40),
        };
        assert!(settings.vault().is_err());
    }
}
