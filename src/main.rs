use identity_core::auth::RECOMMENDED_VERIFY_LATENCY;
use identity_core::configuration::{get_configuration, CostProfile};
use identity_core::telemetry::init_telemetry;

/// Measures password verification latency at the configured work factor.
fn main() -> std::process::ExitCode {
    if let Err(e) = init_telemetry() {
        eprintln!("Failed to initialize telemetry: {}", e);
    }

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let vault = match configuration.vault.vault() {
        Ok(vault) => vault,
        Err(e) => {
            tracing::error!(error = %e, "Invalid vault configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let elapsed = match vault.measure_verification() {
        Ok(elapsed) => elapsed,
        Err(e) => {
            tracing::error!(error = %e, "Calibration failed");
            return std::process::ExitCode::FAILURE;
        }
    };

    tracing::info!(
        cost = vault.cost().value(),
        elapsed_ms = elapsed.as_millis() as u64,
        token_digest = ?configuration.tokens.digest,
        "Password verification measured"
    );

    if configuration.vault.profile == CostProfile::Production && elapsed < RECOMMENDED_VERIFY_LATENCY {
        tracing::warn!(
            cost = vault.cost().value(),
            elapsed_ms = elapsed.as_millis() as u64,
            recommended_ms = RECOMMENDED_VERIFY_LATENCY.as_millis() as u64,
            "Verification is faster than recommended; raise vault.cost"
        );
    }

    std::process::ExitCode::SUCCESS
}
