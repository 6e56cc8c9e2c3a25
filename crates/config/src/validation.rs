//! Configuration validation

use crate::{AppConfig, ConfigError, FunderConfig, LimitsConfig, Result};
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    // Orchestrator identity
    let orchestrator = &config.orchestrator;
    if orchestrator.address.is_empty() {
        errors.push(ValidationError::new(
            "orchestrator.address",
            "orchestrator address is required",
        ));
    }

    if orchestrator.chain_id == 0 {
        errors.push(ValidationError::new(
            "orchestrator.chain_id",
            "must be greater than 0",
        ));
    }

    if orchestrator.native_denom.is_empty() {
        errors.push(ValidationError::new(
            "orchestrator.native_denom",
            "native denom is required",
        ));
    }

    if orchestrator.pause_authority.is_empty() {
        errors.push(ValidationError::new(
            "orchestrator.pause_authority",
            "pause authority is required",
        ));
    }

    errors.extend(validate_limits(&config.limits));

    let mut funder_addresses = HashSet::new();
    for (name, funder) in &config.funders {
        if let Err(e) = validate_funder(funder) {
            errors.push(ValidationError::new(format!("funders.{name}"), e));
        }
        if !funder_addresses.insert(funder.address.as_str()) {
            errors.push(ValidationError::new(
                format!("funders.{name}.address"),
                format!("duplicate funder address '{}'", funder.address),
            ));
        }
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

fn validate_limits(limits: &LimitsConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let positive = [
        ("limits.max_encoded_len", limits.max_encoded_len),
        ("limits.max_field_len", limits.max_field_len),
        ("limits.max_list_len", limits.max_list_len),
        ("limits.max_calls", limits.max_calls),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if limits.max_field_len > limits.max_encoded_len {
        errors.push(ValidationError::new(
            "limits.max_field_len",
            "must not exceed limits.max_encoded_len",
        ));
    }

    if limits.max_pre_calls > limits.max_list_len || limits.max_calls > limits.max_list_len {
        errors.push(ValidationError::new(
            "limits.max_list_len",
            "must be at least max_pre_calls and max_calls",
        ));
    }
    errors
}

/// Validate a funder entry
pub fn validate_funder(funder: &FunderConfig) -> std::result::Result<(), String> {
    if funder.address.is_empty() {
        return Err("address is required".to_string());
    }

    let key = hex::decode(&funder.signer_public_key)
        .map_err(|e| format!("signer_public_key is not hex: {e}"))?;
    if key.len() != 33 || !matches!(key[0], 0x02 | 0x03) {
        return Err("signer_public_key must be a compressed secp256k1 key".to_string());
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetworkConfig, OrchestratorSettings};

    fn valid() -> AppConfig {
        AppConfig {
            network: NetworkConfig::default(),
            orchestrator: OrchestratorSettings {
                address: "cosmos1orchestrator".to_string(),
                pause_authority: "cosmos1guardian".to_string(),
                ..OrchestratorSettings::default()
            },
            ..AppConfig::default()
        }
    }

    fn funder(address: &str) -> FunderConfig {
        FunderConfig {
            address: address.to_string(),
            signer_public_key: format!("02{}", "11".repeat(32)),
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = valid();
        config.funders.insert("main".to_string(), funder("cosmos1funder"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.network.log_level = "loud".to_string();
        config.orchestrator.address.clear();
        config.orchestrator.chain_id = 0;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("network.log_level"));
        assert!(err.contains("orchestrator.address"));
        assert!(err.contains("orchestrator.chain_id"));
    }

    #[test]
    fn test_limits_consistency() {
        let mut config = valid();
        config.limits.max_field_len = config.limits.max_encoded_len + 1;
        config.limits.max_pre_calls = config.limits.max_list_len + 1;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("limits.max_field_len"));
        assert!(err.contains("limits.max_list_len"));
    }

    #[test]
    fn test_bad_funder_key() {
        let mut bad = funder("cosmos1funder");
        bad.signer_public_key = "zz".to_string();
        assert!(validate_funder(&bad).is_err());
        bad.signer_public_key = format!("04{}", "11".repeat(32));
        assert!(validate_funder(&bad).is_err());
    }

    #[test]
    fn test_duplicate_funder_address() {
        let mut config = valid();
        config.funders.insert("a".to_string(), funder("cosmos1funder"));
        config.funders.insert("b".to_string(), funder("cosmos1funder"));
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate funder address"));
    }
}
