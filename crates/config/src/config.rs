//! Core configuration structures for the relay intents engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Orchestrator identity and pause authority
    pub orchestrator: OrchestratorSettings,

    /// Decoder limits for untrusted intent payloads
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Registered funders by name
    #[serde(default)]
    pub funders: HashMap<String, FunderConfig>,
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Orchestrator deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Orchestrator address; signed into every digest
    pub address: String,

    /// Chain id signed into non-multichain digests
    pub chain_id: u64,

    /// Denom of call values
    #[serde(default = "default_native_denom")]
    pub native_denom: String,

    /// Address allowed to pause execution
    pub pause_authority: String,

    /// Implementation label given to bootstrapped accounts
    #[serde(default = "default_account_implementation")]
    pub account_implementation: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            address: String::new(),
            chain_id: 1,
            native_denom: default_native_denom(),
            pause_authority: String::new(),
            account_implementation: default_account_implementation(),
        }
    }
}

/// Structural limits for intent decoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_encoded_len")]
    pub max_encoded_len: usize,

    #[serde(default = "default_max_field_len")]
    pub max_field_len: usize,

    #[serde(default = "default_max_list_len")]
    pub max_list_len: usize,

    #[serde(default = "default_max_pre_calls")]
    pub max_pre_calls: usize,

    #[serde(default = "default_max_calls")]
    pub max_calls: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_encoded_len: default_max_encoded_len(),
            max_field_len: default_max_field_len(),
            max_list_len: default_max_list_len(),
            max_pre_calls: default_max_pre_calls(),
            max_calls: default_max_calls(),
        }
    }
}

/// A funder the orchestrator may invoke for output-chain transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunderConfig {
    /// Ledger address the funder pays from
    pub address: String,

    /// Hex-encoded compressed secp256k1 key that signs funding digests
    pub signer_public_key: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_native_denom() -> String {
    "uatom".to_string()
}

fn default_account_implementation() -> String {
    "account-v1".to_string()
}

fn default_max_encoded_len() -> usize {
    128 * 1024
}

fn default_max_field_len() -> usize {
    64 * 1024
}

fn default_max_list_len() -> usize {
    256
}

fn default_max_pre_calls() -> usize {
    16
}

fn default_max_calls() -> usize {
    64
}
