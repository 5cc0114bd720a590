// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Runtime Configuration
//!
//! All configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `CHAIN_NODE_URL` | Chain fullnode REST endpoint | testnet fullnode |
//! | `CHAIN_MODULE_ADDRESS` | Identity module publisher address | required unless mock |
//! | `CHAIN_REGISTRY_ADDRESS` | Registry resource account | module address |
//! | `CHAIN_NFT_ADDRESS` | Identity NFT account | module address |
//! | `CHAIN_RELAYER_URL` | Issuer signing relayer endpoint | node URL |
//! | `ENABLE_MOCK_CHAIN` | Use the in-process mock gateway | `false` |
//! | `EXPLORER_BASE_URL` | Explorer link base for tx hashes | testnet explorer |
//! | `FACE_ENDPOINT` | Remote face-match service URL | unset (stub matcher) |
//! | `FACE_API_KEY` | Face-match service API key | unset |
//! | `API_KEY_ENABLED` | Enable static API-key gate | `false` |
//! | `API_KEY` | Expected `x-api-key` header value | unset |
//! | `CORS_ORIGIN` | Allowed CORS origin | `*` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;

const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.chainlabs.example/v1";
const DEFAULT_EXPLORER_BASE_URL: &str = "https://explorer.chainlabs.example/txn";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub node_url: String,
    pub module_address: String,
    pub registry_address: String,
    pub nft_address: String,
    pub relayer_url: String,
    pub enable_mock_chain: bool,
    pub explorer_base_url: String,
    pub face_endpoint: Option<String>,
    pub face_api_key: Option<String>,
    pub api_key_enabled: bool,
    pub api_key: Option<String>,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        let node_url = env_or_default("CHAIN_NODE_URL", DEFAULT_NODE_URL);
        let module_address = env_or_default("CHAIN_MODULE_ADDRESS", "");
        let registry_address =
            env::var("CHAIN_REGISTRY_ADDRESS").unwrap_or_else(|_| module_address.clone());
        let nft_address =
            env::var("CHAIN_NFT_ADDRESS").unwrap_or_else(|_| module_address.clone());
        let relayer_url = env::var("CHAIN_RELAYER_URL").unwrap_or_else(|_| node_url.clone());

        Self {
            host: env_or_default("HOST", "0.0.0.0"),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            node_url,
            module_address,
            registry_address,
            nft_address,
            relayer_url,
            enable_mock_chain: env_flag("ENABLE_MOCK_CHAIN"),
            explorer_base_url: env_or_default("EXPLORER_BASE_URL", DEFAULT_EXPLORER_BASE_URL),
            face_endpoint: env::var("FACE_ENDPOINT").ok().filter(|v| !v.is_empty()),
            face_api_key: env::var("FACE_API_KEY").ok().filter(|v| !v.is_empty()),
            api_key_enabled: env_flag("API_KEY_ENABLED"),
            api_key: env::var("API_KEY").ok().filter(|v| !v.is_empty()),
            cors_origin: env_or_default("CORS_ORIGIN", "*"),
        }
    }

    /// Explorer link for a submitted transaction hash.
    pub fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}/{}?network=testnet", self.explorer_base_url, tx_hash)
    }

    /// Sanity-check the configured endpoints before serving.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("CHAIN_NODE_URL", &self.node_url),
            ("CHAIN_RELAYER_URL", &self.relayer_url),
        ] {
            url::Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
        }

        if !self.enable_mock_chain && self.module_address.is_empty() {
            return Err(
                "CHAIN_MODULE_ADDRESS is required unless ENABLE_MOCK_CHAIN=true".to_string(),
            );
        }

        if self.api_key_enabled && self.api_key.is_none() {
            return Err("API_KEY is required when API_KEY_ENABLED=true".to_string());
        }

        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true" || v == "1").unwrap_or(false)
}
