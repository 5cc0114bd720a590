// SPDX-License-Identifier: AGPL-3.0-or-later

//! RPC-backed chain gateway.
//!
//! View functions go straight to the fullnode REST endpoint
//! (`POST {node}/v1/view`). Entry-function submission goes to the issuer's
//! signing relayer (`POST {relayer}/v1/transactions/submit`), which holds
//! the issuer key, signs, submits, waits for inclusion and returns the
//! transaction hash. The gateway never handles private keys.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::warn;

use super::types::{ChainEvent, IdentityView};
use super::ChainError;
use crate::config::Config;
use crate::models::WalletAddress;

/// Per-call timeout for chain RPC requests.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of recent registry events fetched per watcher sweep.
const EVENT_FETCH_LIMIT: u32 = 25;

#[derive(Clone)]
pub struct RpcGateway {
    http: reqwest::Client,
    node_url: String,
    relayer_url: String,
    module_address: String,
    registry_address: String,
    nft_address: String,
}

impl RpcGateway {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .expect("failed to build chain RPC client");

        Self {
            http,
            node_url: config.node_url.trim_end_matches('/').to_string(),
            relayer_url: config.relayer_url.trim_end_matches('/').to_string(),
            module_address: config.module_address.clone(),
            registry_address: config.registry_address.clone(),
            nft_address: config.nft_address.clone(),
        }
    }

    pub async fn submit_identity_update(
        &self,
        wallet: &WalletAddress,
        kyc_level: u8,
        credential_hash: &str,
    ) -> Result<String, ChainError> {
        self.submit_entry_function(
            &format!("{}::identity_registry::submit_kyc", self.module_address),
            json!([
                self.registry_address,
                wallet.as_str(),
                kyc_level,
                credential_hash
            ]),
        )
        .await
    }

    pub async fn revoke_identity(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        self.submit_entry_function(
            &format!("{}::identity_registry::revoke_kyc", self.module_address),
            json!([self.registry_address, wallet.as_str()]),
        )
        .await
    }

    pub async fn view_identity(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<IdentityView>, ChainError> {
        let result = self
            .call_view(
                &format!("{}::identity_registry::get_identity", self.module_address),
                json!([self.registry_address, wallet.as_str()]),
            )
            .await?;

        let Some(first) = result.as_array().and_then(|a| a.first()) else {
            return Ok(None);
        };

        // The view returns an Option wrapped as `{"vec": [identity?]}`.
        let identity = match first.get("vec") {
            Some(Value::Array(vec)) => match vec.first() {
                Some(inner) => inner,
                None => return Ok(None),
            },
            _ => first,
        };
        if identity.is_null() {
            return Ok(None);
        }

        Ok(Some(parse_identity(identity)?))
    }

    pub async fn is_verified(&self, wallet: &WalletAddress) -> bool {
        let result = self
            .call_view(
                &format!("{}::identity_registry::is_verified", self.module_address),
                json!([self.registry_address, wallet.as_str()]),
            )
            .await;

        match result {
            Ok(value) => value
                .as_array()
                .and_then(|a| a.first())
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(e) => {
                warn!(wallet = %wallet, error = %e, "is_verified view failed");
                false
            }
        }
    }

    pub async fn mint_identity_nft(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        self.submit_entry_function(
            &format!("{}::identity_nft::mint_identity_nft", self.module_address),
            json!([self.nft_address, wallet.as_str()]),
        )
        .await
    }

    pub async fn recent_events(&self) -> Result<Vec<ChainEvent>, ChainError> {
        let url = format!(
            "{}/accounts/{}/events/{}::identity_registry::RegistryStore/update_events?limit={}",
            self.node_url, self.registry_address, self.module_address, EVENT_FETCH_LIMIT
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            // Handle may not exist yet on a fresh registry.
            return Ok(Vec::new());
        }

        let raw: Vec<Value> = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        Ok(raw
            .iter()
            .filter_map(|event| {
                let data = event.get("data")?;
                Some(ChainEvent {
                    kind: data
                        .get("kind")
                        .and_then(Value::as_str)
                        .unwrap_or("IdentityUpdated")
                        .to_string(),
                    wallet: data.get("wallet")?.as_str()?.to_string(),
                    version: parse_u64(event.get("version")?).unwrap_or(0),
                    observed_at: chrono::Utc::now(),
                })
            })
            .collect())
    }

    /// Call a read-only view function on the fullnode.
    async fn call_view(&self, function: &str, arguments: Value) -> Result<Value, ChainError> {
        let body = json!({
            "function": function,
            "type_arguments": [],
            "arguments": arguments,
        });

        let response = self
            .http
            .post(format!("{}/view", self.node_url))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(ChainError::Rejected(format!(
                "view {} returned HTTP {}",
                function,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Submit an entry function through the signing relayer and return the
    /// resulting transaction hash.
    async fn submit_entry_function(
        &self,
        function: &str,
        arguments: Value,
    ) -> Result<String, ChainError> {
        let body = json!({
            "function": function,
            "type_arguments": [],
            "arguments": arguments,
        });

        let response = self
            .http
            .post(format!("{}/transactions/submit", self.relayer_url))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = payload
                .get("error")
                .or_else(|| payload.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown relayer error")
                .to_string();
            // The NFT module aborts with an "already minted" message on a
            // duplicate mint; fold that into the typed variant.
            if message.to_lowercase().contains("already") {
                return Err(ChainError::AlreadyMinted);
            }
            return Err(ChainError::Rejected(message));
        }

        payload
            .get("hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ChainError::InvalidResponse("relayer response missing 'hash'".to_string())
            })
    }
}

fn map_transport_error(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::Unavailable("request timed out".to_string())
    } else {
        ChainError::Unavailable(e.to_string())
    }
}

/// Node APIs encode u64 as either a JSON number or a decimal string.
fn parse_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn parse_identity(identity: &Value) -> Result<IdentityView, ChainError> {
    let field_str = |name: &str| -> Result<String, ChainError> {
        identity
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChainError::InvalidResponse(format!("identity missing '{name}'")))
    };

    // credential_hash arrives as a hex string or as a byte array.
    let credential_hash = match identity.get("credential_hash") {
        Some(Value::String(s)) => s.trim_start_matches("0x").to_string(),
        Some(Value::Array(bytes)) => {
            let raw: Vec<u8> = bytes
                .iter()
                .filter_map(|b| b.as_u64().map(|v| v as u8))
                .collect();
            hex::encode(raw)
        }
        _ => String::new(),
    };

    Ok(IdentityView {
        wallet: field_str("wallet")?,
        kyc_level: identity
            .get("kyc_level")
            .and_then(parse_u64_ref)
            .ok_or_else(|| ChainError::InvalidResponse("identity missing 'kyc_level'".into()))?
            as u8,
        credential_hash,
        verified: identity
            .get("verified")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        version: identity.get("version").and_then(parse_u64_ref).unwrap_or(0),
    })
}

fn parse_u64_ref(value: &Value) -> Option<u64> {
    parse_u64(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identity_accepts_string_fields() {
        let raw = json!({
            "wallet": "0xabc",
            "kyc_level": "3",
            "credential_hash": "0xdeadbeef",
            "verified": true,
            "version": "7",
        });

        let view = parse_identity(&raw).unwrap();
        assert_eq!(view.kyc_level, 3);
        assert_eq!(view.credential_hash, "deadbeef");
        assert_eq!(view.version, 7);
        assert!(view.verified);
    }

    #[test]
    fn parse_identity_accepts_byte_array_hash() {
        let raw = json!({
            "wallet": "0xabc",
            "kyc_level": 2,
            "credential_hash": [222, 173, 190, 239],
            "verified": false,
            "version": 1,
        });

        let view = parse_identity(&raw).unwrap();
        assert_eq!(view.credential_hash, "deadbeef");
        assert!(!view.verified);
    }

    #[test]
    fn parse_identity_rejects_missing_wallet() {
        let raw = json!({ "kyc_level": 1 });
        assert!(matches!(
            parse_identity(&raw),
            Err(ChainError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parse_u64_handles_both_encodings() {
        assert_eq!(parse_u64(&json!(5)), Some(5));
        assert_eq!(parse_u64(&json!("12")), Some(12));
        assert_eq!(parse_u64(&json!("not-a-number")), None);
    }
}
