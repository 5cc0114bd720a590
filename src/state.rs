// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::chain::ChainGateway;
use crate::config::Config;
use crate::kyc::{KycOrchestrator, StatusResolver};
use crate::storage::{IdentityMirror, SessionStore};
use crate::verification::{CodePolicy, CodeStore, EmailVerifier, FaceMatcher, PhoneVerifier};
use crate::watcher::AuditLog;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub identities: IdentityMirror,
    pub chain: ChainGateway,
    pub orchestrator: Arc<KycOrchestrator>,
    pub resolver: StatusResolver,
    pub email: EmailVerifier,
    pub phone: PhoneVerifier,
    pub face: FaceMatcher,
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let chain = ChainGateway::from_config(&config);
        Self::with_chain(config, chain)
    }

    /// Wire state around an explicit chain gateway (tests pass the mock).
    pub fn with_chain(config: Config, chain: ChainGateway) -> Self {
        let sessions = SessionStore::new();
        let identities = IdentityMirror::new();

        let orchestrator = Arc::new(KycOrchestrator::new(
            sessions.clone(),
            identities.clone(),
            chain.clone(),
        ));
        let resolver = StatusResolver::new(chain.clone(), identities.clone());

        // Each channel keeps its own code store so email and phone codes for
        // one session never collide.
        let email = EmailVerifier::new(CodeStore::new(), CodePolicy::AutoVerify);
        let phone = PhoneVerifier::new(CodeStore::new(), CodePolicy::AutoVerify);
        let face = FaceMatcher::from_config(&config);

        Self {
            config: Arc::new(config),
            sessions,
            identities,
            chain,
            orchestrator,
            resolver,
            email,
            phone,
            face,
            audit: AuditLog::new(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by the mock chain gateway, for handler tests.
    pub fn mock() -> Self {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            node_url: "http://localhost:8080/v1".to_string(),
            module_address: "0x1".to_string(),
            registry_address: "0x1".to_string(),
            nft_address: "0x1".to_string(),
            relayer_url: "http://localhost:8080/v1".to_string(),
            enable_mock_chain: true,
            explorer_base_url: "https://explorer.example/txn".to_string(),
            face_endpoint: None,
            face_api_key: None,
            api_key_enabled: false,
            api_key: None,
            cors_origin: "*".to_string(),
        };
        let chain = ChainGateway::Mock(crate::chain::MockChain::new());
        Self::with_chain(config, chain)
    }

    /// The mock gateway behind this state, for assertions.
    pub fn mock_chain(&self) -> &crate::chain::MockChain {
        match &self.chain {
            ChainGateway::Mock(mock) => mock,
            ChainGateway::Rpc(_) => panic!("state was not built with the mock gateway"),
        }
    }

    /// The stub face matcher behind this state, for pinning outcomes.
    pub fn stub_face(&self) -> &crate::verification::face::StubFaceMatcher {
        match &self.face {
            FaceMatcher::Stub(stub) => stub,
            FaceMatcher::Remote(_) => panic!("state was not built with the stub matcher"),
        }
    }
}
