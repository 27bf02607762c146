//! Test Harness Module
//!
//! Provides infrastructure for probe flow tests:
//! - In-memory container runtime that records every call
//! - In-memory document store
//! - Fixed readiness checks
//! - Mocked chat backend (wiremock)

#![allow(dead_code)]

use async_trait::async_trait;
use persistence_probe::{
    CollectionCounts, ContainerRuntime, ConversationRecord, DocumentStore, ProbeConfig, ProbeError,
    ProbeResult,
};
use serde_json::json;
use service_health::{HealthCheck, HealthCheckError, ReadinessGate};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CONVERSATION_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
pub const DEFAULT_USER: &str = "default-user";

/// Configuration pointing at a mock backend, with timings short enough for tests.
pub fn test_config(backend_url: &str, marker_path: &Path) -> ProbeConfig {
    ProbeConfig {
        backend_url: backend_url.to_string(),
        marker_path: marker_path.to_path_buf(),
        poll_interval_secs: 1,
        startup_timeout_secs: 5,
        restart_grace_secs: 0,
        restart_timeout_secs: 5,
        http_timeout_secs: 5,
        ..ProbeConfig::default()
    }
}

// ==================== Container runtime ====================

/// What a restart does to the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartEffect {
    /// Data on a persistent volume
    Keep,
    /// Data lost with the container
    Wipe,
    /// A replayed write duplicates a message
    AddMessage,
}

pub struct FakeRuntime {
    available: bool,
    fail_cleanup: bool,
    restart_effect: RestartEffect,
    store: Arc<FakeStore>,
    calls: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self {
            available: true,
            fail_cleanup: false,
            restart_effect: RestartEffect::Keep,
            store,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_cleanup(mut self) -> Self {
        self.fail_cleanup = true;
        self
    }

    pub fn on_restart(mut self, effect: RestartEffect) -> Self {
        self.restart_effect = effect;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(name))
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn check_available(&self) -> ProbeResult<()> {
        self.record("check_available");
        if self.available {
            Ok(())
        } else {
            Err(ProbeError::RuntimeUnavailable(
                "Cannot connect to the Docker daemon".to_string(),
            ))
        }
    }

    async fn cleanup(&self) -> ProbeResult<()> {
        self.record("cleanup");
        if self.fail_cleanup {
            Err(ProbeError::Command {
                command: "docker compose down".to_string(),
                detail: "no such project".to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn start_services(&self) -> ProbeResult<()> {
        self.record("start_services");
        Ok(())
    }

    async fn restart_services(&self, services: &[String]) -> ProbeResult<()> {
        self.record(format!("restart {}", services.join(" ")));
        match self.restart_effect {
            RestartEffect::Keep => {}
            RestartEffect::Wipe => self.store.wipe(),
            RestartEffect::AddMessage => self.store.add_message(CONVERSATION_ID),
        }
        Ok(())
    }

    async fn status(&self) -> ProbeResult<String> {
        self.record("status");
        Ok("NAME      STATUS\nmongodb   Up\nchromadb  Up\nbackend   Up".to_string())
    }

    async fn resource_usage(&self) -> ProbeResult<String> {
        self.record("resource_usage");
        Err(ProbeError::Command {
            command: "docker stats".to_string(),
            detail: "not supported in tests".to_string(),
        })
    }

    async fn volumes(&self) -> ProbeResult<String> {
        self.record("volumes");
        Ok("DRIVER    VOLUME NAME\nlocal     mongodb_data".to_string())
    }
}

// ==================== Document store ====================

#[derive(Default)]
pub struct FakeStore {
    conversations: Mutex<HashMap<String, ConversationRecord>>,
    users: Mutex<HashSet<String>>,
    unreachable: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding what the backend writes for one chat exchange.
    pub fn with_conversation(conversation_id: &str, message_count: usize) -> Self {
        let store = Self::new();
        store.users.lock().unwrap().insert(DEFAULT_USER.to_string());
        store.conversations.lock().unwrap().insert(
            conversation_id.to_string(),
            ConversationRecord {
                conversation_id: conversation_id.to_string(),
                user_id: Some(DEFAULT_USER.to_string()),
                message_count,
            },
        );
        store
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn wipe(&self) {
        self.conversations.lock().unwrap().clear();
        self.users.lock().unwrap().clear();
    }

    pub fn add_message(&self, conversation_id: &str) {
        if let Some(record) = self.conversations.lock().unwrap().get_mut(conversation_id) {
            record.message_count += 1;
        }
    }

    fn ensure_reachable(&self) -> ProbeResult<()> {
        if self.unreachable {
            Err(ProbeError::Command {
                command: "ping".to_string(),
                detail: "server selection timeout".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn ping(&self) -> ProbeResult<()> {
        self.ensure_reachable()
    }

    async fn collection_counts(&self) -> ProbeResult<CollectionCounts> {
        self.ensure_reachable()?;
        let conversations = self.conversations.lock().unwrap();
        Ok(CollectionCounts {
            users: self.users.lock().unwrap().len() as u64,
            conversations: conversations.len() as u64,
            messages: conversations.values().map(|c| c.message_count as u64).sum(),
        })
    }

    async fn user_exists(&self, user_id: &str) -> ProbeResult<bool> {
        self.ensure_reachable()?;
        Ok(self.users.lock().unwrap().contains(user_id))
    }

    async fn find_conversation(
        &self,
        conversation_id: &str,
    ) -> ProbeResult<Option<ConversationRecord>> {
        self.ensure_reachable()?;
        Ok(self.conversations.lock().unwrap().get(conversation_id).cloned())
    }
}

// ==================== Readiness ====================

pub struct ReadyCheck;

#[async_trait]
impl HealthCheck for ReadyCheck {
    async fn check(&self) -> service_health::Result<()> {
        Ok(())
    }
}

pub struct NeverReadyCheck;

#[async_trait]
impl HealthCheck for NeverReadyCheck {
    async fn check(&self) -> service_health::Result<()> {
        Err(HealthCheckError::http("connection refused"))
    }
}

/// Gate where every configured service is immediately ready.
pub fn ready_gate(config: &ProbeConfig) -> ReadinessGate {
    let mut gate = ReadinessGate::new();
    gate.register(config.datastore_service.clone(), Box::new(ReadyCheck));
    gate.register(config.index_service.clone(), Box::new(ReadyCheck));
    gate.register(config.backend_service.clone(), Box::new(ReadyCheck));
    gate
}

// ==================== Backend ====================

fn json_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Mount the endpoints every healthy run touches, except
/// `/api/latest-conversation` and `/api/stats`.
pub async fn mount_core_backend(server: &MockServer, conversation_id: &str) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(json_response(
            json!({ "status": "healthy", "service": "DocuBuddy Backend" }),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/current-user"))
        .respond_with(json_response(json!({
            "user_id": DEFAULT_USER,
            "name": "Usuario Demo",
            "is_authenticated": true
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(json_response(json!({ "conversations": [], "total": 0 })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(json_response(json!({
            "response": "pong",
            "conversation_id": conversation_id,
            "sources": []
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/history/{}", conversation_id)))
        .respond_with(json_response(json!({
            "conversation_id": conversation_id,
            "messages": [
                { "role": "user", "content": "ping" },
                { "role": "assistant", "content": "pong" }
            ]
        })))
        .mount(server)
        .await;
}

/// Empty on the first fetch (cold start), then the created conversation.
pub async fn mount_latest_cold_then_created(server: &MockServer, conversation_id: &str) {
    Mock::given(method("GET"))
        .and(path("/api/latest-conversation"))
        .respond_with(json_response(json!({ "conversation_id": null, "messages": [] })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/latest-conversation"))
        .respond_with(json_response(json!({
            "conversation_id": conversation_id,
            "messages": [{ "role": "user", "content": "ping" }]
        })))
        .mount(server)
        .await;
}

/// Never has a latest conversation.
pub async fn mount_latest_always_empty(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/latest-conversation"))
        .respond_with(json_response(json!({ "conversation_id": null, "messages": [] })))
        .mount(server)
        .await;
}

pub async fn mount_stats(server: &MockServer, status: u16) {
    let template = if status == 200 {
        json_response(json!({
            "retrieval": { "total_documents": 10, "collection_name": "documentation" },
            "conversations": { "total": 1, "total_messages": 2 }
        }))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({ "detail": "retrieval service down" }))
    };

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Core endpoints, cold-start latest conversation and working stats.
pub async fn mount_healthy_backend(server: &MockServer, conversation_id: &str) {
    mount_core_backend(server, conversation_id).await;
    mount_latest_cold_then_created(server, conversation_id).await;
    mount_stats(server, 200).await;
}
