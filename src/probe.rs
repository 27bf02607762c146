//! Readiness and persistence probe
//!
//! Runs a fixed, strictly sequential list of steps against a live
//! deployment:
//!
//! `DockerCheck → Cleanup → ServiceStartup → ReadinessWait → ConnectivityCheck
//!  → EndpointCheck → WriteVerify → RestartPersistenceCheck → FrontendSimCheck`
//!
//! The first fatal error stops the sequence. Soft failures are recorded as
//! warnings and the run carries on. Reporting runs after the sequence on
//! every path.

use crate::api::{extract_conversation_id, BackendClient};
use crate::config::{ProbeConfig, RunOptions};
use crate::datastore::DocumentStore;
use crate::endpoints::{surface_checks, Severity};
use crate::error::{ProbeError, ProbeResult};
use crate::marker::MarkerFile;
use crate::models::CreatedConversation;
use crate::runtime::ContainerRuntime;
use service_health::ReadinessGate;
use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStep {
    DockerCheck,
    Cleanup,
    ServiceStartup,
    ReadinessWait,
    ConnectivityCheck,
    EndpointCheck,
    WriteVerify,
    RestartPersistenceCheck,
    FrontendSimCheck,
}

impl ProbeStep {
    /// Steps to run for the given options, in order.
    pub fn plan(options: &RunOptions) -> Vec<ProbeStep> {
        let mut steps = vec![ProbeStep::DockerCheck];
        if !options.skip_cleanup && !options.skip_startup {
            steps.push(ProbeStep::Cleanup);
        }
        if !options.skip_startup {
            steps.push(ProbeStep::ServiceStartup);
        }
        steps.extend([
            ProbeStep::ReadinessWait,
            ProbeStep::ConnectivityCheck,
            ProbeStep::EndpointCheck,
            ProbeStep::WriteVerify,
        ]);
        if !options.no_restart {
            steps.push(ProbeStep::RestartPersistenceCheck);
        }
        steps.push(ProbeStep::FrontendSimCheck);
        steps
    }
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeStep::DockerCheck => "docker check",
            ProbeStep::Cleanup => "cleanup",
            ProbeStep::ServiceStartup => "service startup",
            ProbeStep::ReadinessWait => "readiness wait",
            ProbeStep::ConnectivityCheck => "datastore connectivity",
            ProbeStep::EndpointCheck => "endpoint check",
            ProbeStep::WriteVerify => "write and verify",
            ProbeStep::RestartPersistenceCheck => "persistence across restart",
            ProbeStep::FrontendSimCheck => "frontend load simulation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftWarning {
    pub step: ProbeStep,
    pub message: String,
}

/// Message counts observed around the restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartOutcome {
    pub before: usize,
    pub after: usize,
}

/// State carried from one step to the next.
#[derive(Debug, Default)]
pub struct ProbeContext {
    pub created: Option<CreatedConversation>,
    pub restart: Option<RestartOutcome>,
    pub warnings: Vec<SoftWarning>,
    pub completed: Vec<ProbeStep>,
}

impl ProbeContext {
    fn warn(&mut self, step: ProbeStep, message: String) {
        warn!(step = %step, "⚠️  {}", message);
        self.warnings.push(SoftWarning { step, message });
    }
}

#[derive(Debug)]
pub enum ProbeOutcome {
    Success(ProbeContext),
    Failed {
        step: ProbeStep,
        error: ProbeError,
        context: ProbeContext,
    },
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    pub fn context(&self) -> &ProbeContext {
        match self {
            ProbeOutcome::Success(context) => context,
            ProbeOutcome::Failed { context, .. } => context,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

pub struct Probe<'a> {
    config: ProbeConfig,
    options: RunOptions,
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn DocumentStore>,
    gate: ReadinessGate,
    backend: BackendClient,
    marker: &'a MarkerFile,
}

impl<'a> Probe<'a> {
    pub fn new(
        config: ProbeConfig,
        options: RunOptions,
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn DocumentStore>,
        gate: ReadinessGate,
        backend: BackendClient,
        marker: &'a MarkerFile,
    ) -> Self {
        Self {
            config,
            options,
            runtime,
            store,
            gate,
            backend,
            marker,
        }
    }

    /// Run every planned step, then report.
    pub async fn run(&self) -> ProbeOutcome {
        let mut context = ProbeContext::default();
        let result = self.run_steps(&mut context).await;

        self.report(&context).await;

        match result {
            Ok(()) => {
                info!(
                    warnings = context.warnings.len(),
                    "✅ All checks passed"
                );
                ProbeOutcome::Success(context)
            }
            Err((step, error)) => {
                error!(step = %step, error = %error, "❌ Probe failed");
                ProbeOutcome::Failed {
                    step,
                    error,
                    context,
                }
            }
        }
    }

    async fn run_steps(&self, context: &mut ProbeContext) -> Result<(), (ProbeStep, ProbeError)> {
        for step in ProbeStep::plan(&self.options) {
            self.run_step(step, context).await.map_err(|e| (step, e))?;
        }
        Ok(())
    }

    /// Run a single step and record it as completed on success.
    pub async fn run_step(&self, step: ProbeStep, context: &mut ProbeContext) -> ProbeResult<()> {
        info!("▶ {}", step);

        match step {
            ProbeStep::DockerCheck => self.runtime.check_available().await?,
            ProbeStep::Cleanup => self.cleanup().await,
            ProbeStep::ServiceStartup => self.runtime.start_services().await?,
            ProbeStep::ReadinessWait => self.wait_ready().await?,
            ProbeStep::ConnectivityCheck => self.check_datastore().await?,
            ProbeStep::EndpointCheck => self.check_endpoints(context).await?,
            ProbeStep::WriteVerify => self.write_and_verify(context).await?,
            ProbeStep::RestartPersistenceCheck => self.check_restart_persistence(context).await?,
            ProbeStep::FrontendSimCheck => self.simulate_frontend_load(context).await,
        }

        context.completed.push(step);
        Ok(())
    }

    async fn cleanup(&self) {
        if let Err(e) = self.runtime.cleanup().await {
            debug!(error = %e, "Cleanup failed, continuing");
        }
    }

    async fn wait_ready(&self) -> ProbeResult<()> {
        let poll = self.config.startup_poll();
        for service in [
            &self.config.datastore_service,
            &self.config.index_service,
            &self.config.backend_service,
        ] {
            self.gate.wait_for(service, &poll).await?;
        }
        Ok(())
    }

    async fn check_datastore(&self) -> ProbeResult<()> {
        self.store.ping().await?;

        let counts = self.store.collection_counts().await?;
        info!(
            users = counts.users,
            conversations = counts.conversations,
            messages = counts.messages,
            "Datastore collections queryable"
        );

        let user = &self.config.default_user;
        if self.store.user_exists(user).await? {
            info!(user = %user, "Default user present");
        } else {
            info!(user = %user, "Default user not created yet");
        }

        Ok(())
    }

    async fn check_endpoints(&self, context: &mut ProbeContext) -> ProbeResult<()> {
        for check in surface_checks(&self.config.default_user) {
            let outcome = match self.backend.get(&check.path).await {
                Ok(reply) => check.evaluate(&reply),
                Err(e) => Err(format!("GET {} failed: {}", check.path, e)),
            };

            match (outcome, check.severity) {
                (Ok(()), _) => info!(path = %check.path, "✅ Endpoint OK"),
                (Err(reason), Severity::Soft) => context.warn(ProbeStep::EndpointCheck, reason),
                (Err(reason), Severity::Fatal) => {
                    return Err(ProbeError::assertion("endpoint check", reason));
                }
            }
        }
        Ok(())
    }

    async fn write_and_verify(&self, context: &mut ProbeContext) -> ProbeResult<()> {
        let reply = self.backend.post_chat(&self.config.chat_message).await?;
        if !reply.is_success() {
            return Err(ProbeError::assertion(
                "chat request",
                format!("POST /api/chat returned {}: {}", reply.status, reply.excerpt()),
            ));
        }

        let conversation_id = extract_conversation_id(&reply.body).ok_or_else(|| {
            ProbeError::ConversationIdMissing {
                body: reply.excerpt(),
            }
        })?;
        info!(conversation_id = %conversation_id, "Conversation created");

        self.marker.store(&conversation_id)?;

        let record = self
            .store
            .find_conversation(&conversation_id)
            .await?
            .ok_or_else(|| ProbeError::RecordMissing(conversation_id.clone()))?;

        if record.message_count == 0 {
            return Err(ProbeError::assertion(
                "write verification",
                format!("conversation {} has no messages", conversation_id),
            ));
        }

        let user = &self.config.default_user;
        if !self.store.user_exists(user).await? {
            return Err(ProbeError::assertion(
                "write verification",
                format!("user {} missing after chat request", user),
            ));
        }

        let history_path = format!("/api/history/{}", conversation_id);
        match self.backend.get(&history_path).await {
            Ok(history) if history.is_success() && history.contains(&conversation_id) => {
                info!(path = %history_path, "✅ History readable");
            }
            Ok(history) => context.warn(
                ProbeStep::WriteVerify,
                format!(
                    "GET {} returned {}: {}",
                    history_path,
                    history.status,
                    history.excerpt()
                ),
            ),
            Err(e) => context.warn(
                ProbeStep::WriteVerify,
                format!("GET {} failed: {}", history_path, e),
            ),
        }

        info!(
            conversation_id = %conversation_id,
            messages = record.message_count,
            "✅ Conversation persisted"
        );

        context.created = Some(CreatedConversation {
            conversation_id,
            message_count: record.message_count,
        });
        Ok(())
    }

    async fn check_restart_persistence(&self, context: &mut ProbeContext) -> ProbeResult<()> {
        let conversation_id = match self.marker.load()? {
            Some(id) => id,
            None => {
                info!("No marker file, creating a conversation first");
                self.write_and_verify(context).await?;
                self.marker.load()?.ok_or_else(|| {
                    ProbeError::assertion("marker file", "not written by write step")
                })?
            }
        };

        let before = self
            .store
            .find_conversation(&conversation_id)
            .await?
            .ok_or_else(|| ProbeError::RecordMissing(conversation_id.clone()))?
            .message_count;
        info!(conversation_id = %conversation_id, messages = before, "Recorded pre-restart state");

        // Conversation from a previous write; later steps check it too
        if context.created.is_none() {
            context.created = Some(CreatedConversation {
                conversation_id: conversation_id.clone(),
                message_count: before,
            });
        }

        let targets = self.config.restart_targets();
        info!(services = ?targets, "Restarting services");
        self.runtime.restart_services(&targets).await?;

        let grace = self.config.restart_grace();
        info!(grace = ?grace, "Waiting for services to settle");
        tokio::time::sleep(grace).await;

        let poll = self.config.restart_poll();
        self.gate.wait_for(&self.config.datastore_service, &poll).await?;
        self.gate.wait_for(&self.config.backend_service, &poll).await?;

        let after = self
            .store
            .find_conversation(&conversation_id)
            .await?
            .map(|record| record.message_count)
            .unwrap_or(0);

        context.restart = Some(RestartOutcome { before, after });

        if after == 0 {
            return Err(ProbeError::RecordMissing(conversation_id));
        }
        if after != before {
            return Err(ProbeError::MessageCountChanged {
                conversation_id,
                before,
                after,
            });
        }

        info!(
            conversation_id = %conversation_id,
            messages = after,
            "✅ Conversation survived restart"
        );
        Ok(())
    }

    async fn simulate_frontend_load(&self, context: &mut ProbeContext) {
        let Some(conversation_id) = context
            .created
            .as_ref()
            .map(|created| created.conversation_id.clone())
        else {
            context.warn(
                ProbeStep::FrontendSimCheck,
                "no conversation created in this run".to_string(),
            );
            return;
        };

        match self.backend.get("/api/latest-conversation").await {
            Ok(reply) if reply.is_success() && reply.contains(&conversation_id) => {
                info!(
                    conversation_id = %conversation_id,
                    "✅ Frontend would restore the conversation"
                );
            }
            Ok(reply) => context.warn(
                ProbeStep::FrontendSimCheck,
                format!(
                    "latest conversation does not match {} ({}): {}",
                    conversation_id,
                    reply.status,
                    reply.excerpt()
                ),
            ),
            Err(e) => context.warn(
                ProbeStep::FrontendSimCheck,
                format!("GET /api/latest-conversation failed: {}", e),
            ),
        }
    }

    /// Best-effort dump of container and service state.
    async fn report(&self, context: &ProbeContext) {
        info!("▶ report");

        match self.runtime.status().await {
            Ok(status) => info!("Container status:\n{}", status),
            Err(e) => debug!(error = %e, "Container status unavailable"),
        }
        match self.runtime.resource_usage().await {
            Ok(usage) => info!("Resource usage:\n{}", usage),
            Err(e) => debug!(error = %e, "Resource usage unavailable"),
        }
        match self.runtime.volumes().await {
            Ok(volumes) => info!("Volumes:\n{}", volumes),
            Err(e) => debug!(error = %e, "Volume listing unavailable"),
        }

        for (service, status) in self.gate.snapshot().await {
            info!(service = %service, status = %status, "Service health");
        }

        if let Some(created) = &context.created {
            info!(conversation_id = %created.conversation_id, "Test conversation");
        }
        if let Some(restart) = context.restart {
            info!(before = restart.before, after = restart.after, "Messages across restart");
        }
        for warning in &context.warnings {
            warn!(step = %warning.step, "{}", warning.message);
        }
        info!(
            completed = context.completed.len(),
            warnings = context.warnings.len(),
            "Run summary"
        );
    }
}
