//! Container runtime control.

use crate::config::ProbeConfig;
use crate::error::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Operations the probe needs from the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Fails with `RuntimeUnavailable` when the runtime cannot be reached.
    async fn check_available(&self) -> ProbeResult<()>;

    /// Tear down containers, volumes and locally built images of the stack.
    async fn cleanup(&self) -> ProbeResult<()>;

    async fn start_services(&self) -> ProbeResult<()>;

    async fn restart_services(&self, services: &[String]) -> ProbeResult<()>;

    async fn status(&self) -> ProbeResult<String>;

    async fn resource_usage(&self) -> ProbeResult<String>;

    async fn volumes(&self) -> ProbeResult<String>;
}

/// `docker` CLI with the compose plugin.
pub struct DockerCompose {
    compose_file: PathBuf,
    project: Option<String>,
    command_timeout: Duration,
}

impl DockerCompose {
    pub fn new(
        compose_file: impl Into<PathBuf>,
        project: Option<String>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            compose_file: compose_file.into(),
            project,
            command_timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.compose_file.clone(),
            config.compose_project.clone(),
            config.command_timeout(),
        )
    }

    /// `compose -f <file> [-p <project>] <args...>`
    fn compose_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = vec![
            "compose".to_string(),
            "-f".to_string(),
            self.compose_file.display().to_string(),
        ];
        if let Some(project) = &self.project {
            full.push("-p".to_string());
            full.push(project.clone());
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Run `docker <args>` and return trimmed stdout.
    async fn docker(&self, args: Vec<String>) -> ProbeResult<String> {
        let command = format!("docker {}", args.join(" "));
        tracing::debug!(command = %command, "Running");

        let child = Command::new("docker")
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = resilience::with_timeout(command.clone(), self.command_timeout, child)
            .await
            .map_err(|e| ProbeError::Command {
                command: command.clone(),
                detail: e.to_string(),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Command {
                command,
                detail: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCompose {
    async fn check_available(&self) -> ProbeResult<()> {
        self.docker(vec![
            "info".to_string(),
            "--format".to_string(),
            "{{.ServerVersion}}".to_string(),
        ])
        .await
        .map(|version| tracing::info!(server_version = %version, "Docker is running"))
        .map_err(|e| ProbeError::RuntimeUnavailable(e.to_string()))
    }

    async fn cleanup(&self) -> ProbeResult<()> {
        self.docker(self.compose_args(&["down", "--volumes", "--remove-orphans", "--rmi", "local"]))
            .await
            .map(|_| ())
    }

    async fn start_services(&self) -> ProbeResult<()> {
        self.docker(self.compose_args(&["up", "-d", "--build"]))
            .await
            .map(|_| ())
    }

    async fn restart_services(&self, services: &[String]) -> ProbeResult<()> {
        let mut args = vec!["restart"];
        args.extend(services.iter().map(String::as_str));
        self.docker(self.compose_args(&args)).await.map(|_| ())
    }

    async fn status(&self) -> ProbeResult<String> {
        self.docker(self.compose_args(&["ps"])).await
    }

    async fn resource_usage(&self) -> ProbeResult<String> {
        self.docker(vec![
            "stats".to_string(),
            "--no-stream".to_string(),
            "--format".to_string(),
            "table {{.Name}}\t{{.CPUPerc}}\t{{.MemUsage}}".to_string(),
        ])
        .await
    }

    async fn volumes(&self) -> ProbeResult<String> {
        self.docker(vec!["volume".to_string(), "ls".to_string()]).await
    }
}
