// lucidumtool/src/docker/mod.rs
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::utils::find_executable;

/// Thin wrapper over the `docker` CLI for running commands against a named
/// container and moving files into it. The executable is looked up per
/// call, so a missing docker install surfaces as that target's failure.
#[derive(Debug, Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    /// Executes a command inside `container`, with extra environment
    /// variables injected into the container process (credentials travel
    /// this way, never on the command line).
    pub fn exec(&self, container: &str, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
        let mut cmd = Command::new(find_executable("docker")?);
        cmd.arg("exec");
        for (key, value) in env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        cmd.arg(container).args(args);
        cmd.output()
            .with_context(|| format!("Failed to execute docker exec in '{container}' container"))
    }

    /// Same as `exec`, but the command runs through `sh -c` so that shell
    /// redirections are available.
    pub fn shell_exec(&self, container: &str, script: &str, env: &[(&str, &str)]) -> Result<Output> {
        self.exec(container, &["sh", "-c", script], env)
    }

    /// Copies a local file into `container` at `dest_dir`, keeping its
    /// file name.
    pub fn copy_into(&self, src: &Path, container: &str, dest_dir: &str) -> Result<()> {
        let output = Command::new(find_executable("docker")?)
            .arg("cp")
            .arg(src)
            .arg(format!("{container}:{dest_dir}/"))
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute docker cp of {} into '{container}' container",
                    src.display()
                )
            })?;
        if !output.status.success() {
            return Err(AppError::from_output("docker cp", &output).into());
        }
        Ok(())
    }

    /// Best-effort removal of a file inside a container. Failure is logged,
    /// never escalated.
    pub fn remove_in_container(&self, container: &str, path: &str) {
        match self.exec(container, &["rm", path], &[]) {
            Ok(output) if !output.status.success() => {
                warn!(
                    "Failed to remove {path} in '{container}' container: {}",
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            Err(e) => warn!("Failed to remove {path} in '{container}' container: {e}"),
            _ => {}
        }
    }
}

/// Stop/start of compose-managed services, run from the application root.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    project_dir: PathBuf,
}

impl ComposeCli {
    pub fn new(project_dir: PathBuf) -> Self {
        Self { project_dir }
    }

    pub fn stop(&self, service: &str) -> Result<()> {
        self.run("stop", service)
    }

    pub fn start(&self, service: &str) -> Result<()> {
        self.run("start", service)
    }

    fn run(&self, action: &str, service: &str) -> Result<()> {
        info!("Running compose {action} for '{service}' service...");
        let output = Command::new(find_executable("docker")?)
            .args(["compose", action, service])
            .current_dir(&self.project_dir)
            .output()
            .with_context(|| format!("Failed to execute docker compose {action} {service}"))?;
        if !output.status.success() {
            return Err(AppError::from_output(&format!("docker compose {action}"), &output).into());
        }
        Ok(())
    }
}

/// Stops a service on construction and restarts it when dropped, so the
/// service is running again on every exit path.
pub struct ServiceGuard<'a> {
    compose: &'a ComposeCli,
    service: String,
}

impl<'a> ServiceGuard<'a> {
    pub fn stop(compose: &'a ComposeCli, service: &str) -> Result<Self> {
        compose.stop(service)?;
        Ok(Self {
            compose,
            service: service.to_string(),
        })
    }
}

impl Drop for ServiceGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.compose.start(&self.service) {
            warn!("Failed to restart '{}' service: {e:#}", self.service);
        }
    }
}
