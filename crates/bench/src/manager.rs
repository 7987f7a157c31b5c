//! Lifecycle of the two benchmark servers
//!
//! Spawns `texdit-server` once per architecture (unless one is already
//! answering), waits for each to report healthy, and tears down whatever it
//! started.

use crate::client::ServerClient;
use crate::monitor::{HealthMonitor, ServerStatus};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use texdit_common::config::BenchConfig;
use texdit_common::{ArchitectureMode, Result, TexditError};
use tokio::process::{Child, Command};
use tracing::{error, info, warn};

/// Grace period between interrupt and kill
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// One architecture's server as seen by the manager
struct ManagedServer {
    mode: ArchitectureMode,
    client: ServerClient,
    config_path: Option<PathBuf>,
    startup: Duration,
    child: Option<Child>,
}

pub struct ServerManager {
    binary: PathBuf,
    health_interval: Duration,
    max_attempts: u32,
    specialized: ManagedServer,
    single_llm: ManagedServer,
}

impl ServerManager {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        Ok(Self {
            binary: config.server_binary.clone(),
            health_interval: config.health_interval(),
            max_attempts: config.max_health_attempts,
            specialized: ManagedServer {
                mode: ArchitectureMode::Specialized,
                client: ServerClient::new(&config.specialized_url)?,
                config_path: config.specialized_config.clone(),
                startup: Duration::from_secs(config.specialized_startup_secs),
                child: None,
            },
            single_llm: ManagedServer {
                mode: ArchitectureMode::SingleLlm,
                client: ServerClient::new(&config.single_llm_url)?,
                config_path: config.single_llm_config.clone(),
                startup: Duration::from_secs(config.single_llm_startup_secs),
                child: None,
            },
        })
    }

    pub async fn start_specialized(&mut self) -> bool {
        let (binary, interval, attempts) = (self.binary.clone(), self.health_interval, self.max_attempts);
        start(&binary, interval, attempts, &mut self.specialized).await
    }

    pub async fn start_single_llm(&mut self) -> bool {
        let (binary, interval, attempts) = (self.binary.clone(), self.health_interval, self.max_attempts);
        start(&binary, interval, attempts, &mut self.single_llm).await
    }

    /// Stop every server this manager spawned
    pub async fn stop_all(&mut self) {
        info!("Stopping servers...");
        for server in [&mut self.specialized, &mut self.single_llm] {
            if let Some(child) = server.child.take() {
                stop(server.mode, child).await;
            }
        }
    }
}

/// Reuse a healthy server or spawn one and wait for it; true when it is up
async fn start(
    binary: &Path,
    interval: Duration,
    max_attempts: u32,
    server: &mut ManagedServer,
) -> bool {
    info!("Starting {} server...", server.mode);

    if server.client.health_check().await {
        info!("{} server already running at {}", server.mode, server.client.base_url());
        return true;
    }

    let spawned = server_command(binary, server.mode, server.config_path.as_deref())
        .spawn()
        .map_err(|e| {
            TexditError::internal(format!("Failed to spawn {}: {}", binary.display(), e))
        });
    let child = match spawned {
        Ok(child) => child,
        Err(e) => {
            error!("Failed to start {} server: {}", server.mode, e);
            return false;
        }
    };
    server.child = Some(child);

    let mut monitor = HealthMonitor::new(server.client.clone(), interval, max_attempts);
    match monitor.wait_until_ready(server.startup).await {
        ServerStatus::Connected => {
            info!(
                "{} server started successfully at {}",
                server.mode,
                server.client.base_url()
            );
            true
        }
        status => {
            error!(
                "{} server failed to start within {:?} (status {:?})",
                server.mode, server.startup, status
            );
            if let Some(child) = server.child.take() {
                stop(server.mode, child).await;
            }
            false
        }
    }
}

/// Command for one server. The manager's own `TEXDIT_CONFIG` is never passed
/// through, and `TEXDIT__MODE` outranks any `mode:` in the server's file.
fn server_command(binary: &Path, mode: ArchitectureMode, config: Option<&Path>) -> Command {
    let mut command = Command::new(binary);
    command
        .env("TEXDIT_MODE", mode.as_str())
        .env("TEXDIT__MODE", mode.as_str())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    match config {
        Some(config) => command.env("TEXDIT_CONFIG", config),
        None => command.env_remove("TEXDIT_CONFIG"),
    };

    command
}

/// Send SIGINT; false when `kill` could not be run or reported failure
async fn interrupt(pid: u32) -> bool {
    match Command::new("kill")
        .arg("-INT")
        .arg(pid.to_string())
        .status()
        .await
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!("kill -INT {} exited with {}", pid, status);
            false
        }
        Err(e) => {
            warn!("Could not run kill for pid {}: {}", pid, e);
            false
        }
    }
}

/// Interrupt, wait up to `STOP_TIMEOUT`, then kill; true when it exited on the interrupt
async fn stop(mode: ArchitectureMode, mut child: Child) -> bool {
    // SIGINT reaches the server's Ctrl-C shutdown path
    let interrupted = match child.id() {
        Some(pid) => interrupt(pid).await,
        None => false,
    };

    if interrupted {
        if let Ok(Ok(_)) = tokio::time::timeout(STOP_TIMEOUT, child.wait()).await {
            info!("{} server stopped", mode);
            return true;
        }
    }

    match child.kill().await {
        Ok(()) => warn!("{} server force killed", mode),
        Err(e) => error!("Failed to stop {} server: {}", mode, e),
    }
    false
}
