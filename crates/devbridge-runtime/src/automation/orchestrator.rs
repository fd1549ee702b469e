//! Automation server lifecycle and app control.
//!
//! State machine of [`AutomationServerInstance::readiness`]:
//! `Starting → Ready`, `Starting → Failed`, and `Stopped` from any state.

use std::sync::Arc;

use async_trait::async_trait;
use devbridge_core::{
    AutomationServerInstance, DeviceKind, DeviceList, LogSink, NoopLogSink, ProcessRecord,
    ProcessStatus, RemoteControlClient, ServerReadiness, SessionTarget, StreamKind,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::AutomationConfig;
use super::error::AutomationError;
use super::ports::{PortPolicy, negotiate_port};
use super::readiness::is_ready_line;
use super::session::connect_with_retry;
use crate::devices::{AndroidBridge, DeviceHub, InvokeOptions};
use crate::process::{DrainContext, DrainSummary, LineWatch, ProcessSupervisor, spawn_drain};

/// Key code of the menu key, used to wake and unlock a booted device.
const KEYCODE_MENU: u32 = 82;

/// Work to run while an app is open during [`AutomationOrchestrator::run_app_session`].
#[async_trait]
pub trait AppScript: Send {
    async fn run(
        &mut self,
        orchestrator: &AutomationOrchestrator,
        serial: &str,
    ) -> Result<(), AutomationError>;
}

struct RunningServer {
    supervisor: ProcessSupervisor,
    drains: Vec<JoinHandle<DrainSummary>>,
    cancel: CancellationToken,
}

/// Starts the automation server, waits for devices, and opens sessions.
pub struct AutomationOrchestrator {
    config: AutomationConfig,
    hub: DeviceHub,
    sink: Arc<dyn LogSink>,
    server: Option<RunningServer>,
    instance: AutomationServerInstance,
}

impl std::fmt::Debug for AutomationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationOrchestrator")
            .field("config", &self.config)
            .field("instance", &self.instance)
            .field("running", &self.server.is_some())
            .finish_non_exhaustive()
    }
}

impl AutomationOrchestrator {
    pub fn new(config: AutomationConfig, hub: DeviceHub) -> Self {
        let instance = AutomationServerInstance {
            port: config.preferred_port,
            process: ProcessRecord::default(),
            readiness: ServerReadiness::Stopped,
        };
        Self {
            config,
            hub,
            sink: Arc::new(NoopLogSink),
            server: None,
            instance,
        }
    }

    /// Route drained server output to `sink`.
    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub const fn config(&self) -> &AutomationConfig {
        &self.config
    }

    pub const fn hub(&self) -> &DeviceHub {
        &self.hub
    }

    fn bridge(&self) -> &AndroidBridge {
        self.hub.android()
    }

    /// Snapshot of the server instance.
    pub fn instance(&self) -> AutomationServerInstance {
        let mut instance = self.instance.clone();
        if let Some(server) = &self.server {
            instance.process = server.supervisor.info();
        }
        instance
    }

    pub const fn readiness(&self) -> ServerReadiness {
        self.instance.readiness
    }

    /// Negotiated port, or the preferred port before the first start.
    pub const fn port(&self) -> u16 {
        self.instance.port
    }

    /// Record of the most recent server process.
    pub fn last_process(&self) -> ProcessRecord {
        self.instance().process
    }

    pub fn invoke_options(&self, serial: Option<&str>) -> InvokeOptions {
        InvokeOptions {
            install_dir: self.config.install_dir.clone(),
            serial: serial.map(str::to_string),
        }
    }

    /// Start the server and wait for its readiness marker. Returns the port.
    pub async fn start_server(&mut self) -> Result<u16, AutomationError> {
        if let Some(server) = self.server.as_mut() {
            if server.supervisor.is_running() {
                return Err(AutomationError::AlreadyRunning {
                    port: self.instance.port,
                });
            }
            self.stop_server().await;
        }

        self.instance.readiness = ServerReadiness::Starting;
        let result = self.launch().await;
        match result {
            Ok(ready) => match self.await_readiness(ready).await {
                Ok(()) => {
                    self.instance.readiness = ServerReadiness::Ready;
                    info!(port = %self.instance.port, "automation server ready");
                    Ok(self.instance.port)
                }
                Err(e) => {
                    warn!(port = %self.instance.port, error = %e, "automation server failed to start");
                    self.stop_server().await;
                    self.instance.readiness = ServerReadiness::Failed;
                    Err(e)
                }
            },
            Err(e) => {
                self.instance.readiness = ServerReadiness::Failed;
                Err(e)
            }
        }
    }

    async fn launch(&mut self) -> Result<watch::Receiver<bool>, AutomationError> {
        let policy = PortPolicy {
            scan_span: self.config.port_scan_span,
            wait: self.config.port_wait,
            poll_interval: self.config.port_poll_interval,
        };
        let port = negotiate_port(self.config.preferred_port, policy).await?;
        self.instance.port = port;
        info!(port = %port, "using automation server port");

        let overlay = self
            .bridge()
            .provisioner()
            .setup_environment(self.config.install_dir.as_deref(), None)
            .await?;

        let mut supervisor = ProcessSupervisor::new()
            .with_env(overlay.vars())
            .with_stop_grace(self.config.stop_grace);
        let port_arg = port.to_string();
        let streams = supervisor.start(&self.config.server_binary, ["--port", port_arg.as_str()])?;

        let cancel = CancellationToken::new();
        let source = format!("{}:{port}", self.config.server_binary);
        let (line_watch, ready) = LineWatch::new(is_ready_line);
        let drains = vec![
            spawn_drain(
                streams.stdout,
                DrainContext {
                    source: source.clone(),
                    kind: StreamKind::Stdout,
                    sink: Arc::clone(&self.sink),
                    watch: Some(line_watch),
                    cancel: cancel.clone(),
                },
            ),
            spawn_drain(
                streams.stderr,
                DrainContext {
                    source,
                    kind: StreamKind::Stderr,
                    sink: Arc::clone(&self.sink),
                    watch: None,
                    cancel: cancel.clone(),
                },
            ),
        ];

        self.server = Some(RunningServer {
            supervisor,
            drains,
            cancel,
        });
        Ok(ready)
    }

    async fn await_readiness(&mut self, ready: watch::Receiver<bool>) -> Result<(), AutomationError> {
        let port = self.instance.port;
        let deadline = Instant::now() + self.config.startup_timeout;
        loop {
            if *ready.borrow() {
                return Ok(());
            }
            if let Some(server) = self.server.as_mut() {
                if !server.supervisor.is_running() {
                    return Err(AutomationError::ServerExited {
                        port,
                        status: server.supervisor.info().status,
                    });
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::StartupTimeout {
                    port,
                    timeout: self.config.startup_timeout,
                });
            }
            sleep(self.config.readiness_poll_interval.min(deadline - now)).await;
        }
    }

    /// Stop the server and join its drain tasks.
    ///
    /// Never fails; returns `false` when no server was held.
    pub async fn stop_server(&mut self) -> bool {
        let Some(mut server) = self.server.take() else {
            return false;
        };

        let stopped = server.supervisor.stop().await;
        // Grandchildren may still hold the pipes open.
        server.cancel.cancel();
        for drain in server.drains {
            match drain.await {
                Ok(summary) => debug!(lines = summary.lines, cancelled = summary.cancelled, "drain joined"),
                Err(e) => debug!(error = %e, "drain task ended abnormally"),
            }
        }

        self.instance.process = server.supervisor.info();
        self.instance.readiness = ServerReadiness::Stopped;
        info!(port = %self.instance.port, killed = stopped, "automation server stopped");
        true
    }

    /// Resolve once the held server process exits on its own.
    ///
    /// Returns `None` immediately when no server is held.
    pub async fn wait_for_server_exit(&mut self) -> Option<ProcessStatus> {
        loop {
            let server = self.server.as_mut()?;
            if !server.supervisor.is_running() {
                let status = server.supervisor.info().status;
                warn!(port = %self.instance.port, ?status, "automation server exited");
                return Some(status);
            }
            sleep(self.config.readiness_poll_interval).await;
        }
    }

    /// Poll until the device reports boot completion.
    pub async fn wait_for_device_ready(&self, serial: Option<&str>) -> Result<(), AutomationError> {
        let options = self.invoke_options(serial);
        let deadline = Instant::now() + self.config.device_timeout;
        loop {
            match self.bridge().boot_completed(&options).await {
                Ok(true) => {
                    if self.config.keep_alive {
                        if let Err(e) = self.bridge().send_keyevent(KEYCODE_MENU, &options).await {
                            debug!(error = %e, "keep-alive key event failed");
                        }
                    }
                    info!(serial = ?serial, "device ready");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!(serial = ?serial, error = %e, "boot probe failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::DeviceNotReady {
                    device: serial.unwrap_or("<default>").to_string(),
                    timeout: self.config.device_timeout,
                });
            }
            sleep(self.config.device_poll_interval.min(deadline - now)).await;
        }
    }

    /// Wait for the device, then open a remote-control session on the server port.
    pub async fn get_driver<C>(
        &self,
        client: &C,
        capabilities: serde_json::Value,
        serial: Option<&str>,
    ) -> Result<C::Session, AutomationError>
    where
        C: RemoteControlClient + ?Sized,
    {
        self.wait_for_device_ready(serial).await?;
        let target = SessionTarget::local(self.instance.port, capabilities);
        connect_with_retry(
            client,
            &target,
            self.config.connect_attempts,
            self.config.connect_retry_delay,
        )
        .await
    }

    pub async fn open_app(&self, package: &str, serial: Option<&str>) -> Result<(), AutomationError> {
        let options = self.invoke_options(serial);
        let output = self
            .bridge()
            .invoke(
                &options,
                [
                    "shell",
                    "monkey",
                    "-p",
                    package,
                    "-c",
                    "android.intent.category.LAUNCHER",
                    "1",
                ],
            )
            .await?;
        check_app_output("open", package, output)
    }

    pub async fn close_app(&self, package: &str, serial: Option<&str>) -> Result<(), AutomationError> {
        let options = self.invoke_options(serial);
        let output = self
            .bridge()
            .invoke(&options, ["shell", "am", "force-stop", package])
            .await?;
        check_app_output("close", package, output)
    }

    /// Open `package`, run `script` (or wait for the app to settle), close it.
    ///
    /// Uses `serial` or the first listed device. The server is always
    /// stopped before returning.
    pub async fn run_app_session(
        &mut self,
        package: &str,
        serial: Option<&str>,
        script: Option<&mut dyn AppScript>,
    ) -> Result<(), AutomationError> {
        let devices = self
            .hub
            .list_devices(DeviceKind::Android, &self.invoke_options(None))
            .await?;
        let serial = select_serial(&devices, serial)?;

        let result = self.app_session_body(package, &serial, script).await;
        self.stop_server().await;
        result
    }

    async fn app_session_body(
        &mut self,
        package: &str,
        serial: &str,
        script: Option<&mut dyn AppScript>,
    ) -> Result<(), AutomationError> {
        self.start_server().await?;
        self.open_app(package, Some(serial)).await?;
        match script {
            Some(script) => script.run(self, serial).await?,
            None => sleep(self.config.app_settle_delay).await,
        }
        self.close_app(package, Some(serial)).await?;
        sleep(self.config.app_close_delay).await;
        Ok(())
    }
}

fn check_app_output(action: &'static str, package: &str, output: String) -> Result<(), AutomationError> {
    if output.to_lowercase().contains("error") {
        return Err(AutomationError::AppControl {
            action,
            package: package.to_string(),
            output: output.trim().to_string(),
        });
    }
    Ok(())
}

fn select_serial(devices: &DeviceList, requested: Option<&str>) -> Result<String, AutomationError> {
    if devices.is_empty() {
        return Err(AutomationError::NoDevices {
            kind: DeviceKind::Android,
        });
    }
    requested
        .map(str::to_string)
        .or_else(|| devices.keys().next().cloned())
        .ok_or(AutomationError::NoDevices {
            kind: DeviceKind::Android,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ToolchainProvisioner;

    #[test]
    fn app_output_with_error_fails() {
        let err = check_app_output("open", "com.example", "** Error: no activities".to_string())
            .unwrap_err();
        assert!(matches!(err, AutomationError::AppControl { action: "open", .. }));
        assert!(check_app_output("close", "com.example", String::new()).is_ok());
        assert!(check_app_output("open", "com.example", "Events injected: 1".to_string()).is_ok());
    }

    #[test]
    fn serial_selection() {
        let mut devices = DeviceList::new();
        assert!(matches!(
            select_serial(&devices, Some("x")),
            Err(AutomationError::NoDevices { .. })
        ));

        devices.insert("emulator-5554".to_string(), "device".to_string());
        devices.insert("R58M".to_string(), "device".to_string());
        assert_eq!(select_serial(&devices, None).unwrap(), "emulator-5554");
        assert_eq!(select_serial(&devices, Some("R58M")).unwrap(), "R58M");
    }

    #[test]
    fn default_serial_ignores_daemon_notices_before_header() {
        let devices = crate::devices::parse_device_list(
            "* daemon not running; starting now at tcp:5037\n\
             * daemon started successfully\n\
             List of devices attached\n\
             emulator-5554\tdevice\n",
        );
        assert_eq!(select_serial(&devices, None).unwrap(), "emulator-5554");
    }

    #[tokio::test]
    async fn fresh_orchestrator_is_stopped() {
        let mut orchestrator =
            AutomationOrchestrator::new(AutomationConfig::default(), DeviceHub::new(ToolchainProvisioner::new()));
        assert_eq!(orchestrator.readiness(), ServerReadiness::Stopped);
        assert_eq!(orchestrator.port(), 4723);
        assert!(!orchestrator.stop_server().await);
        assert!(!orchestrator.stop_server().await);
        assert_eq!(orchestrator.wait_for_server_exit().await, None);
    }
}
