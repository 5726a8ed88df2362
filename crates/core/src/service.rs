//! Service control through the system's process manager
//!
//! Queries and actions shell out to `systemctl`. The tray never talks to
//! systemd directly; it only sees `ServiceState` and `ServiceError`.
use std::fmt;
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Running state as reported by `systemctl is-active`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Active,
    Inactive,
}

impl ServiceState {
    /// Only the exact word `active` counts; `activating`, `failed`, etc. do not
    pub fn from_is_active_output(stdout: &str) -> Self {
        if stdout.trim() == "active" {
            ServiceState::Active
        } else {
            ServiceState::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == ServiceState::Active
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Active => write!(f, "active"),
            ServiceState::Inactive => write!(f, "inactive"),
        }
    }
}

/// A user-requested change of service state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    /// `systemctl` verb for this action
    pub fn verb(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            ServiceAction::Start => "started",
            ServiceAction::Stop => "stopped",
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to {action} {unit}: {status}")]
    CommandFailed {
        action: &'static str,
        unit: String,
        status: ExitStatus,
    },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Everything the tray needs from a service manager
pub trait ServiceManager: Send + Sync {
    /// Unit being managed, for log messages
    fn unit(&self) -> &str;

    /// Query the current state; query failures read as inactive
    fn is_active(&self) -> ServiceState;

    fn start(&self) -> Result<(), ServiceError>;

    fn stop(&self) -> Result<(), ServiceError>;

    fn perform(&self, action: ServiceAction) -> Result<(), ServiceError> {
        match action {
            ServiceAction::Start => self.start(),
            ServiceAction::Stop => self.stop(),
        }
    }
}

/// `systemctl`-backed service manager
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: String,
    unit: String,
}

impl Systemctl {
    pub fn new(unit: impl Into<String>) -> Self {
        Self::with_program("systemctl", unit)
    }

    /// Use a different executable in place of `systemctl`
    pub fn with_program(program: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            unit: unit.into(),
        }
    }

    fn command(&self, verb: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(verb).arg(&self.unit);
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> ServiceError {
        ServiceError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn run_action(&self, action: ServiceAction) -> Result<(), ServiceError> {
        let status = self
            .command(action.verb())
            .stdin(Stdio::null())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        if status.success() {
            info!("{} {}.", self.unit, action.past_tense());
            Ok(())
        } else {
            Err(ServiceError::CommandFailed {
                action: action.verb(),
                unit: self.unit.clone(),
                status,
            })
        }
    }
}

impl ServiceManager for Systemctl {
    fn unit(&self) -> &str {
        &self.unit
    }

    fn is_active(&self) -> ServiceState {
        // is-active exits non-zero for inactive units, so only stdout matters
        let output = self
            .command("is-active")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                debug!("{} is-active {}: {}", self.program, self.unit, stdout.trim());
                ServiceState::from_is_active_output(&stdout)
            }
            Err(e) => {
                error!("Error checking service status: {}", self.spawn_error(e));
                ServiceState::Inactive
            }
        }
    }

    fn start(&self) -> Result<(), ServiceError> {
        self.run_action(ServiceAction::Start)
    }

    fn stop(&self) -> Result<(), ServiceError> {
        self.run_action(ServiceAction::Stop)
    }
}

/// Run `action` on a worker thread so the GTK loop keeps responding.
///
/// The result is only logged; the next poll picks up the new state.
pub fn invoke<S>(manager: Arc<S>, action: ServiceAction) -> std::thread::JoinHandle<()>
where
    S: ServiceManager + ?Sized + 'static,
{
    info!("Requested {} of {}", action.verb(), manager.unit());
    std::thread::spawn(move || {
        if let Err(e) = manager.perform(action) {
            error!("{}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_is_active_output_mapping() {
        assert_eq!(
            ServiceState::from_is_active_output("active\n"),
            ServiceState::Active
        );
        assert_eq!(
            ServiceState::from_is_active_output("  active  "),
            ServiceState::Active
        );
        for other in ["inactive\n", "failed\n", "activating\n", "unknown", ""] {
            assert_eq!(
                ServiceState::from_is_active_output(other),
                ServiceState::Inactive,
                "{other:?} should read as inactive"
            );
        }
    }

    #[test]
    fn test_command_line() {
        let systemctl = Systemctl::new("nginx.service");
        let cmd = systemctl.command("is-active");
        assert_eq!(cmd.get_program(), "systemctl");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["is-active", "nginx.service"]);
    }

    #[test]
    fn test_successful_action() {
        let manager = Systemctl::with_program("true", "demo");
        assert!(manager.start().is_ok());
        assert!(manager.stop().is_ok());
    }

    #[test]
    fn test_failed_action() {
        let manager = Systemctl::with_program("false", "demo");
        match manager.stop() {
            Err(ServiceError::CommandFailed { action, unit, status }) => {
                assert_eq!(action, "stop");
                assert_eq!(unit, "demo");
                assert!(!status.success());
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_program() {
        let manager = Systemctl::with_program("/nonexistent/systemctl", "demo");
        assert!(matches!(manager.start(), Err(ServiceError::Spawn { .. })));
        // query failures never propagate
        assert_eq!(manager.is_active(), ServiceState::Inactive);
    }

    #[test]
    fn test_empty_output_is_inactive() {
        // `true` prints nothing and exits 0
        let manager = Systemctl::with_program("true", "demo");
        assert_eq!(manager.is_active(), ServiceState::Inactive);
    }

    #[derive(Default)]
    struct RecordingManager {
        calls: Mutex<Vec<ServiceAction>>,
    }

    impl ServiceManager for RecordingManager {
        fn unit(&self) -> &str {
            "recording"
        }

        fn is_active(&self) -> ServiceState {
            ServiceState::Inactive
        }

        fn start(&self) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(ServiceAction::Start);
            Ok(())
        }

        fn stop(&self) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(ServiceAction::Stop);
            Err(ServiceError::Spawn {
                program: "recording".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    #[test]
    fn test_invoke_runs_on_worker_thread() {
        let manager = Arc::new(RecordingManager::default());

        invoke(Arc::clone(&manager), ServiceAction::Start)
            .join()
            .unwrap();
        // failures are logged, not panicked
        invoke(Arc::clone(&manager), ServiceAction::Stop)
            .join()
            .unwrap();

        let calls = manager.calls.lock().unwrap();
        assert_eq!(*calls, [ServiceAction::Start, ServiceAction::Stop]);
    }
}
