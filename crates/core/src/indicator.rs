//! Presenter state: what the tray should show for a given service state
use crate::config::{IconSpec, IconsSection};
use crate::service::{ServiceManager, ServiceState};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Which service actions are offered in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl From<ServiceState> for MenuState {
    fn from(state: ServiceState) -> Self {
        // Only the action that changes the state is offered
        let active = state.is_active();
        MenuState {
            start_enabled: !active,
            stop_enabled: active,
        }
    }
}

#[derive(Debug, Error)]
pub enum IconError {
    #[error("Icon file {} does not exist", .path.display())]
    Missing { path: PathBuf },
}

/// Icon path handed to appindicator as-is, so any format it loads (PNG, SVG, ...) works
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateIcon {
    pub path: PathBuf,
    pub description: String,
}

impl StateIcon {
    fn from_spec(spec: &IconSpec) -> Result<Self, IconError> {
        if !spec.path.is_file() {
            return Err(IconError::Missing {
                path: spec.path.clone(),
            });
        }
        Ok(Self {
            path: spec.path.clone(),
            description: spec.description.clone(),
        })
    }

    /// Path as the string appindicator expects
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Icons for both service states, checked once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    pub active: StateIcon,
    pub inactive: StateIcon,
}

impl IconSet {
    pub fn load(icons: &IconsSection) -> Result<Self, IconError> {
        Ok(Self {
            active: StateIcon::from_spec(&icons.active)?,
            inactive: StateIcon::from_spec(&icons.inactive)?,
        })
    }

    pub fn for_state(&self, state: ServiceState) -> &StateIcon {
        match state {
            ServiceState::Active => &self.active,
            ServiceState::Inactive => &self.inactive,
        }
    }
}

/// Polls a service manager and remembers the last observed state
pub struct StatusPoller<S: ServiceManager + ?Sized> {
    manager: Arc<S>,
    last_state: Option<ServiceState>,
}

impl<S: ServiceManager + ?Sized> StatusPoller<S> {
    pub fn new(manager: Arc<S>) -> Self {
        Self {
            manager,
            last_state: None,
        }
    }

    /// Query the manager once
    pub fn poll(&mut self) -> ServiceState {
        let state = self.manager.is_active();
        debug!("Polled {}: {}", self.manager.unit(), state);

        if self.last_state != Some(state) {
            info!("{} is now {}", self.manager.unit(), state);
            self.last_state = Some(state);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use std::sync::Mutex;

    /// Replays a scripted sequence of states, then repeats the last one
    struct ScriptedManager {
        states: Mutex<Vec<ServiceState>>,
        polls: Mutex<usize>,
    }

    impl ScriptedManager {
        fn new(mut states: Vec<ServiceState>) -> Self {
            states.reverse();
            Self {
                states: Mutex::new(states),
                polls: Mutex::new(0),
            }
        }
    }

    impl ServiceManager for ScriptedManager {
        fn unit(&self) -> &str {
            "scripted"
        }

        fn is_active(&self) -> ServiceState {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            if states.len() > 1 {
                states.pop().unwrap()
            } else {
                states[0]
            }
        }

        fn start(&self) -> Result<(), ServiceError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[test]
    fn test_menu_state_for_active_service() {
        let menu = MenuState::from(ServiceState::Active);
        assert!(!menu.start_enabled);
        assert!(menu.stop_enabled);
    }

    #[test]
    fn test_menu_state_for_inactive_service() {
        let menu = MenuState::from(ServiceState::Inactive);
        assert!(menu.start_enabled);
        assert!(!menu.stop_enabled);
    }

    #[test]
    fn test_poller_tracks_transitions() {
        use ServiceState::*;
        let manager = Arc::new(ScriptedManager::new(vec![Inactive, Active, Active, Inactive]));
        let mut poller = StatusPoller::new(Arc::clone(&manager));

        assert_eq!(poller.last_state, None);
        assert_eq!(poller.poll(), Inactive);
        assert_eq!(poller.poll(), Active);
        assert_eq!(poller.poll(), Active);
        assert_eq!(poller.last_state, Some(Active));
        assert_eq!(poller.poll(), Inactive);
        assert_eq!(poller.poll(), Inactive);

        // every poll hits the manager, even without a state change
        assert_eq!(*manager.polls.lock().unwrap(), 5);
    }

    #[test]
    fn test_poller_over_trait_object() {
        let manager: Arc<dyn ServiceManager> =
            Arc::new(ScriptedManager::new(vec![ServiceState::Active]));
        let mut poller = StatusPoller::new(manager);
        assert!(poller.poll().is_active());
        assert_eq!(poller.manager.unit(), "scripted");
    }

    fn icons_section(dir: &std::path::Path, active: &str, inactive: &str) -> IconsSection {
        IconsSection {
            active: IconSpec {
                path: dir.join(active),
                description: "running".to_string(),
            },
            inactive: IconSpec {
                path: dir.join(inactive),
                description: "stopped".to_string(),
            },
        }
    }

    #[test]
    fn test_icon_set_accepts_svg_and_png_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("on.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect width="16" height="16" fill="green"/></svg>"#,
        )
        .unwrap();
        // contents are never decoded here
        std::fs::write(dir.path().join("off.png"), b"not really a png").unwrap();

        let icons = IconSet::load(&icons_section(dir.path(), "on.svg", "off.png")).unwrap();
        assert_eq!(icons.for_state(ServiceState::Active).path, dir.path().join("on.svg"));
        assert_eq!(icons.for_state(ServiceState::Active).description, "running");
        assert_eq!(icons.for_state(ServiceState::Inactive).description, "stopped");
    }

    #[test]
    fn test_icon_set_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("on.svg"), "<svg/>").unwrap();

        let err = IconSet::load(&icons_section(dir.path(), "on.svg", "gone.png")).unwrap_err();
        assert!(matches!(err, IconError::Missing { path } if path.ends_with("gone.png")));
    }
}
