/// Tray indicator and context menu for the watched service
///
/// Drives libappindicator directly so the configured indicator id and the
/// icon descriptions reach the panel. Everything in here must run on the
/// GTK main thread after `gtk::init()`.
use crate::config::IndicatorConfig;
use crate::indicator::{IconSet, MenuState, StateIcon};
use crate::service::ServiceState;
use gtk::prelude::*;
use libappindicator::{AppIndicator, AppIndicatorStatus};
use std::rc::Rc;

/// What a menu click asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Stop,
    Quit,
}

/// Changes to push into the indicator after a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayUpdate<'a> {
    pub menu: MenuState,
    /// `None` when the icon already matches the state
    pub icon: Option<&'a StateIcon>,
}

/// Decide what to show for `state`, given the state currently on screen.
///
/// Enablement is always re-applied; the icon only on a state change.
pub fn plan_update(
    shown: Option<ServiceState>,
    state: ServiceState,
    icons: &IconSet,
) -> TrayUpdate<'_> {
    TrayUpdate {
        menu: MenuState::from(state),
        icon: (shown != Some(state)).then(|| icons.for_state(state)),
    }
}

/// Owns the indicator and the Start/Stop items whose enablement tracks the service
pub struct TrayIconManager {
    indicator: AppIndicator,
    // the indicator only borrows the menu; keep it alive here
    _menu: gtk::Menu,
    start_item: gtk::MenuItem,
    stop_item: gtk::MenuItem,
    icons: IconSet,
    shown_state: Option<ServiceState>,
}

impl TrayIconManager {
    /// Create the indicator showing the inactive icon until the first poll.
    ///
    /// `on_action` runs on the GTK thread for every menu click.
    pub fn new<F>(config: &IndicatorConfig, icons: IconSet, on_action: F) -> Self
    where
        F: Fn(MenuAction) + 'static,
    {
        let messages = &config.messages;
        let on_action = Rc::new(on_action);

        tracing::info!("Creating indicator '{}'", config.service.indicator_id);

        let mut menu = gtk::Menu::new();
        let start_item = gtk::MenuItem::with_label(&messages.start);
        let stop_item = gtk::MenuItem::with_label(&messages.stop);
        let quit_item = gtk::MenuItem::with_label(&messages.quit);

        for (item, action) in [
            (&start_item, MenuAction::Start),
            (&stop_item, MenuAction::Stop),
            (&quit_item, MenuAction::Quit),
        ] {
            let on_action = Rc::clone(&on_action);
            item.connect_activate(move |_| {
                tracing::debug!("Menu item activated: {:?}", action);
                (*on_action)(action)
            });
        }

        menu.append(&start_item);
        menu.append(&stop_item);
        menu.append(&gtk::SeparatorMenuItem::new());
        menu.append(&quit_item);
        menu.show_all();

        let initial = icons.for_state(ServiceState::Inactive);
        let mut indicator = AppIndicator::new(&config.service.indicator_id, &initial.path_str());
        indicator.set_status(AppIndicatorStatus::Active);
        indicator.set_menu(&mut menu);

        tracing::info!("Indicator created with context menu");

        Self {
            indicator,
            _menu: menu,
            start_item,
            stop_item,
            icons,
            shown_state: None,
        }
    }

    /// Reflect `state` in the menu and icon
    pub fn apply_state(&mut self, state: ServiceState) {
        let update = plan_update(self.shown_state, state, &self.icons);
        self.start_item.set_sensitive(update.menu.start_enabled);
        self.stop_item.set_sensitive(update.menu.stop_enabled);

        if let Some(icon) = update.icon {
            self.indicator.set_icon_full(&icon.path_str(), &icon.description);
            tracing::debug!("Indicator icon set to '{}'", icon.description);
        }
        self.shown_state = Some(state);
    }
}
