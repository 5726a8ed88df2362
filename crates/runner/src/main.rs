//! service-indicator - System Tray Process
//!
//! This process manages:
//! - Tray icon reflecting whether the configured service is active
//! - Context menu with Start / Stop / Quit
//! - Periodic `systemctl is-active` polling on a GLib timer
//! - Quit confirmation dialog

use anyhow::{Context, Result};
use clap::Parser;
use gtk::glib::{self, ControlFlow};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use service_indicator_core::{
    config::{self, IndicatorConfig, MessagesSection},
    dialog,
    indicator::{IconSet, StatusPoller},
    service::{self, ServiceAction, ServiceManager, Systemctl},
    tray_icon::{MenuAction, TrayIconManager},
};

#[derive(Debug, Parser)]
#[command(name = "service-indicator", version, about = "Tray indicator for a systemd service")]
struct Cli {
    /// Configuration file (defaults to service-indicator.ini next to the
    /// executable, then the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the service state once and exit without creating a tray icon
    #[arg(long)]
    check: bool,
}

type Poller = StatusPoller<dyn ServiceManager>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match load(cli.config) {
        Ok(config) => config,
        Err(e) => {
            // Config problems are reported on stdout with a fixed message
            println!("{}", e);
            std::process::exit(1);
        }
    };

    let manager: Arc<dyn ServiceManager> = Arc::new(Systemctl::new(&config.service.name));

    if cli.check {
        println!("{}", manager.is_active());
        return Ok(());
    }

    tracing::info!("service-indicator starting for '{}'", config.service.name);
    run_tray(&config, manager)?;
    tracing::info!("service-indicator shutting down");

    Ok(())
}

fn load(explicit: Option<PathBuf>) -> Result<IndicatorConfig, config::ConfigError> {
    let path = config::resolve_config_path(explicit)?;
    tracing::info!("Loading configuration from {:?}", path);
    config::load_config(&path)
}

/// Build the tray, arm the poll timer and run the GTK main loop until quit
fn run_tray(config: &IndicatorConfig, manager: Arc<dyn ServiceManager>) -> Result<()> {
    gtk::init().context("Failed to initialize GTK")?;

    let icons = IconSet::load(&config.icons).context("Failed to load tray icons")?;

    let messages = config.messages.clone();
    let action_manager = Arc::clone(&manager);
    let tray = TrayIconManager::new(config, icons, move |action| {
        handle_menu_action(action, &action_manager, &messages)
    });

    let tray = Rc::new(RefCell::new(tray));
    let poller: Rc<RefCell<Poller>> = Rc::new(RefCell::new(StatusPoller::new(manager)));

    // First poll right away, then every update_delay seconds
    refresh(&poller, &tray);
    glib::timeout_add_seconds_local(config.service.update_delay, move || {
        refresh(&poller, &tray);
        ControlFlow::Continue
    });

    tracing::info!("Tray ready, entering GTK main loop");
    gtk::main();

    Ok(())
}

/// Poll the service once and push the result into the tray
fn refresh(poller: &Rc<RefCell<Poller>>, tray: &Rc<RefCell<TrayIconManager>>) {
    let state = poller.borrow_mut().poll();
    tray.borrow_mut().apply_state(state);
}

fn handle_menu_action(
    action: MenuAction,
    manager: &Arc<dyn ServiceManager>,
    messages: &MessagesSection,
) {
    match action {
        MenuAction::Start => {
            service::invoke(Arc::clone(manager), ServiceAction::Start);
        }
        MenuAction::Stop => {
            service::invoke(Arc::clone(manager), ServiceAction::Stop);
        }
        MenuAction::Quit => {
            tracing::info!("Quit menu clicked");
            if dialog::confirm_quit(&messages.quit_primary, &messages.quit_secondary) {
                gtk::main_quit();
            }
        }
    }
}
