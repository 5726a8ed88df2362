//! Service Indicator Core Library
//!
//! Shared functionality for the tray runner
//!
//! Architecture:
//! - `config` reads the INI file describing the watched service
//! - `service` queries and controls the service through `systemctl`
//! - `indicator` turns polled states into menu state and icons
//! - `tray_icon` and `dialog` own everything GTK-side

pub mod config;
pub mod dialog;
pub mod indicator;
pub mod service;
pub mod tray_icon;
