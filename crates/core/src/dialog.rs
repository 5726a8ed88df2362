//! Quit confirmation prompt
use gtk::prelude::*;
use gtk::{ButtonsType, DialogFlags, MessageDialog, MessageType, ResponseType};

/// Ask the user to confirm quitting.
///
/// Blocks in a nested GTK loop until the dialog is answered. Only "Yes"
/// confirms; closing the dialog counts as "No".
pub fn confirm_quit(primary: &str, secondary: &str) -> bool {
    let dialog = MessageDialog::new(
        None::<&gtk::Window>,
        DialogFlags::MODAL,
        MessageType::Question,
        ButtonsType::YesNo,
        primary,
    );
    dialog.set_secondary_text(Some(secondary));

    let response = dialog.run();
    dialog.close();

    tracing::debug!("Quit confirmation answered with {:?}", response);
    response == ResponseType::Yes
}
