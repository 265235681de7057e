//! Logout command - forget the stored session

use super::session_controller;
use crate::config::AppConfig;

/// Handle the logout command
pub fn handle_logout(config: &AppConfig) -> Result<(), String> {
    let controller = session_controller(config);

    // Clear even when nothing is restored, so an unreadable record is removed too
    let was_signed_in = controller.is_authenticated();
    controller.clear_session();

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}
