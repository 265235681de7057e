//! Login command - sign in through the browser

use super::paste::PasteSurface;
use super::{describe, session_controller, token_client};
use crate::config::AppConfig;
use pocketledger_auth::{Authenticator, AuthorizationSurface, LoopbackSurface};
use std::sync::Arc;
use url::Url;

/// Handle the login command
pub async fn handle_login(config: &AppConfig, paste: bool) -> Result<(), String> {
    let auth = config.auth_config().map_err(|e| e.to_string())?;
    let redirect = auth.redirect_url().map_err(|e| describe(&e))?;

    // Only http loopback redirects can be received locally
    let surface: Arc<dyn AuthorizationSurface> = if paste || redirect.scheme() != "http" {
        Arc::new(PasteSurface::new())
    } else {
        Arc::new(LoopbackSurface::new().with_presenter(|url| {
            print_authorize_url(url);
            println!("Waiting for the browser to finish (Ctrl-C to cancel)...");
        }))
    };

    let tokens = token_client(config)?;
    let controller = session_controller(config);
    let authenticator = Authenticator::new(auth, tokens, surface, controller);

    match authenticator.sign_in().await {
        Ok(session) => {
            println!();
            match &session.user_id {
                Some(user_id) => println!("Signed in as {}.", user_id),
                None => println!("Signed in."),
            }
            println!(
                "Session valid until {}.",
                session
                    .expires_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            );
            Ok(())
        }
        Err(e) if e.is_cancellation() => {
            println!("Cancelled.");
            Ok(())
        }
        Err(e) => Err(describe(&e)),
    }
}

/// Print the sign-in URL so it can be opened by hand
pub(super) fn print_authorize_url(url: &Url) {
    println!();
    println!("Opening browser to sign in to PocketLedger...");
    println!();
    println!("If browser doesn't open, visit:");
    // Use OSC 8 escape sequence to make the URL clickable in supported terminals
    println!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, url);
    println!();
}
