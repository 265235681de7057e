//! Status command - show the current session without revealing tokens

use super::session_controller;
use crate::config::AppConfig;
use chrono::{DateTime, TimeDelta, Utc};
use pocketledger_auth::SessionState;

/// Handle the status command
pub fn handle_status(config: &AppConfig) -> Result<(), String> {
    let controller = session_controller(config);
    for line in status_lines(&controller.state(), Utc::now()) {
        println!("{}", line);
    }
    println!("Store: {}", config.store);
    Ok(())
}

fn status_lines(state: &SessionState, now: DateTime<Utc>) -> Vec<String> {
    let Some(session) = state.session() else {
        return vec![
            "Not signed in.".to_string(),
            "Run `pocketledger auth login` to sign in.".to_string(),
        ];
    };

    let mut lines = vec![match &session.user_id {
        Some(user_id) => format!("Signed in as {}", user_id),
        None => "Signed in".to_string(),
    }];
    if session.is_expired_at(now) {
        lines.push("Access token: expired".to_string());
    } else {
        lines.push(format!(
            "Access token: valid for {}",
            format_remaining(session.expires_at - now)
        ));
    }
    lines.push(format!(
        "Refresh token: {}",
        if session.refresh_token.is_some() {
            "present"
        } else {
            "none"
        }
    ));
    lines
}

fn format_remaining(remaining: TimeDelta) -> String {
    let minutes = remaining.num_minutes();
    match (minutes / 60, minutes % 60) {
        (0, 0) => "less than a minute".to_string(),
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketledger_auth::AuthSession;
    use test_case::test_case;

    #[test_case(30, "less than a minute" ; "seconds")]
    #[test_case(59 * 60, "59m" ; "minutes")]
    #[test_case(3600, "1h 0m" ; "one hour")]
    #[test_case(3 * 3600 + 125, "3h 2m" ; "hours and minutes")]
    fn remaining_is_human_readable(secs: i64, expected: &str) {
        assert_eq!(format_remaining(TimeDelta::seconds(secs)), expected);
    }

    #[test]
    fn signed_out_status() {
        let lines = status_lines(&SessionState::Unauthenticated, Utc::now());
        assert_eq!(lines[0], "Not signed in.");
    }

    #[test]
    fn signed_in_status_never_shows_tokens() {
        let now = Utc::now();
        let session = AuthSession::new("secret-access", now + TimeDelta::seconds(3600))
            .with_refresh_token("secret-refresh")
            .with_user_id("user-1");
        let lines = status_lines(&SessionState::Authenticated(session), now);

        assert_eq!(lines[0], "Signed in as user-1");
        assert_eq!(lines[1], "Access token: valid for 1h 0m");
        assert_eq!(lines[2], "Refresh token: present");
        assert!(lines.iter().all(|l| !l.contains("secret")));
    }

    #[test]
    fn expired_status() {
        let now = Utc::now();
        let session = AuthSession::new("at", now - TimeDelta::seconds(1));
        let lines = status_lines(&SessionState::Authenticated(session), now);
        assert_eq!(lines[0], "Signed in");
        assert_eq!(lines[1], "Access token: expired");
        assert_eq!(lines[2], "Refresh token: none");
    }
}
