//! Form rules applied to user input before it reaches the builder.

use crate::errors::{BoardError, Result};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MIN_COMMENT_CHARS: usize = 10;

fn min_chars(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() < min {
        return Err(BoardError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn looks_like_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.starts_with('/') && !r.chars().any(char::is_whitespace))
}

pub fn validate_profile_form(username: &str, email: &str, bio: &str) -> Result<()> {
    min_chars("username", username, MIN_NAME_CHARS)?;
    if !looks_like_email(email) {
        return Err(BoardError::validation("please enter a valid email address"));
    }
    min_chars("bio", bio, MIN_DESCRIPTION_CHARS)
}

/// An empty image reference counts as absent.
pub fn validate_board_form(name: &str, description: &str, image_url: Option<&str>) -> Result<()> {
    min_chars("board name", name, MIN_NAME_CHARS)?;
    min_chars("description", description, MIN_DESCRIPTION_CHARS)?;
    match image_url {
        Some(url) if !url.is_empty() && !looks_like_url(url) => Err(BoardError::validation(
            "please enter a valid URL for the board image",
        )),
        _ => Ok(()),
    }
}

pub fn validate_task_form(name: &str, description: &str) -> Result<()> {
    min_chars("task name", name, MIN_NAME_CHARS)?;
    min_chars("description", description, MIN_DESCRIPTION_CHARS)
}

pub fn validate_review_form(comment: &str) -> Result<()> {
    min_chars("review comment", comment, MIN_COMMENT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_rules() {
        assert!(validate_profile_form("ferris", "ferris@example.com", "Writes Rust all day").is_ok());
        assert!(validate_profile_form("f", "ferris@example.com", "Writes Rust all day").is_err());
        assert!(validate_profile_form("ferris", "ferris.example.com", "Writes Rust all day").is_err());
        assert!(validate_profile_form("ferris", "ferris@example", "Writes Rust all day").is_err());
        assert!(validate_profile_form("ferris", "ferris@example.com", "short").is_err());
    }

    #[test]
    fn board_rules() {
        assert!(validate_board_form("Rust", "Bounties for the port", None).is_ok());
        assert!(validate_board_form("Rust", "Bounties for the port", Some("")).is_ok());
        assert!(validate_board_form("Rust", "Bounties for the port", Some("https://x.io/a.png")).is_ok());
        assert!(validate_board_form("Rust", "Bounties for the port", Some("ftp://x.io")).is_err());
        assert!(validate_board_form("R", "Bounties for the port", None).is_err());
        assert!(validate_board_form("Rust", "too short", None).is_err());
    }

    #[test]
    fn task_and_review_rules() {
        assert!(validate_task_form("Fix bug", "Fix the null pointer issue").is_ok());
        assert!(validate_task_form("Fix bug", "Fix it").is_err());
        assert!(validate_review_form("Looks good to me").is_ok());
        assert!(matches!(
            validate_review_form("ok"),
            Err(BoardError::Validation(_))
        ));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten characters, more than ten bytes.
        assert!(validate_review_form("ééééééééé!").is_ok());
        assert!(validate_review_form("éééé").is_err());
    }
}
