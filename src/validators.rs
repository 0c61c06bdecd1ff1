//! Field-level and cross-field validation rules, decoupled from
//! extraction and serialization so they stay independently testable. The
//! current date is always injected; validators never consult the clock.

use chrono::{Datelike, NaiveDate};
use model::entities::user::Role;
use regex::Regex;
use std::sync::OnceLock;

use crate::errors::AppError;

const EMAIL_MAX_LEN: usize = 254;
const SLUG_MAX_LEN: usize = 50;

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]{1,20}$").unwrap())
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap())
}

/// Usernames must match the handle pattern and may not claim the reserved
/// `me` route segment, in any case.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.eq_ignore_ascii_case("me") {
        return Err(AppError::validation(
            "username",
            "username may not be \"me\"",
        ));
    }
    // The pattern bounds the length too, no separate check needed.
    if !username_re().is_match(username) {
        return Err(AppError::validation(
            "username",
            "username contains invalid characters or has invalid length",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.len() > EMAIL_MAX_LEN || !email_re().is_match(email) {
        return Err(AppError::validation("email", "invalid email address"));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.len() > SLUG_MAX_LEN || !slug_re().is_match(slug) {
        return Err(AppError::validation(
            "slug",
            "slug must contain only letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}

/// Titles from the future are rejected; `today` is supplied by the caller.
pub fn validate_year(year: i32, today: NaiveDate) -> Result<(), AppError> {
    if year > today.year() {
        return Err(AppError::validation(
            "year",
            "titles from the future are not allowed",
        ));
    }
    Ok(())
}

pub fn validate_score(score: i16) -> Result<(), AppError> {
    if !(1..=10).contains(&score) {
        return Err(AppError::validation(
            "score",
            "score must be between 1 and 10",
        ));
    }
    Ok(())
}

/// Parses the wire form of a role; unknown values are a validation error,
/// never a silent default.
pub fn parse_role(value: &str) -> Result<Role, AppError> {
    Role::parse(value).ok_or_else(|| AppError::validation("role", "unknown role"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 6, 15).unwrap()
    }

    #[test]
    fn username_pattern() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("A1_b.c-d").is_ok());
        // Must start with a letter
        assert!(validate_username("1alice").is_err());
        // Too short: at least two characters
        assert!(validate_username("a").is_err());
        // Too long: at most 21 characters
        assert!(validate_username("abcdefghijklmnopqrstuv").is_err());
        assert!(validate_username("alice bob").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn username_me_is_reserved_in_any_case() {
        for reserved in ["me", "Me", "ME", "mE"] {
            let result = validate_username(reserved);
            assert!(
                matches!(result, Err(AppError::Validation { field: "username", .. })),
                "{reserved} should be rejected"
            );
        }
        // A prefix is not the reserved word
        assert!(validate_username("mee").is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.example").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn slug_shape() {
        assert!(validate_slug("sci-fi").is_ok());
        assert!(validate_slug("rock_n_roll").is_ok());
        assert!(validate_slug("bad slug").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug(&"x".repeat(51)).is_err());
    }

    #[test]
    fn year_bound_is_inclusive() {
        let today = date(2024);
        assert!(validate_year(2024, today).is_ok());
        assert!(validate_year(1850, today).is_ok());
        assert!(validate_year(2025, today).is_err());
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(10).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(11).is_err());
    }

    #[test]
    fn role_parsing() {
        assert_eq!(parse_role("moderator").unwrap(), Role::Moderator);
        assert!(parse_role("owner").is_err());
    }
}
