//! Local credential checks run before any auth request is sent.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FriendlyError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid regex"));
static LOWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static UPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

const MIN_PASSWORD_CHARS: usize = 8;

/// Validate an e-mail/password pair. `require_strong` is set for
/// registration; sign-in only checks the e-mail shape.
pub fn validate_credentials(
    email: &str,
    password: &str,
    require_strong: bool,
) -> Result<(), FriendlyError> {
    if !EMAIL_RE.is_match(email) {
        return Err(FriendlyError::InvalidEmail);
    }
    if require_strong && !is_strong_password(password) {
        return Err(FriendlyError::WeakPassword);
    }
    Ok(())
}

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
        && LOWER_RE.is_match(password)
        && UPPER_RE.is_match(password)
        && DIGIT_RE.is_match(password)
        && SPECIAL_RE.is_match(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_credentials("ala@example.com", "", false).is_ok());
        assert!(validate_credentials("A.Nowak+tag@Mail.PL", "", false).is_ok());
        for bad in ["", "ala", "ala@", "ala@example", "ala@example.c", "a b@example.com"] {
            assert_eq!(
                validate_credentials(bad, "", false),
                Err(FriendlyError::InvalidEmail),
                "{bad}"
            );
        }
    }

    #[test]
    fn weak_password_only_matters_when_required() {
        assert!(validate_credentials("ala@example.com", "short", false).is_ok());
        assert_eq!(
            validate_credentials("ala@example.com", "short", true),
            Err(FriendlyError::WeakPassword)
        );
    }

    #[test]
    fn strong_password_needs_every_class() {
        assert!(is_strong_password("Abcdef1!"));
        assert!(!is_strong_password("Abcde1!"));
        assert!(!is_strong_password("abcdef1!"));
        assert!(!is_strong_password("ABCDEF1!"));
        assert!(!is_strong_password("Abcdefg!"));
        assert!(!is_strong_password("Abcdefg1"));
    }

    #[test]
    fn email_is_checked_before_password() {
        assert_eq!(
            validate_credentials("nope", "weak", true),
            Err(FriendlyError::InvalidEmail)
        );
    }
}
