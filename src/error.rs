//! Error types: raw API failures and the user-facing classification derived
//! from them.
use thiserror::Error;

/// Failure of a single REST call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-2xx response.
    #[error("HTTP {status}: {}", body.as_deref().unwrap_or(""))]
    Http { status: u16, body: Option<String> },
    /// The caller abandoned the request.
    #[error("request cancelled")]
    Cancelled,
    #[error("unexpected response shape: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        ApiError::Http {
            status,
            body: if body.is_empty() { None } else { Some(body) },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

const GENERIC_FAILURE: &str = "Something went wrong. Try again.";

/// Classification of a failure suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FriendlyError {
    #[error("Invalid e-mail address.")]
    InvalidEmail,
    #[error("Password is too weak (min. 8 characters, lower and upper case letters, a digit and a special character).")]
    WeakPassword,
    #[error("This e-mail is already registered.")]
    EmailInUse,
    #[error("User does not exist.")]
    UserNotFound,
    #[error("Wrong password.")]
    WrongPassword,
    #[error("No internet connection.")]
    Offline,
    #[error("Your session has expired. Sign in again.")]
    SessionExpired,
    #[error("You don't have permission to do that.")]
    Forbidden,
    #[error("Nothing was found.")]
    NotFound,
    #[error("Server error. Try again.")]
    Server,
    #[error("{0}")]
    Unknown(String),
}

impl FriendlyError {
    /// Classify a failure of a data call (feed, matches, chat).
    ///
    /// Returns `None` for cancellation, which is never shown to the user.
    pub fn from_api(err: &ApiError) -> Option<Self> {
        let friendly = match err {
            ApiError::Cancelled => return None,
            ApiError::Transport(_) => FriendlyError::Offline,
            ApiError::Http { status, body } => match status {
                401 => FriendlyError::SessionExpired,
                403 => FriendlyError::Forbidden,
                404 => FriendlyError::NotFound,
                500..=599 => FriendlyError::Server,
                code => FriendlyError::Unknown(
                    body.clone()
                        .unwrap_or_else(|| format!("Unknown error ({code}).")),
                ),
            },
            ApiError::Decode(_) | ApiError::Encode(_) | ApiError::InvalidUrl(_) => {
                FriendlyError::Unknown(GENERIC_FAILURE.to_string())
            }
        };
        Some(friendly)
    }

    /// Classify a failure of a sign-in or registration call by inspecting the
    /// server's message.
    pub fn from_auth(err: &ApiError) -> Self {
        if matches!(err, ApiError::Transport(_)) {
            return FriendlyError::Offline;
        }

        let raw = err.to_string().to_lowercase();
        if raw.contains("invalid email") {
            return FriendlyError::InvalidEmail;
        }
        if raw.contains("weak password") {
            return FriendlyError::WeakPassword;
        }
        if raw.contains("already") && raw.contains("exists") {
            return FriendlyError::EmailInUse;
        }
        if raw.contains("not found") {
            return FriendlyError::UserNotFound;
        }
        if raw.contains("wrong password") || raw.contains("incorrect password") {
            return FriendlyError::WrongPassword;
        }

        match err.status() {
            Some(500..=599) => FriendlyError::Server,
            Some(400..=499) => FriendlyError::Unknown("Invalid data. Check the form.".to_string()),
            _ => FriendlyError::Unknown(GENERIC_FAILURE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_statuses_are_classified() {
        let cases = [
            (401, FriendlyError::SessionExpired),
            (403, FriendlyError::Forbidden),
            (404, FriendlyError::NotFound),
            (500, FriendlyError::Server),
            (503, FriendlyError::Server),
        ];
        for (status, expected) in cases {
            assert_eq!(
                FriendlyError::from_api(&ApiError::http(status, "whatever")),
                Some(expected),
                "status {status}"
            );
        }
    }

    #[test]
    fn other_http_status_uses_body_or_code() {
        assert_eq!(
            FriendlyError::from_api(&ApiError::http(422, "bad listing")),
            Some(FriendlyError::Unknown("bad listing".into()))
        );
        assert_eq!(
            FriendlyError::from_api(&ApiError::http(418, "")),
            Some(FriendlyError::Unknown("Unknown error (418).".into()))
        );
    }

    #[test]
    fn cancellation_is_not_an_error() {
        assert_eq!(FriendlyError::from_api(&ApiError::Cancelled), None);
    }

    #[test]
    fn decode_failure_is_generic() {
        let err = serde_json::from_str::<Vec<i64>>("{").unwrap_err();
        let friendly = FriendlyError::from_api(&ApiError::Decode(err)).unwrap();
        assert_eq!(friendly, FriendlyError::Unknown(GENERIC_FAILURE.into()));
    }

    #[test]
    fn auth_errors_match_server_messages() {
        let cases = [
            ("Invalid email format", FriendlyError::InvalidEmail),
            ("Weak password", FriendlyError::WeakPassword),
            ("User already exists", FriendlyError::EmailInUse),
            ("User not found", FriendlyError::UserNotFound),
            ("Incorrect password", FriendlyError::WrongPassword),
        ];
        for (body, expected) in cases {
            assert_eq!(FriendlyError::from_auth(&ApiError::http(400, body)), expected);
        }
    }

    #[test]
    fn auth_errors_fall_back_on_status() {
        assert_eq!(
            FriendlyError::from_auth(&ApiError::http(502, "")),
            FriendlyError::Server
        );
        assert_eq!(
            FriendlyError::from_auth(&ApiError::http(422, "{\"detail\":\"x\"}")),
            FriendlyError::Unknown("Invalid data. Check the form.".into())
        );
        assert_eq!(
            FriendlyError::from_auth(&ApiError::Cancelled),
            FriendlyError::Unknown(GENERIC_FAILURE.into())
        );
    }

    #[test]
    fn http_error_display_includes_body() {
        let err = ApiError::http(500, "boom");
        assert_eq!(err.to_string(), "HTTP 500: boom");
        assert_eq!(err.status(), Some(500));
    }
}
