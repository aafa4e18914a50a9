//! Validation helpers shared by the proxy routes and the client forms.

use crate::error::AppError;

/// Shortest signed-URL lifetime the signing backend accepts, in seconds.
pub const MIN_EXPIRES_IN_SECS: i64 = 60;
/// Longest signed-URL lifetime the signing backend accepts, in seconds.
pub const MAX_EXPIRES_IN_SECS: i64 = 86_400;

/// True when `value` parses as an absolute URL with an http(s) scheme and a host.
pub fn is_valid_url(value: &str) -> bool {
    match url::Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Check a requested signed-URL lifetime against the accepted window.
pub fn validate_expires_in(expires_in: i64) -> Result<u64, AppError> {
    if !(MIN_EXPIRES_IN_SECS..=MAX_EXPIRES_IN_SECS).contains(&expires_in) {
        return Err(AppError::InvalidInput(format!(
            "expiresIn must be between {} and {} seconds",
            MIN_EXPIRES_IN_SECS, MAX_EXPIRES_IN_SECS
        )));
    }
    Ok(expires_in as u64)
}

/// `validator` hook for optional URL fields that arrive as empty strings.
pub fn validate_optional_url(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() || is_valid_url(value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_url("https://x.test"));
        assert!(is_valid_url("http://localhost:3001/path?q=1"));
    }

    #[test]
    fn rejects_non_urls() {
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("ftp://files.test"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn expires_in_bounds() {
        assert_eq!(validate_expires_in(60).unwrap(), 60);
        assert_eq!(validate_expires_in(86_400).unwrap(), 86_400);
        assert!(validate_expires_in(59).is_err());
        assert!(validate_expires_in(86_401).is_err());
        assert!(validate_expires_in(-1).is_err());
    }

    #[test]
    fn optional_url_allows_empty() {
        assert!(validate_optional_url("").is_ok());
        assert!(validate_optional_url("https://docs.x.test").is_ok());
        assert!(validate_optional_url("docs").is_err());
    }
}
