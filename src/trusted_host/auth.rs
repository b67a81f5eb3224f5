use axum::http::HeaderMap;

use crate::config::Credentials;
use crate::error::{GatewayError, GatewayResult};
use crate::relay::protocol::{HEADER_PASSWORD, HEADER_USERNAME, Mode, ProcessRequest};

pub const MISSING_KEYS: &str = "Missing required keys. Required keys: 'query', 'mode'";
pub const MISSING_CREDENTIALS: &str = "Missing 'username' or 'password' in headers.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Checks that both envelope fields are present and the mode is one of the
/// three policies, returning the query and the normalized mode.
pub fn validate_envelope(request: &ProcessRequest) -> GatewayResult<(String, Mode)> {
    let (Some(query), Some(mode)) = (request.query.as_deref(), request.mode.as_deref()) else {
        tracing::warn!("Missing required keys in request payload");
        return Err(GatewayError::Validation(MISSING_KEYS.to_string()));
    };

    let mode = mode.parse::<Mode>().map_err(|e| {
        tracing::warn!("Invalid mode provided: {}", e.0);
        GatewayError::Validation(e.to_string())
    })?;

    Ok((query.to_string(), mode))
}

/// Compares the `username` / `password` headers with the configured pair.
pub fn authenticate(headers: &HeaderMap, credentials: &Credentials) -> GatewayResult<()> {
    let username = header(headers, HEADER_USERNAME);
    let password = header(headers, HEADER_PASSWORD);
    tracing::debug!("Authentication attempt by username: {:?}", username);

    let (Some(username), Some(password)) = (username, password) else {
        tracing::error!("Authentication failed: Missing credentials");
        return Err(GatewayError::Unauthorized(MISSING_CREDENTIALS.to_string()));
    };

    if !credentials.matches(username, password) {
        tracing::error!("Authentication failed: Invalid username or password");
        return Err(GatewayError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(())
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
