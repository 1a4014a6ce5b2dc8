//! Standardized descriptions for transport and HTTP failures

use reqwest::StatusCode;

const REGISTRY_HINT: &str =
    "Check that the registry is up and serving on the configured port (e.g. with 'docker ps')";

/// Turns network-level failures into reasons that tell the operator what to check
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Describe a reqwest error raised while performing `context`
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> String {
        if error.is_connect() {
            format!(
                "Connection failed during {}: {}. {}",
                context, error, REGISTRY_HINT
            )
        } else if error.is_timeout() {
            format!("Timeout during {}: {}", context, error)
        } else if error.is_request() {
            format!("Request error during {}: {}", context, error)
        } else {
            format!("Network error during {}: {}", context, error)
        }
    }
}

/// Standard descriptions for unexpected registry status codes
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    pub fn handle_registry_status(status: StatusCode, operation: &str) -> String {
        match status.as_u16() {
            401 => format!(
                "Unauthorized for {} (HTTP 401); authenticated registries are not supported",
                operation
            ),
            403 => format!("Forbidden: insufficient permissions for {} (HTTP 403)", operation),
            404 => format!("Resource not found for {} (HTTP 404)", operation),
            405 => format!(
                "Method not allowed for {} (HTTP 405); is deletion enabled on the registry?",
                operation
            ),
            429 => format!("Rate limited during {} (HTTP 429)", operation),
            500 => format!("Registry server error during {} (HTTP 500)", operation),
            502 | 503 => format!(
                "Registry unavailable for {} (HTTP {}). {}",
                operation,
                status.as_u16(),
                REGISTRY_HINT
            ),
            _ => format!("{} failed with HTTP {}", operation, status),
        }
    }
}
