//! Request-level errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::membership::loader::ConfigError;
use crate::node::database::DatabaseError;
use crate::proxy::policy::RoutingError;
use crate::relay::protocol::ErrorBody;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed, unsanitized or incomplete input.
    #[error("{0}")]
    Validation(String),

    /// Missing or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// No node is eligible under the requested mode.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Descriptor file missing, unreadable, corrupt or empty.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Routing(_) | GatewayError::Config(_) | GatewayError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
