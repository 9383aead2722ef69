//! Typed error handling for the order service
//!
//! Every failure surfaced by a handler is a [`ShopError`]. Each variant maps to
//! an HTTP status code and a stable machine-readable code, and is rendered as
//!
//! ```json
//! { "success": false, "code": "INSUFFICIENT_STOCK", "message": "...", "details": { ... } }
//! ```
//!
//! # Error Categories
//!
//! - `InvalidRequest`: malformed or missing input (400)
//! - `NotFound`: a referenced entity is absent (404)
//! - `Forbidden`: authenticated but not authorized (403)
//! - `InsufficientStock`: business-rule violation on checkout (400)
//! - `InvalidState`: illegal status transition for the caller (400)
//! - `Unauthorized`: no usable caller identity (401)
//! - `Internal`: unexpected persistence or infrastructure failure (500)
//!
//! # Example
//!
//! ```rust,ignore
//! use livewear::prelude::*;
//!
//! async fn load(orders: &dyn OrderStore, id: Uuid) -> ShopResult<Order> {
//!     orders
//!         .get(&id)
//!         .await?
//!         .ok_or_else(|| ShopError::not_found("order", id))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::core::stock::StockError;

/// Whether `Internal` errors carry their real message to clients.
static EXPOSE_INTERNAL: AtomicBool = AtomicBool::new(false);

/// Toggle disclosure of internal error details in HTTP responses.
///
/// Set once at startup from the configured environment; only development
/// deployments should enable it.
pub fn expose_internal_details(expose: bool) {
    EXPOSE_INTERNAL.store(expose, Ordering::Relaxed);
}

/// The error type for every order-service operation
#[derive(Debug)]
pub enum ShopError {
    /// Malformed or missing input
    InvalidRequest(RequestError),

    /// Referenced entity does not exist
    NotFound { entity_type: String, id: String },

    /// Caller is authenticated but may not perform the operation
    Forbidden { message: String },

    /// A line item asks for more units than the product has in stock
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// The order's current status does not allow the requested change
    InvalidState {
        current: String,
        requested: String,
        message: String,
    },

    /// No caller identity could be established
    Unauthorized { message: String },

    /// Unexpected failure (storage, serialization, ...)
    Internal(String),
}

/// Input errors, kept apart so validation details can be reported per field
#[derive(Debug)]
pub enum RequestError {
    /// A single human-readable reason
    Invalid { message: String },

    /// Field-level validation failures
    Fields(Vec<FieldError>),
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Invalid { message } => write!(f, "{}", message),
            RequestError::Fields(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
        }
    }
}

impl fmt::Display for ShopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopError::InvalidRequest(e) => write!(f, "{}", e),
            ShopError::NotFound { entity_type, id } => {
                write!(f, "{} '{}' not found", capitalize(entity_type), id)
            }
            ShopError::Forbidden { message } => write!(f, "{}", message),
            ShopError::InsufficientStock {
                product_name,
                requested,
                available,
                ..
            } => write!(
                f,
                "Insufficient stock for {} (requested {}, available {})",
                product_name, requested, available
            ),
            ShopError::InvalidState { message, .. } => write!(f, "{}", message),
            ShopError::Unauthorized { message } => write!(f, "{}", message),
            ShopError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ShopError {}

/// Error body returned to HTTP clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ShopError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ShopError::InvalidRequest(RequestError::Invalid {
            message: message.into(),
        })
    }

    pub fn not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        ShopError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ShopError::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ShopError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn internal(message: impl fmt::Display) -> Self {
        ShopError::Internal(message.to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShopError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
            ShopError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ShopError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            ShopError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            ShopError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ShopError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ShopError::InvalidRequest(_) => "INVALID_REQUEST",
            ShopError::NotFound { .. } => "NOT_FOUND",
            ShopError::Forbidden { .. } => "FORBIDDEN",
            ShopError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ShopError::InvalidState { .. } => "INVALID_STATE",
            ShopError::Unauthorized { .. } => "UNAUTHORIZED",
            ShopError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// `expose_internal` controls whether `Internal` errors keep their message.
    pub fn to_response(&self, expose_internal: bool) -> ErrorResponse {
        let message = match self {
            ShopError::Internal(_) if !expose_internal => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        ErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ShopError::NotFound { entity_type, id } => Some(serde_json::json!({
                "entity_type": entity_type,
                "id": id,
            })),
            ShopError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => Some(serde_json::json!({
                "product_id": product_id.to_string(),
                "requested": requested,
                "available": available,
            })),
            ShopError::InvalidState {
                current, requested, ..
            } => Some(serde_json::json!({
                "current": current,
                "requested": requested,
            })),
            ShopError::InvalidRequest(RequestError::Fields(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(self.to_response(EXPOSE_INTERNAL.load(Ordering::Relaxed)));
        (status, body).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<StockError> for ShopError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ProductNotFound { product_id } => {
                ShopError::not_found("product", product_id)
            }
            StockError::Insufficient {
                product_id,
                product_name,
                requested,
                available,
            } => ShopError::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            },
            StockError::QuantityOverflow { .. } => {
                ShopError::invalid_request("Quantity requested is too large")
            }
            StockError::Backend(e) => ShopError::Internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        ShopError::InvalidRequest(RequestError::Fields(fields))
    }
}

fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::invalid_request(format!("Invalid JSON: {}", err))
    }
}

impl From<uuid::Error> for ShopError {
    fn from(_: uuid::Error) -> Self {
        ShopError::invalid_request("Invalid ID format")
    }
}

/// Storage traits return `anyhow::Result`; anything bubbling up that way is internal
impl From<anyhow::Error> for ShopError {
    fn from(err: anyhow::Error) -> Self {
        ShopError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for order-service operations
pub type ShopResult<T> = Result<T, ShopError>;
