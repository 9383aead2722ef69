//! Axum extractor for validated JSON bodies
//!
//! `ValidatedJson<T>` deserializes the body like `Json<T>` and then runs the
//! `validator` rules declared on `T`. Both kinds of failure are reported as
//! `ShopError::InvalidRequest`, so clients always get the same error shape.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{ShopError, ShopResult};

/// Parse an id taken from the URL path
///
/// Malformed ids are an `InvalidRequest`, not a `404`.
pub fn parse_id(raw: &str) -> ShopResult<Uuid> {
    Ok(Uuid::parse_str(raw.trim())?)
}

/// Axum extractor that deserializes and validates a request payload
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn place_order(
///     Caller(caller): Caller,
///     ValidatedJson(payload): ValidatedJson<PlaceOrderRequest>,
/// ) -> ShopResult<impl IntoResponse> {
///     // payload already passed its field rules
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    /// Get the inner payload
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ShopError::invalid_request(rejection.body_text()))?;

        payload.validate()?;
        Ok(ValidatedJson(payload))
    }
}
