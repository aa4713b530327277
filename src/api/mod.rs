//! HTTP resource handlers.

pub mod error;
pub mod products;
pub mod users;

pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JSON body extractor. Wraps [`axum::Json`] so that malformed or
/// incomplete bodies answer in the API's one failure shape instead of
/// axum's plain-text rejection, which leaks deserializer detail.
#[derive(Debug)]
pub struct Body<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Body<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Body(value)),
            Err(rejection) => {
                debug!(%rejection, "Rejected request body");
                Err(ApiError::Validation("Invalid request body"))
            }
        }
    }
}

/// Success body for mutations that return no entity.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}
