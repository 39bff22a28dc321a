// src/utils/identity.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's user id. It is set by the identity gateway in
/// front of this service after the token has been verified.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: i64,
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("user id is required".to_string()))?;

        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("invalid user id '{}'", raw)))?;

        Ok(Requester { id })
    }
}
