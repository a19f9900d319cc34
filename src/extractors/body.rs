//! Extract a request body as a sanitized JSON object.

use crate::error::AppError;
use crate::sanitize::sanitize_body;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

/// Sanitized JSON object body. An empty body is an empty object.
#[derive(Clone, Debug)]
pub struct SanitizedBody(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for SanitizedBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(SanitizedBody(Map::new()));
        }
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("body is not valid JSON: {}", e)))?;
        match value {
            Value::Object(obj) => Ok(SanitizedBody(sanitize_body(obj))),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }
}
