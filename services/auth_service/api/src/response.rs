//! Success envelope helpers
//!
//! Every response is JSON with the shape
//! `{ "success": bool, "data"?, "error"?, "message"?, "code"?, "statusCode"? }`.
//! Errors render through `AppError::into_response`; successes through here.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Wrap payload data in the success envelope
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// Success with a human-readable message and no payload
pub fn ok_message(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
    }))
}
